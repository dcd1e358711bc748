//! Recording test doubles for the coordinator's capability interfaces.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use termdock_core::{
    CoordinatorConfig, Error, OutboundMessage, Result, Session, SessionOrigin, SystemSnapshot,
    TerminalId, TerminalLaunchConfig,
};
use termdock_coordinator::{
    BackendChannel, Collaborators, CreationService, LayoutControl, LayoutMode,
    LifecycleCoordinator, NotificationHooks, PersistenceHooks, RemovalService, TabHooks,
};

/// Shared ordered log of observable side effects across all doubles.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub struct MockCreation {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    events: EventLog,
}

#[async_trait]
impl CreationService for MockCreation {
    async fn create(
        &self,
        id: &TerminalId,
        display_name: &str,
        _launch: &TerminalLaunchConfig,
        slot_hint: Option<usize>,
    ) -> Result<Option<Session>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("create:{id}"));
        // Yield once so overlapping create calls actually interleave.
        tokio::task::yield_now().await;
        if self.fail.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let slot = slot_hint.or_else(|| id.slot_number()).unwrap_or(0);
        Ok(Some(Session::new(
            id.clone(),
            display_name,
            slot,
            SessionOrigin::Ui,
        )))
    }
}

pub struct MockRemoval {
    pub calls: AtomicUsize,
}

#[async_trait]
impl RemovalService for MockRemoval {
    async fn remove(&self, _id: &TerminalId) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

pub struct MockLayout {
    pub mode: Mutex<LayoutMode>,
    pub transitions: Mutex<Vec<LayoutMode>>,
    pub rebalances: AtomicUsize,
    events: EventLog,
}

#[async_trait]
impl LayoutControl for MockLayout {
    fn current_mode(&self) -> LayoutMode {
        *self.mode.lock().unwrap()
    }

    fn set_mode(&self, mode: LayoutMode) {
        *self.mode.lock().unwrap() = mode;
        self.transitions.lock().unwrap().push(mode);
        self.events
            .lock()
            .unwrap()
            .push(format!("set_mode:{mode:?}"));
    }

    fn show_all_split(&self) {
        self.rebalances.fetch_add(1, Ordering::SeqCst);
    }

    async fn await_settled(&self) {
        tokio::task::yield_now().await;
    }
}

pub struct CountingPersistence {
    pub saves: AtomicUsize,
}

impl PersistenceHooks for CountingPersistence {
    fn save_session_debounced(&self) {
        self.saves.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct RecordingNotifications {
    pub warnings: Mutex<Vec<String>>,
}

impl NotificationHooks for RecordingNotifications {
    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

pub struct RecordingTabs {
    pub added: Mutex<Vec<TerminalId>>,
    pub removed: Mutex<Vec<TerminalId>>,
    pub activated: Mutex<Vec<TerminalId>>,
}

impl TabHooks for RecordingTabs {
    fn add_tab(&self, session: &Session) {
        self.added.lock().unwrap().push(session.id.clone());
    }

    fn remove_tab(&self, id: &TerminalId) {
        self.removed.lock().unwrap().push(id.clone());
    }

    fn set_active_tab(&self, id: &TerminalId) {
        self.activated.lock().unwrap().push(id.clone());
    }
}

pub struct RecordingChannel {
    pub sent: Mutex<Vec<OutboundMessage>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl BackendChannel for RecordingChannel {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Transport("channel closed".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

impl RecordingChannel {
    /// Terminal ids of all `createTerminal` messages sent so far.
    pub fn created_ids(&self) -> Vec<TerminalId> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|msg| match msg {
                OutboundMessage::CreateTerminal { terminal_id, .. } => Some(terminal_id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Terminal ids of all `deleteTerminal` messages sent so far.
    pub fn deleted_ids(&self) -> Vec<TerminalId> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|msg| match msg {
                OutboundMessage::DeleteTerminal { terminal_id, .. } => Some(terminal_id.clone()),
                _ => None,
            })
            .collect()
    }
}

/// A coordinator wired to recording doubles.
pub struct Harness {
    pub coordinator: Arc<LifecycleCoordinator>,
    pub creation: Arc<MockCreation>,
    pub removal: Arc<MockRemoval>,
    pub layout: Arc<MockLayout>,
    pub persistence: Arc<CountingPersistence>,
    pub notifications: Arc<RecordingNotifications>,
    pub tabs: Arc<RecordingTabs>,
    pub channel: Arc<RecordingChannel>,
    pub events: EventLog,
}

pub fn harness() -> Harness {
    harness_with(CoordinatorConfig::default())
}

/// Install a test subscriber once so `RUST_LOG=debug` shows
/// coordinator logs during test runs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn harness_with(config: CoordinatorConfig) -> Harness {
    init_tracing();
    let events: EventLog = Arc::default();
    let creation = Arc::new(MockCreation {
        calls: AtomicUsize::new(0),
        fail: AtomicBool::new(false),
        events: Arc::clone(&events),
    });
    let removal = Arc::new(MockRemoval {
        calls: AtomicUsize::new(0),
    });
    let layout = Arc::new(MockLayout {
        mode: Mutex::new(LayoutMode::Normal),
        transitions: Mutex::new(Vec::new()),
        rebalances: AtomicUsize::new(0),
        events: Arc::clone(&events),
    });
    let persistence = Arc::new(CountingPersistence {
        saves: AtomicUsize::new(0),
    });
    let notifications = Arc::new(RecordingNotifications {
        warnings: Mutex::new(Vec::new()),
    });
    let tabs = Arc::new(RecordingTabs {
        added: Mutex::new(Vec::new()),
        removed: Mutex::new(Vec::new()),
        activated: Mutex::new(Vec::new()),
    });
    let channel = Arc::new(RecordingChannel {
        sent: Mutex::new(Vec::new()),
        fail: AtomicBool::new(false),
    });

    let coordinator = LifecycleCoordinator::new(
        config,
        Collaborators {
            creation: creation.clone(),
            removal: removal.clone(),
            layout: layout.clone(),
            persistence: persistence.clone(),
            notifications: notifications.clone(),
            tabs: tabs.clone(),
            channel: channel.clone(),
        },
    );

    Harness {
        coordinator,
        creation,
        removal,
        layout,
        persistence,
        notifications,
        tabs,
        channel,
        events,
    }
}

impl Harness {
    /// Create `count` sessions on slots `1..=count` through the normal
    /// UI path.
    pub async fn create_sessions(&self, count: usize) {
        for slot in 1..=count {
            let session = self
                .coordinator
                .create_terminal(
                    TerminalId::from_slot(slot),
                    &format!("Terminal {slot}"),
                    &TerminalLaunchConfig::default(),
                    Some(slot),
                    SessionOrigin::Ui,
                )
                .await;
            assert!(session.is_some(), "setup creation for slot {slot} failed");
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        self.notifications.warnings.lock().unwrap().clone()
    }
}

/// Build a backend snapshot with the given used slots.
pub fn snapshot(max: usize, used: &[usize], active: Option<usize>) -> SystemSnapshot {
    let active_id = active.map(TerminalId::from_slot);
    SystemSnapshot {
        sessions: used
            .iter()
            .map(|&slot| {
                let id = TerminalId::from_slot(slot);
                let mut session = Session::new(
                    id.clone(),
                    format!("Terminal {slot}"),
                    slot,
                    SessionOrigin::Backend,
                );
                session.is_active = active_id.as_ref() == Some(&id);
                session
            })
            .collect(),
        active_session_id: active_id,
        max_sessions: max,
        available_slots: (1..=max).filter(|s| !used.contains(s)).collect(),
    }
}
