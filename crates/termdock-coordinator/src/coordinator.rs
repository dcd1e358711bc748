//! The lifecycle coordinator façade.
//!
//! Owns the snapshot cache and the local session registry, composes the
//! pending/deletion trackers and the layout guard, and implements every
//! public lifecycle operation. Constructed once at a composition root;
//! no ambient global state.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, error, info, warn};

use termdock_core::{
    slots, CoordinatorConfig, Error, OutboundMessage, Result, Session, SessionOrigin,
    SystemSnapshot, TerminalId, TerminalLaunchConfig,
};

use crate::deletion::DeletionSynchronizer;
use crate::hooks::{
    BackendChannel, CreationService, LayoutControl, NotificationHooks, PersistenceHooks,
    RemovalService, TabHooks,
};
use crate::layout::LayoutModeGuard;
use crate::pending::PendingOperationTracker;

/// The named capability interfaces wired in at construction.
pub struct Collaborators {
    /// Builds the actual terminal session
    pub creation: Arc<dyn CreationService>,
    /// Tears down the local session state
    pub removal: Arc<dyn RemovalService>,
    /// The display-layout state machine
    pub layout: Arc<dyn LayoutControl>,
    /// Debounced session persistence
    pub persistence: Arc<dyn PersistenceHooks>,
    /// User-facing warnings
    pub notifications: Arc<dyn NotificationHooks>,
    /// Tab-strip registration
    pub tabs: Arc<dyn TabHooks>,
    /// Message channel to the backend
    pub channel: Arc<dyn BackendChannel>,
}

/// A point-in-time view of the coordinator's bookkeeping.
#[derive(Debug, Clone)]
pub struct CoordinatorStatus {
    /// Whether at least one snapshot has been received
    pub ready: bool,
    /// The cached authoritative snapshot, if any
    pub snapshot: Option<Arc<SystemSnapshot>>,
    /// Deletions awaiting backend confirmation
    pub pending_deletions: Vec<TerminalId>,
    /// Creation requests waiting in the queue
    pub pending_creations: usize,
}

/// Decides which terminal sessions exist, which slot each occupies,
/// which one is active, and how optimistic local state reconciles
/// against backend-confirmed snapshots.
pub struct LifecycleCoordinator {
    config: CoordinatorConfig,
    creation: Arc<dyn CreationService>,
    removal: Arc<dyn RemovalService>,
    persistence: Arc<dyn PersistenceHooks>,
    notifications: Arc<dyn NotificationHooks>,
    tabs: Arc<dyn TabHooks>,
    channel: Arc<dyn BackendChannel>,
    layout_guard: LayoutModeGuard,
    pending: PendingOperationTracker,
    deletions: DeletionSynchronizer,
    /// Authoritative cache; replaced wholesale, never mutated in place.
    snapshot: Mutex<Option<Arc<SystemSnapshot>>>,
    /// Confirmed local sessions by id.
    sessions: Mutex<HashMap<TerminalId, Session>>,
    /// Optimistic placeholders for creations still in flight.
    placeholders: Mutex<HashMap<TerminalId, Session>>,
    /// Ids requested over the channel and not yet answered by a
    /// snapshot; repeats for the same id are not re-sent.
    dispatched: Mutex<HashSet<TerminalId>>,
    retry_scheduled: AtomicBool,
    /// Back-reference for spawning the queue-retry task.
    self_ref: Weak<Self>,
}

impl LifecycleCoordinator {
    /// Build the coordinator from configuration and its collaborators.
    pub fn new(config: CoordinatorConfig, collaborators: Collaborators) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            pending: PendingOperationTracker::new(config.queue_timeout()),
            deletions: DeletionSynchronizer::new(config.deletion_timeout()),
            layout_guard: LayoutModeGuard::new(collaborators.layout),
            config,
            creation: collaborators.creation,
            removal: collaborators.removal,
            persistence: collaborators.persistence,
            notifications: collaborators.notifications,
            tabs: collaborators.tabs,
            channel: collaborators.channel,
            snapshot: Mutex::new(None),
            sessions: Mutex::new(HashMap::new()),
            placeholders: Mutex::new(HashMap::new()),
            dispatched: Mutex::new(HashSet::new()),
            retry_scheduled: AtomicBool::new(false),
        })
    }

    /// Create (or idempotently return) the session for `id`.
    ///
    /// Backend-initiated creations bypass local admission; the backend
    /// is authoritative on capacity. Capacity refusal on the UI path
    /// warns the user and returns `None` without queueing; queueing
    /// belongs to [`Self::create_terminal_safely`] only.
    pub async fn create_terminal(
        &self,
        id: TerminalId,
        display_name: &str,
        launch: &TerminalLaunchConfig,
        slot_hint: Option<usize>,
        origin: SessionOrigin,
    ) -> Option<Session> {
        // Idempotent re-entry: a creation already in flight returns its
        // placeholder rather than starting a second construction.
        if self.pending.is_pending(&id) {
            debug!("Creation of {id} already in flight, returning placeholder");
            return self.placeholders.lock().unwrap().get(&id).cloned();
        }

        // Idempotent reuse of an existing session.
        if self.sessions.lock().unwrap().contains_key(&id) {
            debug!("{id} already exists, activating");
            return self.set_active(&id);
        }

        // Optimistic marks go in before the first await so a concurrent
        // call observes them immediately.
        self.pending.mark_pending(&id);
        let slot = slot_hint
            .or_else(|| id.slot_number())
            .or_else(|| self.next_available_slot())
            .unwrap_or(1);
        self.placeholders.lock().unwrap().insert(
            id.clone(),
            Session::new(id.clone(), display_name, slot, origin),
        );

        let result = self
            .create_terminal_inner(&id, display_name, launch, slot_hint, origin)
            .await;

        // Marks are cleared on every outcome.
        self.pending.clear_pending(&id);
        self.placeholders.lock().unwrap().remove(&id);

        match result {
            Ok(session) => session,
            Err(err) => {
                error!("Creation of {id} failed: {err}");
                None
            }
        }
    }

    async fn create_terminal_inner(
        &self,
        id: &TerminalId,
        display_name: &str,
        launch: &TerminalLaunchConfig,
        slot_hint: Option<usize>,
        origin: SessionOrigin,
    ) -> Result<Option<Session>> {
        let existing = self.session_count();
        self.layout_guard.ensure_safe_before_create(existing).await;

        if origin != SessionOrigin::Backend && !self.admission_excluding_self() {
            self.warn_capacity();
            return Ok(None);
        }

        let session = match self.creation.create(id, display_name, launch, slot_hint).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        info!("Session {id} created on slot {}", session.slot);
        self.sessions
            .lock()
            .unwrap()
            .insert(id.clone(), session.clone());
        self.tabs.add_tab(&session);
        let session = self.set_active(id).unwrap_or(session);

        // Only locally initiated creations are announced; a
        // backend-origin session already exists over there.
        if origin == SessionOrigin::Ui {
            let msg = OutboundMessage::create_terminal(id.clone(), display_name);
            if let Err(err) = self.channel.send(msg).await {
                // The session exists locally; the next snapshot
                // reconciles whatever the backend actually did.
                error!("Failed to announce {id} to the backend: {err}");
                self.notifications
                    .warn("Backend could not be notified of the new terminal");
            }
        }

        self.layout_guard.refresh_split();
        self.persistence.save_session_debounced();
        Ok(Some(session))
    }

    /// Remove a session locally: tab, rendered state, registry entry.
    ///
    /// This is the actual-removal path, used directly for local
    /// teardown and by [`Self::reconcile`] once a deletion is
    /// confirmed. [`Self::delete_terminal_safely`] only *requests*
    /// removal.
    pub async fn remove_terminal(&self, id: &TerminalId) -> bool {
        debug!("Removing terminal {id}");

        // Clear every coordinator-side mark for the id.
        self.pending.clear_pending(id);
        self.placeholders.lock().unwrap().remove(id);
        self.deletions.untrack(id);

        self.tabs.remove_tab(id);
        let removed = match self.removal.remove(id).await {
            Ok(removed) => removed,
            Err(err) => {
                error!("Removal of {id} failed: {err}");
                false
            }
        };
        self.sessions.lock().unwrap().remove(id);
        self.persistence.save_session_debounced();
        removed
    }

    /// Request deletion of a terminal (the active one when `id` is
    /// `None`) and track it until a snapshot confirms.
    ///
    /// Returns `true` meaning "request accepted", not "completed";
    /// actual UI removal happens later via [`Self::reconcile`]. Refuses
    /// to delete the last remaining session and refuses double-deletes.
    pub async fn delete_terminal_safely(&self, id: Option<TerminalId>) -> bool {
        let target = match id.or_else(|| self.active_terminal_id()) {
            Some(target) => target,
            None => {
                warn!("No terminal to delete");
                return false;
            }
        };

        let count = self.session_count();
        if count <= 1 {
            self.notifications
                .warn(&Error::LastSessionProtected.to_string());
            return false;
        }

        if self.deletions.is_tracked(&target) {
            debug!("Deletion of {target} already in flight");
            return false;
        }

        self.layout_guard.prepare_for_delete(count - 1);
        self.deletions.track(&target);

        info!("Requesting deletion of {target}");
        let msg = OutboundMessage::delete_terminal(target.clone(), SessionOrigin::Ui);
        if let Err(err) = self.channel.send(msg).await {
            // The backend never heard the request; tracking it would
            // gate creations on a deletion that will not happen.
            error!("Delete request for {target} failed to send: {err}");
            self.deletions.untrack(&target);
            return false;
        }
        true
    }

    /// Request creation of a terminal on the next free slot.
    ///
    /// While any deletion awaits confirmation the request is queued
    /// instead of dispatched, so it cannot race a slot that is about to
    /// be freed. The returned future then resolves on dispatch or
    /// rejects on queue timeout / forced synchronization.
    pub async fn create_terminal_safely(
        &self,
        desired_name: Option<String>,
    ) -> Result<bool> {
        if !self.can_create() {
            self.warn_capacity();
            return Ok(false);
        }

        if self.deletions.any_tracked() {
            debug!("Deletion in flight, queueing creation request");
            let queued = self.pending.enqueue(desired_name);
            self.schedule_queue_retry();
            return queued.await;
        }

        self.dispatch_creation(desired_name.as_deref()).await?;
        Ok(true)
    }

    /// Emergency recovery when local and backend views appear to have
    /// diverged: drop all deletion tracking, reject every queued
    /// creation, and ask the backend for a fresh snapshot.
    pub async fn force_synchronization(&self) -> Result<()> {
        let cleared = self.deletions.clear_all();
        let rejected = self.pending.reject_all(|| Error::SynchronizationForced);
        self.dispatched.lock().unwrap().clear();
        info!(
            "Forced synchronization: {cleared} tracked deletions cleared, \
             {rejected} queued creations rejected"
        );
        self.channel.send(OutboundMessage::request_state()).await
    }

    /// Apply an authoritative backend snapshot.
    ///
    /// The cache is replaced wholesale, tracked deletions are matched
    /// against the new session set, confirmed ones are removed from the
    /// UI, and one queue pass runs per confirmed deletion. Applying the
    /// same snapshot twice is a no-op.
    pub async fn reconcile(&self, snapshot: SystemSnapshot) {
        if let Err(err) = snapshot.validate() {
            // The backend stays authoritative on existence; apply anyway.
            warn!("Applying inconsistent snapshot: {err}");
        }

        let snapshot = Arc::new(snapshot);
        *self.snapshot.lock().unwrap() = Some(Arc::clone(&snapshot));
        // The snapshot answers every request dispatched before it.
        self.dispatched.lock().unwrap().clear();

        let confirmed = self.deletions.reconcile(&snapshot);
        for id in &confirmed {
            info!("Deletion of {id} confirmed, removing locally");
            self.remove_terminal(id).await;
        }

        self.sync_registry(&snapshot);

        // Each confirmed deletion frees at most one slot; give the
        // queue one dispatch opportunity per freed slot.
        for _ in &confirmed {
            self.process_queue().await;
        }
    }

    /// Handle exactly one head entry of the creation queue.
    ///
    /// A blocked entry is reinserted at the head (it retries ahead of
    /// later arrivals) and a single backoff retry is scheduled.
    pub async fn process_queue(&self) {
        let Some(entry) = self.pending.pop_front() else {
            return;
        };

        if !self.queue_admission_open() {
            self.pending.requeue_front(entry);
            self.schedule_queue_retry();
            return;
        }

        match self.dispatch_creation(entry.desired_name.as_deref()).await {
            Ok(()) => entry.complete(Ok(true)),
            Err(Error::Transport(err)) => {
                // Keep the request; the channel may recover before the
                // entry expires.
                error!("Queued creation failed to send: {err}");
                self.pending.requeue_front(entry);
                self.schedule_queue_retry();
            }
            Err(err) => entry.complete(Err(err)),
        }
    }

    /// Whether a new session could currently be admitted.
    pub fn can_create(&self) -> bool {
        self.admission(0)
    }

    /// The slot a new session would get: the minimum available slot
    /// from the snapshot, or the minimum locally unused slot before the
    /// first snapshot arrives.
    pub fn next_available_slot(&self) -> Option<usize> {
        if let Some(snapshot) = self.cached_snapshot() {
            return slots::next_available_slot(&snapshot);
        }
        let sessions = self.sessions.lock().unwrap();
        let used: HashSet<usize> = sessions.values().map(|s| s.slot).collect();
        (1..=self.config.max_sessions).find(|slot| !used.contains(slot))
    }

    /// A point-in-time view of the coordinator's bookkeeping.
    pub fn status(&self) -> CoordinatorStatus {
        // Lock the cache exactly once up front: a guard temporary taken
        // inside the struct literal lives until the end of the whole
        // expression, across the other field initializers.
        let snapshot = self.cached_snapshot();
        CoordinatorStatus {
            ready: snapshot.is_some(),
            snapshot,
            pending_deletions: self.deletions.tracked_ids(),
            pending_creations: self.pending.queue_len(),
        }
    }

    /// Number of confirmed local sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Id of the locally active session, falling back to the snapshot.
    pub fn active_terminal_id(&self) -> Option<TerminalId> {
        let local = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.is_active)
            .map(|s| s.id.clone());
        local.or_else(|| {
            self.cached_snapshot()
                .and_then(|snapshot| snapshot.active_session_id.clone())
        })
    }

    fn cached_snapshot(&self) -> Option<Arc<SystemSnapshot>> {
        self.snapshot.lock().unwrap().clone()
    }

    fn admission(&self, exclude_pending: usize) -> bool {
        let snapshot = self.cached_snapshot();
        let pending = self.pending.pending_count().saturating_sub(exclude_pending);
        slots::can_admit(
            snapshot.as_deref(),
            self.session_count(),
            pending,
            self.config.max_sessions,
        )
    }

    /// Admission for a caller whose own pending mark is already set.
    fn admission_excluding_self(&self) -> bool {
        self.admission(1)
    }

    fn warn_capacity(&self) {
        // The snapshot is the authoritative count; the local registry
        // only covers sessions this coordinator created itself.
        let snapshot = self.cached_snapshot();
        let current = snapshot
            .as_deref()
            .map_or_else(|| self.session_count(), |s| s.sessions.len());
        let max = snapshot
            .as_deref()
            .map_or(self.config.max_sessions, |s| s.max_sessions);
        self.notifications
            .warn(&Error::CapacityExceeded { current, max }.to_string());
    }

    /// Mark `id` active (all others inactive) and highlight its tab.
    fn set_active(&self, id: &TerminalId) -> Option<Session> {
        let mut found = None;
        {
            let mut sessions = self.sessions.lock().unwrap();
            for (sid, session) in sessions.iter_mut() {
                session.is_active = sid == id;
                if session.is_active {
                    found = Some(session.clone());
                }
            }
        }
        if found.is_some() {
            self.tabs.set_active_tab(id);
        }
        found
    }

    fn queue_admission_open(&self) -> bool {
        self.can_create() && !self.deletions.any_tracked()
    }

    async fn dispatch_creation(&self, desired_name: Option<&str>) -> Result<()> {
        let slot = self.next_available_slot().ok_or_else(|| {
            let current = self.session_count();
            Error::CapacityExceeded {
                current,
                max: self.config.max_sessions,
            }
        })?;
        let id = TerminalId::from_slot(slot);
        if !self.dispatched.lock().unwrap().insert(id.clone()) {
            debug!("Creation of {id} already requested, coalescing");
            return Ok(());
        }
        let name = desired_name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Terminal {slot}"));
        info!("Dispatching creation request for {id}");
        if let Err(err) = self
            .channel
            .send(OutboundMessage::create_terminal(id.clone(), name))
            .await
        {
            // A request that never left must not suppress the retry.
            self.dispatched.lock().unwrap().remove(&id);
            return Err(err);
        }
        Ok(())
    }

    fn schedule_queue_retry(&self) {
        if self.retry_scheduled.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(coordinator) = self.self_ref.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            tokio::time::sleep(coordinator.config.queue_retry_delay()).await;
            coordinator.retry_scheduled.store(false, Ordering::SeqCst);
            coordinator.process_queue().await;
        });
    }

    fn sync_registry(&self, snapshot: &SystemSnapshot) {
        let mut sessions = self.sessions.lock().unwrap();
        // Sessions the backend no longer reports are gone, unless their
        // creation is still in flight.
        sessions.retain(|id, _| snapshot.contains(id) || self.pending.is_pending(id));
        for session in sessions.values_mut() {
            if let Some(authoritative) = snapshot.session(&session.id) {
                session.display_name = authoritative.display_name.clone();
                session.slot = authoritative.slot;
            }
            session.is_active = snapshot.active_session_id.as_ref() == Some(&session.id);
        }
    }
}
