//! Tracking and queueing of in-flight creation requests.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

use termdock_core::{Error, Result, TerminalId};

/// A creation request waiting for a slot to open up.
///
/// Lives only inside the queue; removed on dispatch, rejection or
/// expiry.
#[derive(Debug)]
pub struct QueuedCreation {
    /// Display name requested by the caller, if any
    pub desired_name: Option<String>,
    /// When the request entered the queue
    pub submitted_at: Instant,
    /// Deadline after which the caller's future rejects
    pub expires_at: Instant,
    tx: oneshot::Sender<Result<bool>>,
}

impl QueuedCreation {
    /// Resolve the caller's future.
    pub fn complete(self, result: Result<bool>) {
        // Receiver may have given up already (timeout fired); fine.
        let _ = self.tx.send(result);
    }

    /// Whether the entry's deadline has passed.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct Inner {
    pending: HashSet<TerminalId>,
    queue: VecDeque<QueuedCreation>,
}

/// Deduplicates concurrent creation attempts and queues requests that
/// cannot be satisfied immediately.
///
/// The pending set makes `create_terminal` idempotent: a second call for
/// an id still in flight observes the mark synchronously. The queue
/// holds `create_terminal_safely` requests deferred because a deletion
/// is awaiting confirmation; each entry expires after a fixed timeout
/// rather than waiting forever.
#[derive(Debug)]
pub struct PendingOperationTracker {
    inner: Mutex<Inner>,
    queue_timeout: Duration,
}

impl PendingOperationTracker {
    /// Create a tracker whose queued entries expire after `queue_timeout`.
    pub fn new(queue_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            queue_timeout,
        }
    }

    /// Mark a creation as in flight. Returns `false` if it already was.
    pub fn mark_pending(&self, id: &TerminalId) -> bool {
        self.inner.lock().unwrap().pending.insert(id.clone())
    }

    /// Whether a creation for this id is in flight.
    pub fn is_pending(&self, id: &TerminalId) -> bool {
        self.inner.lock().unwrap().pending.contains(id)
    }

    /// Clear the in-flight mark for an id.
    pub fn clear_pending(&self, id: &TerminalId) {
        self.inner.lock().unwrap().pending.remove(id);
    }

    /// Number of creations currently marked in flight.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }

    /// Append a creation request to the queue.
    ///
    /// The returned future resolves `Ok(true)` when the request is
    /// dispatched, rejects with [`Error::QueueTimeout`] once the entry's
    /// deadline passes, or rejects with whatever error the queue is
    /// drained with (forced synchronization).
    pub fn enqueue(&self, desired_name: Option<String>) -> impl Future<Output = Result<bool>> {
        let (tx, rx) = oneshot::channel();
        let now = Instant::now();
        let timeout = self.queue_timeout;
        let deadline = now + timeout;
        {
            let mut inner = self.inner.lock().unwrap();
            inner.queue.push_back(QueuedCreation {
                desired_name,
                submitted_at: now,
                expires_at: deadline,
                tx,
            });
            debug!("Creation request queued, queue depth {}", inner.queue.len());
        }

        async move {
            match tokio::time::timeout_at(deadline, rx).await {
                Ok(Ok(result)) => result,
                // Sender dropped without a verdict: the entry was reaped
                // past its deadline.
                Ok(Err(_)) => Err(Error::QueueTimeout(timeout.as_millis() as u64)),
                Err(_) => Err(Error::QueueTimeout(timeout.as_millis() as u64)),
            }
        }
    }

    /// Take the head entry, dropping any expired entries first.
    pub fn pop_front(&self) -> Option<QueuedCreation> {
        let mut inner = self.inner.lock().unwrap();
        Self::reap_locked(&mut inner);
        inner.queue.pop_front()
    }

    /// Put a blocked entry back at the head of the queue.
    ///
    /// Head reinsertion (not tail) is deliberate: a blocked request
    /// retries ahead of later arrivals, trading fairness for stable
    /// creation order under sustained capacity pressure.
    pub fn requeue_front(&self, entry: QueuedCreation) {
        self.inner.lock().unwrap().queue.push_front(entry);
    }

    /// Current queue depth, after dropping expired entries.
    pub fn queue_len(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        Self::reap_locked(&mut inner);
        inner.queue.len()
    }

    /// Drain the queue, rejecting every waiting caller.
    pub fn reject_all(&self, make_error: impl Fn() -> Error) -> usize {
        let drained: Vec<QueuedCreation> = {
            let mut inner = self.inner.lock().unwrap();
            inner.queue.drain(..).collect()
        };
        let count = drained.len();
        for entry in drained {
            entry.complete(Err(make_error()));
        }
        count
    }

    fn reap_locked(inner: &mut Inner) {
        let now = Instant::now();
        inner.queue.retain(|entry| {
            if entry.is_expired(now) {
                warn!(
                    "Queued creation expired after {:?} without dispatch",
                    now.duration_since(entry.submitted_at)
                );
                // Dropping the sender rejects the caller's future.
                false
            } else {
                true
            }
        });
    }
}
