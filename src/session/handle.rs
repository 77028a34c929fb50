//! Session state and the caller-facing handle.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::StreamCallbacks;
use crate::error::LlmError;
use crate::streaming::DecoderSnapshot;

/// Lifecycle of a session: `Idle -> Open -> {Finished | Failed | Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Open = 1,
    Finished = 2,
    Failed = 3,
    Cancelled = 4,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Open,
            2 => Self::Finished,
            3 => Self::Failed,
            _ => Self::Cancelled,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Cancelled)
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Finished,
    Failed(LlmError),
    Cancelled,
}

impl SessionOutcome {
    fn state(&self) -> SessionState {
        match self {
            Self::Finished => SessionState::Finished,
            Self::Failed(_) => SessionState::Failed,
            Self::Cancelled => SessionState::Cancelled,
        }
    }
}

#[derive(Debug, Default)]
struct Delivery {
    terminal_delivered: bool,
}

/// State shared between the handle and the session task.
pub(crate) struct SessionShared {
    id: Uuid,
    state: AtomicU8,
    delivery: Mutex<Delivery>,
    callbacks: Arc<dyn StreamCallbacks>,
    token: CancellationToken,
    outcome: watch::Sender<Option<SessionOutcome>>,
    snapshot: Mutex<Option<DecoderSnapshot>>,
}

impl SessionShared {
    pub(crate) fn new(callbacks: Arc<dyn StreamCallbacks>) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            id: Uuid::new_v4(),
            state: AtomicU8::new(SessionState::Idle as u8),
            delivery: Mutex::new(Delivery::default()),
            callbacks,
            token: CancellationToken::new(),
            outcome,
            snapshot: Mutex::new(None),
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub(crate) fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.state().is_terminal()
    }

    /// `Idle -> Open`. Fails if the session already ended.
    pub(crate) fn mark_open(&self) -> bool {
        self.state
            .compare_exchange(
                SessionState::Idle as u8,
                SessionState::Open as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// First-wins move into a terminal state.
    fn claim(&self, terminal: SessionState) -> bool {
        let mut current = self.state.load(Ordering::SeqCst);
        loop {
            if SessionState::from_u8(current).is_terminal() {
                return false;
            }
            match self.state.compare_exchange(
                current,
                terminal as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    fn lock_delivery(&self) -> MutexGuard<'_, Delivery> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one non-terminal callback. Returns `false` once the session has
    /// ended, in which case nothing was delivered.
    pub(crate) fn deliver(&self, f: impl FnOnce(&dyn StreamCallbacks)) -> bool {
        let mut guard = self.lock_delivery();
        if self.is_terminated() {
            self.settle_cancel(&mut guard);
            return false;
        }
        f(self.callbacks.as_ref());
        // A cancel() issued while the callback ran could not take the lock.
        self.settle_cancel(&mut guard);
        true
    }

    /// Claim `outcome` and deliver its terminal callback. Returns `false` if
    /// another outcome won.
    pub(crate) fn terminate(&self, outcome: SessionOutcome) -> bool {
        if !self.claim(outcome.state()) {
            self.settle();
            return false;
        }
        let mut guard = self.lock_delivery();
        guard.terminal_delivered = true;
        match &outcome {
            SessionOutcome::Finished => self.callbacks.on_finish(),
            SessionOutcome::Failed(err) => self.callbacks.on_failed(err),
            SessionOutcome::Cancelled => self.callbacks.on_cancelled(),
        }
        drop(guard);
        self.outcome.send_replace(Some(outcome));
        true
    }

    /// Request cancellation from outside the delivering task. Never blocks on
    /// the delivery lock.
    pub(crate) fn cancel(&self) -> bool {
        if !self.claim(SessionState::Cancelled) {
            return false;
        }
        self.token.cancel();
        match self.delivery.try_lock() {
            Ok(mut guard) => self.settle_cancel(&mut guard),
            // The holder fires on_cancelled once its callback returns.
            Err(TryLockError::WouldBlock) => {}
            Err(TryLockError::Poisoned(poisoned)) => {
                let mut guard = poisoned.into_inner();
                self.settle_cancel(&mut guard);
            }
        }
        true
    }

    /// Fire a pending `on_cancelled`, if any.
    pub(crate) fn settle(&self) {
        let mut guard = self.lock_delivery();
        self.settle_cancel(&mut guard);
    }

    fn settle_cancel(&self, guard: &mut Delivery) {
        if guard.terminal_delivered || self.state() != SessionState::Cancelled {
            return;
        }
        guard.terminal_delivered = true;
        tracing::debug!(target: "uistream::session", session_id = %self.id, "session cancelled");
        self.callbacks.on_cancelled();
        self.outcome.send_replace(Some(SessionOutcome::Cancelled));
    }

    pub(crate) fn store_snapshot(&self, snapshot: DecoderSnapshot) {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome.borrow().clone()
    }
}

/// Handle to a running session.
///
/// Dropping the handle does not cancel the session.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.shared.id)
            .field("state", &self.shared.state())
            .finish()
    }
}

impl SessionHandle {
    pub(crate) fn new(shared: Arc<SessionShared>) -> Self {
        Self { shared }
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.id()
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Abort the in-flight request and end the session with `on_cancelled`.
    ///
    /// No callback starts after this returns. A no-op once the session has
    /// ended. Safe to call from inside a callback.
    pub fn cancel(&self) {
        if self.shared.cancel() {
            tracing::debug!(
                target: "uistream::session",
                session_id = %self.shared.id(),
                "cancel requested"
            );
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.is_terminated()
    }

    /// The terminal outcome, once its callback has been delivered.
    /// A cancelled session reports `Cancelled` immediately.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.shared.state() {
            SessionState::Cancelled => Some(SessionOutcome::Cancelled),
            _ => self.shared.outcome(),
        }
    }

    /// Wait for the terminal callback and return the outcome.
    pub async fn join(&self) -> SessionOutcome {
        let mut rx = self.shared.outcome.subscribe();
        match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(SessionOutcome::Cancelled),
            // The sender lives in `shared`, which we hold.
            Err(_) => SessionOutcome::Cancelled,
        }
    }

    /// Transcript state captured when the session task exited.
    pub fn snapshot(&self) -> Option<DecoderSnapshot> {
        self.shared
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
