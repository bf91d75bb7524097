//! # Hardware Authentication Gate
//!
//! Capability interface over the platform's hardware authentication factor
//! (fingerprint, face, etc.). The prompt itself is platform UI; this crate
//! only models the wait for its single terminal outcome.
//!
//! The authentication wait is the one suspending operation in the crate.
//! It must run off any UI/event-dispatch thread, and callers can cancel it
//! cooperatively through a [`CancelToken`]; a cancelled wait resolves as
//! [`AuthOutcome::Cancelled`] and leaves no partial state behind.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};

/// Terminal result of a hardware authentication prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The factor was presented and accepted
    Authorized,
    /// The user dismissed the prompt
    Cancelled,
    /// The factor was presented but rejected
    Failed,
    /// No factor is enrolled on the device
    NotEnrolled,
    /// The factor is temporarily disabled after repeated failures
    LockedOut,
}

/// Cooperative cancellation handle for a pending authentication wait
///
/// Clonable; any clone can cancel, and all clones observe the cancellation.
/// Cancellation is sticky: once cancelled, a token never resets.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Signal cancellation to all clones of this token
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }

    /// Whether cancellation has been signalled
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait until cancellation is signalled
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // Cannot fail: this token keeps the sender alive
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// The platform's hardware authentication factor
///
/// `authenticate` resolves exactly once per call, either with the prompt's
/// terminal outcome or with [`AuthOutcome::Cancelled`] when the supplied
/// token fires first. Any prompt timeout is owned by the platform provider;
/// this crate imposes none.
#[async_trait]
pub trait AuthenticationGate: Send + Sync {
    /// Whether a usable factor is currently enrolled on the device
    ///
    /// Capability query only; never triggers a prompt.
    fn is_available(&self) -> bool;

    /// Present the authentication prompt and wait for its outcome
    ///
    /// `reason` identifies the operation to the user (shown in the prompt).
    async fn authenticate(&self, reason: &str, cancel: &CancelToken) -> AuthOutcome;
}

/// Scripted authentication gate for development and tests
///
/// Resolves with a preconfigured outcome. A gate built with
/// [`ScriptedAuthGate::holding`] keeps the prompt pending until released,
/// which is how cancellation paths are exercised.
pub struct ScriptedAuthGate {
    available: bool,
    outcome: Mutex<AuthOutcome>,
    prompt_open: Option<Arc<Notify>>,
}

impl ScriptedAuthGate {
    /// A gate with an enrolled factor that resolves with `outcome`
    pub fn with_outcome(outcome: AuthOutcome) -> Self {
        Self {
            available: true,
            outcome: Mutex::new(outcome),
            prompt_open: None,
        }
    }

    /// A gate with no usable factor enrolled
    pub fn unavailable() -> Self {
        Self {
            available: false,
            outcome: Mutex::new(AuthOutcome::NotEnrolled),
            prompt_open: None,
        }
    }

    /// A gate whose prompt stays open until the returned handle is notified
    pub fn holding(outcome: AuthOutcome) -> (Self, Arc<Notify>) {
        let release = Arc::new(Notify::new());
        let gate = Self {
            available: true,
            outcome: Mutex::new(outcome),
            prompt_open: Some(release.clone()),
        };
        (gate, release)
    }

    /// Reconfigure the scripted outcome
    pub fn set_outcome(&self, outcome: AuthOutcome) {
        *self.outcome.lock() = outcome;
    }
}

#[async_trait]
impl AuthenticationGate for ScriptedAuthGate {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn authenticate(&self, _reason: &str, cancel: &CancelToken) -> AuthOutcome {
        if cancel.is_cancelled() {
            return AuthOutcome::Cancelled;
        }

        if let Some(release) = &self.prompt_open {
            tokio::select! {
                _ = release.notified() => {}
                _ = cancel.cancelled() => return AuthOutcome::Cancelled,
            }
        }

        *self.outcome.lock()
    }
}

// ============================================================================
// TESTS
// ============================================================================
