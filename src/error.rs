//! This module contains the error types of the runtime: [`Fault`] for failures
//! raised inside a coroutine body and [`RuntimeError`] for protocol violations.
use crate::coroutine::CoroHandle;

/// The failure marker recorded when a coroutine body gives up.
///
/// A fault makes the coroutine terminal. It is stored in the slot and travels
/// downstream through a producer/consumer chain, so the outermost
/// [`next_value`](crate::generator::Generator::next_value) surfaces it instead
/// of a plausible-looking value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Fault {
    message: String,
}

impl Fault {
    /// Create a new fault with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the recorded message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned by [`Runtime`](crate::runtime::Runtime) operations.
///
/// Every variant except [`Faulted`](RuntimeError::Faulted) indicates a caller
/// bug. They are surfaced immediately and never downgraded to a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// The handle does not name a live slot. Either the coroutine was
    /// destroyed, or the slot was reused for a younger coroutine.
    /// A second destroy of the same handle ends up here as well.
    #[error("stale coroutine handle {0}")]
    StaleHandle(CoroHandle),

    /// The coroutine already reached its terminal state and must not be
    /// resumed again.
    #[error("coroutine {0} resumed after reaching its terminal state")]
    ResumeTerminal(CoroHandle),

    /// The coroutine is currently executing a step. Resuming or destroying
    /// it from inside that step is forbidden.
    #[error("coroutine {0} is already running")]
    Reentrant(CoroHandle),

    /// The coroutine body failed. Carries the recorded [`Fault`].
    #[error("coroutine faulted: {0}")]
    Faulted(#[from] Fault),
}
