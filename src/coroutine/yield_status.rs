//! This module contains [`Transfer`] and [`Awaitable`], the suspend-decision
//! protocol. This is the one way a coroutine communicates with the trampoline:
//! every suspension point answers where control goes next and which value, if
//! any, the point carries out.
use crate::coroutine::CoroHandle;
use crate::runtime::Context;

/// Where control goes when a coroutine suspends. The trampoline interprets
/// the variant and dispatches the next coroutine without growing the call
/// stack, so transferring through a long producer/consumer chain costs the
/// same as transferring once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Hand control back to whoever resumed this coroutine.
    Caller,

    /// Symmetric transfer: the peer continues from its own suspension point
    /// directly, it is not re-entered through a fresh call chain.
    ///
    /// Transferring into a terminal or stale peer bounces control straight
    /// back, so the transferring coroutine observes the absent value on its
    /// next step instead of hanging.
    To(CoroHandle),

    /// Hand control (and the value just published) back to the coroutine
    /// that last transferred into this one. Behaves like [`Caller`] when no
    /// such link exists, which is the case when an external driver resumes a
    /// producer directly.
    ///
    /// [`Caller`]: Transfer::Caller
    Waiter,

    /// Re-enter this coroutine immediately at its next resumption point.
    /// Useful for exercising the trampoline, not much else.
    Current,

    /// Park. Nothing runs next; only an external resume continues this
    /// coroutine.
    Idle,
}

/// One suspension point, before it is taken.
///
/// An awaitable answers three independent questions:
///
/// 1. Is the point ready already? If so, no suspension happens at all.
/// 2. If it suspends, who runs next (a [`Transfer`])?
/// 3. Which value does the point publish, if any?
///
/// Keeping the three knobs separate is what lets one mechanism express
/// cooperative yielding, generator-style value production and direct
/// coroutine-to-coroutine handoff. Pick a constructor per policy, attach a
/// value with [`carrying`](Awaitable::carrying), then [`fire`](Awaitable::fire)
/// the point inside [`Coroutine::resume`](crate::coroutine::Coroutine::resume).
#[derive(Debug)]
pub struct Awaitable<T> {
    ready: bool,
    transfer: Transfer,
    value: Option<T>,
}

impl<T> Awaitable<T> {
    /// The point is ready: no suspension, the body keeps running.
    pub fn ready() -> Self {
        Self {
            ready: true,
            transfer: Transfer::Caller,
            value: None,
        }
    }

    /// Suspend and return control to the resumer.
    pub fn suspend() -> Self {
        Self {
            ready: false,
            transfer: Transfer::Caller,
            value: None,
        }
    }

    /// Suspend and symmetric-transfer to the named peer.
    pub fn transfer(peer: CoroHandle) -> Self {
        Self {
            ready: false,
            transfer: Transfer::To(peer),
            value: None,
        }
    }

    /// Suspend and hand control back to the back-linked waiter. This is how
    /// a producer yields each value to its consumer.
    pub fn yield_back() -> Self {
        Self {
            ready: false,
            transfer: Transfer::Waiter,
            value: None,
        }
    }

    /// Suspend and immediately re-enter the same coroutine.
    pub fn reenter() -> Self {
        Self {
            ready: false,
            transfer: Transfer::Current,
            value: None,
        }
    }

    /// Suspend with no next runner.
    pub fn idle() -> Self {
        Self {
            ready: false,
            transfer: Transfer::Idle,
            value: None,
        }
    }

    /// Attaches the value this point publishes when fired.
    pub fn carrying(mut self, value: T) -> Self {
        self.value = Some(value);
        self
    }

    /// Returns whether the point skips suspension.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Returns the transfer target used if the point suspends.
    pub fn target(&self) -> Transfer {
        self.transfer
    }

    /// Returns the attached value, if any.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Takes the point: publishes the attached value to the coroutine's slot
    /// and returns the transfer to report, or `None` when the point was
    /// ready and the body should simply keep running.
    pub fn fire(self, cx: &mut Context<'_, T>) -> Option<Transfer> {
        if let Some(value) = self.value {
            cx.set_value(value);
        }
        if self.ready {
            None
        } else {
            Some(self.transfer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_skips_suspension() {
        let aw: Awaitable<i32> = Awaitable::ready();
        assert!(aw.is_ready());
    }

    #[test]
    fn test_suspend_targets_caller() {
        let aw: Awaitable<i32> = Awaitable::suspend();
        assert!(!aw.is_ready());
        assert_eq!(aw.target(), Transfer::Caller);
    }

    #[test]
    fn test_transfer_targets_peer() {
        let peer = CoroHandle::new(4, 1);
        let aw: Awaitable<i32> = Awaitable::transfer(peer);
        assert_eq!(aw.target(), Transfer::To(peer));
    }

    #[test]
    fn test_yield_back_carries_value() {
        let aw = Awaitable::yield_back().carrying(9);
        assert!(!aw.is_ready());
        assert_eq!(aw.target(), Transfer::Waiter);
        assert_eq!(aw.value(), Some(&9));
    }

    #[test]
    fn test_reenter_and_idle() {
        assert_eq!(Awaitable::<()>::reenter().target(), Transfer::Current);
        assert_eq!(Awaitable::<()>::idle().target(), Transfer::Idle);
    }
}
