//! This module contains the producer machines: closure- and iterator-backed
//! sources that yield one value per step to whoever pulls them.
use crate::coroutine::{CoroState, Coroutine, Transfer};
use crate::error::Fault;
use crate::generator::Generator;
use crate::runtime::{Context, Runtime};

/// A producer that computes one value per step.
///
/// Each resume calls the closure once: `Some(value)` publishes the value and
/// yields it back to the consumer (or the external driver), `None` completes
/// the coroutine.
pub struct FromFn<F> {
    op: F,
}

impl<F> FromFn<F> {
    /// Creates a producer from the closure.
    pub fn new(op: F) -> Self {
        Self { op }
    }
}

impl<T: 'static, F: FnMut() -> Option<T>> Coroutine<T> for FromFn<F> {
    fn resume(&mut self, cx: &mut Context<'_, T>) -> CoroState {
        match (self.op)() {
            Some(value) => {
                cx.set_value(value);
                CoroState::Yielded(Transfer::Waiter)
            }
            None => CoroState::Complete,
        }
    }
}

/// A producer whose steps can fail.
///
/// Like [`FromFn`], but `Some(Err(fault))` ends the coroutine with the fault
/// recorded, which then propagates downstream instead of being swallowed.
pub struct TryFromFn<F> {
    op: F,
}

impl<F> TryFromFn<F> {
    /// Creates a fallible producer from the closure.
    pub fn new(op: F) -> Self {
        Self { op }
    }
}

impl<T: 'static, F: FnMut() -> Option<Result<T, Fault>>> Coroutine<T> for TryFromFn<F> {
    fn resume(&mut self, cx: &mut Context<'_, T>) -> CoroState {
        match (self.op)() {
            Some(Ok(value)) => {
                cx.set_value(value);
                CoroState::Yielded(Transfer::Waiter)
            }
            Some(Err(fault)) => CoroState::Faulted(fault),
            None => CoroState::Complete,
        }
    }
}

impl<T: 'static> Runtime<T> {
    /// Creates a generator producing the closure's values until it returns
    /// `None`.
    pub fn from_fn<F>(&self, op: F) -> Generator<T>
    where
        F: FnMut() -> Option<T> + 'static,
    {
        self.generator(FromFn::new(op))
    }

    /// Creates a generator draining the iterator one item per pull.
    pub fn from_iter<I>(&self, iter: I) -> Generator<T>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        let mut iter = iter.into_iter();
        self.from_fn(move || iter.next())
    }

    /// Creates a generator whose producer may fail; the first `Err` faults
    /// the coroutine.
    pub fn try_from_fn<F>(&self, op: F) -> Generator<T>
    where
        F: FnMut() -> Option<Result<T, Fault>> + 'static,
    {
        self.generator(TryFromFn::new(op))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;

    #[test]
    fn test_from_fn_until_none() {
        let rt: Runtime<u32> = Runtime::new();
        let mut left = 3u32;
        let mut gen = rt.from_fn(move || {
            if left == 0 {
                None
            } else {
                left -= 1;
                Some(left)
            }
        });
        assert_eq!(gen.next_value().unwrap(), Some(2));
        assert_eq!(gen.next_value().unwrap(), Some(1));
        assert_eq!(gen.next_value().unwrap(), Some(0));
        assert_eq!(gen.next_value().unwrap(), None);
    }

    #[test]
    fn test_from_iter_ascending() {
        for n in [0i64, 1, 7, 40] {
            let rt: Runtime<i64> = Runtime::new();
            let gen = rt.from_iter(1..=n);
            let got: Result<Vec<_>, _> = gen.collect();
            let got = got.unwrap();
            assert_eq!(got.len(), n as usize);
            assert!(got.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_try_from_fn_faults() {
        let rt: Runtime<u32> = Runtime::new();
        let mut n = 0u32;
        let mut gen = rt.try_from_fn(move || {
            n += 1;
            match n {
                1 => Some(Ok(10)),
                _ => Some(Err(Fault::new("source broke"))),
            }
        });
        assert_eq!(gen.next_value().unwrap(), Some(10));
        assert_eq!(
            gen.next_value(),
            Err(RuntimeError::Faulted(Fault::new("source broke")))
        );
        // the fault is sticky, later pulls keep surfacing it
        assert_eq!(
            gen.next_value(),
            Err(RuntimeError::Faulted(Fault::new("source broke")))
        );
        assert!(gen.done());
    }
}
