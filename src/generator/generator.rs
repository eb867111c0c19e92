//! This module contains [`Generator`], the owning wrapper around a spawned
//! coroutine. It is the pull-based surface for callers outside the coroutine
//! world: one [`next_value`](Generator::next_value) call drives the machine
//! one suspension point forward.
use crate::coroutine::{CoroHandle, CoroStatus, Coroutine};
use crate::error::{Fault, RuntimeError};
use crate::generator::Relay;
use crate::runtime::Runtime;

/// The owning wrapper of one coroutine.
///
/// Move-only: there is no way to duplicate the wrapper, so exactly one owner
/// destroys the slot. Moving the wrapper moves ownership with it; the
/// moved-to wrapper behaves identically. Dropping it mid-sequence tears the
/// coroutine down and releases its captured locals, the same as normal
/// completion would.
///
/// A pipeline stage built with [`map`](Generator::map) or
/// [`filter`](Generator::filter) takes ownership of its upstream wrapper, so
/// dropping the outermost wrapper tears down the whole chain, outermost
/// first.
pub struct Generator<T: 'static> {
    rt: Runtime<T>,
    co: CoroHandle,
    upstream: Option<Box<Generator<T>>>,
    poisoned: bool,
}

impl<T: 'static> Generator<T> {
    pub(crate) fn new(rt: Runtime<T>, co: CoroHandle) -> Self {
        Self {
            rt,
            co,
            upstream: None,
            poisoned: false,
        }
    }

    /// Returns a non-owning handle to the wrapped coroutine.
    pub fn handle(&self) -> CoroHandle {
        self.co
    }

    /// Returns the runtime this generator lives in.
    pub fn runtime(&self) -> &Runtime<T> {
        &self.rt
    }

    /// Returns whether the sequence is exhausted or faulted. Pure query,
    /// never advances state.
    pub fn done(&self) -> bool {
        matches!(self.rt.status(self.co), Ok(status) if status.is_terminal())
    }

    /// Pulls the next value.
    ///
    /// `Ok(None)` is the normal exhausted-sequence outcome. A failure inside
    /// the coroutine, or anywhere upstream of it, surfaces as
    /// [`Faulted`](RuntimeError::Faulted) instead of a plausible-looking
    /// value, and keeps surfacing on every later pull.
    pub fn next_value(&mut self) -> Result<Option<T>, RuntimeError> {
        match self.rt.status(self.co)? {
            CoroStatus::Done => return Ok(None),
            CoroStatus::Faulted => return Err(self.fault_error()),
            _ => {}
        }
        if let Some(value) = self.rt.take_value(self.co) {
            // produced by an eager start and not consumed yet
            return Ok(Some(value));
        }
        self.rt.resume(self.co)?;
        if self.rt.status(self.co)? == CoroStatus::Faulted {
            return Err(self.fault_error());
        }
        Ok(self.rt.take_value(self.co))
    }

    fn fault_error(&self) -> RuntimeError {
        let fault = self
            .rt
            .fault(self.co)
            .unwrap_or_else(|| Fault::new("coroutine faulted"));
        RuntimeError::Faulted(fault)
    }

    /// Chains a stage that replaces every value with `op(value)`.
    pub fn map<F>(self, mut op: F) -> Generator<T>
    where
        F: FnMut(T) -> T + 'static,
    {
        self.filter_map(move |value| Some(op(value)))
    }

    /// Chains a stage that keeps only values matching the predicate.
    pub fn filter<F>(self, mut predicate: F) -> Generator<T>
    where
        F: FnMut(&T) -> bool + 'static,
    {
        self.filter_map(move |value| if predicate(&value) { Some(value) } else { None })
    }

    /// Chains a stage that transforms values and drops the ones mapped to
    /// `None`. The stage pulls from this generator by symmetric transfer and
    /// re-yields its derived values to its own consumer.
    pub fn filter_map<F>(self, op: F) -> Generator<T>
    where
        F: FnMut(T) -> Option<T> + 'static,
    {
        let rt = self.rt.clone();
        let co = rt.spawn(Relay::new(self.co, op));
        Generator {
            rt,
            co,
            upstream: Some(Box::new(self)),
            poisoned: false,
        }
    }
}

impl<T: 'static> Drop for Generator<T> {
    fn drop(&mut self) {
        let _ = self.rt.destroy(self.co);
        // tear the owned upstream stages down after our own slot, so a chain
        // unwinds outermost-in
        drop(self.upstream.take());
    }
}

impl<T: 'static> Iterator for Generator<T> {
    type Item = Result<T, RuntimeError>;

    /// Yields values until exhaustion. A fault is yielded once as `Err`,
    /// after which the iterator fuses.
    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        match self.next_value() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => None,
            Err(err) => {
                self.poisoned = true;
                Some(Err(err))
            }
        }
    }
}

impl<T: 'static> Runtime<T> {
    /// Spawns a coroutine and returns its owning wrapper. Lazy start: the
    /// body first runs on the first pull.
    pub fn generator<C: Coroutine<T> + 'static>(&self, machine: C) -> Generator<T> {
        Generator::new(self.clone(), self.spawn(machine))
    }

    /// Like [`generator`](Runtime::generator), with a name used in trace
    /// events.
    pub fn generator_named<C: Coroutine<T> + 'static>(
        &self,
        name: impl Into<String>,
        machine: C,
    ) -> Generator<T> {
        Generator::new(self.clone(), self.spawn_named(name, machine))
    }

    /// Spawns a coroutine and immediately drives it to its first suspension
    /// point. The first pull returns the already-published value without
    /// resuming again.
    pub fn generator_eager<C: Coroutine<T> + 'static>(&self, machine: C) -> Generator<T> {
        let generator = self.generator(machine);
        let started = self.resume(generator.handle());
        debug_assert!(started.is_ok());
        generator
    }
}
