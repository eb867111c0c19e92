//! A single-threaded cooperative coroutine runtime: explicit state machines
//! suspend at [`Awaitable`] points, exchange values, and hand control to each
//! other by symmetric transfer through a trampoline. Generator pipelines are
//! built on top in [`generator`].
pub mod cfg;
pub mod coroutine;
pub mod error;
pub mod generator;
pub mod runtime;
pub mod trace;

pub use cfg::RuntimeCfg;
pub use coroutine::{
    Awaitable, CoroHandle, CoroState, CoroStatus, Coroutine, CoroutineImpl, Transfer,
};
pub use error::{Fault, RuntimeError};
pub use generator::{FromFn, Generator, Relay, TryFromFn};
pub use runtime::{Context, Runtime};
pub use trace::{NoopTrace, SequenceDiagram, TraceEvent, TraceSink};
