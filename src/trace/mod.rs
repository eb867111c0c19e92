//! This module contains the diagnostic collaborator of the runtime: an
//! injected, append-only event listener. The runtime notifies the sink at
//! every spawn/resume/transfer/yield/suspend/terminal transition; the default
//! [`NoopTrace`] discards everything, and its absence never changes computed
//! results.
pub mod uml;

pub use uml::SequenceDiagram;

use crate::error::Fault;
use std::cell::RefCell;
use std::rc::Rc;

/// One observable transition, identified by the coroutine's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A coroutine was spawned into the arena.
    Spawned { co: String },
    /// An external driver entered the trampoline at this coroutine.
    Resumed { co: String },
    /// Control moved between two coroutines without returning outward.
    Transferred { from: String, to: String },
    /// The coroutine published a value at its suspension point.
    Yielded { co: String },
    /// The coroutine suspended and control returned to the external driver.
    Suspended { co: String },
    /// The coroutine parked with no next runner.
    Parked { co: String },
    /// The body ran to completion.
    Completed { co: String },
    /// The body failed.
    Faulted { co: String, fault: Fault },
    /// The slot was destroyed and its storage released.
    Destroyed { co: String },
}

/// An append-only sink for [`TraceEvent`]s.
///
/// The runtime checks [`enabled`](TraceSink::enabled) before building an
/// event, so a disabled sink costs nothing on the resume path.
pub trait TraceSink {
    /// Returns whether events should be built and recorded at all.
    fn enabled(&self) -> bool {
        true
    }

    /// Records one event.
    fn record(&mut self, event: &TraceEvent);
}

/// The default sink. Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrace;

impl TraceSink for NoopTrace {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&mut self, _event: &TraceEvent) {}
}

/// Lets a sink be shared between the runtime and the caller: install a
/// `Rc<RefCell<S>>` clone as the sink and keep the other clone to inspect
/// what was recorded after the run.
impl<S: TraceSink> TraceSink for Rc<RefCell<S>> {
    fn enabled(&self) -> bool {
        self.borrow().enabled()
    }

    fn record(&mut self, event: &TraceEvent) {
        self.borrow_mut().record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<TraceEvent>,
    }

    impl TraceSink for Recorder {
        fn record(&mut self, event: &TraceEvent) {
            self.events.push(event.clone());
        }
    }

    #[test]
    fn test_noop_is_disabled() {
        assert!(!NoopTrace.enabled());
    }

    #[test]
    fn test_shared_sink_records() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut sink = Rc::clone(&recorder);
        assert!(sink.enabled());
        sink.record(&TraceEvent::Spawned { co: "co0".into() });
        assert_eq!(recorder.borrow().events.len(), 1);
    }

    #[test]
    fn test_sink_never_changes_results() {
        use crate::runtime::Runtime;
        use crate::trace::SequenceDiagram;

        fn run(with_sink: bool) -> Vec<i64> {
            let rt: Runtime<i64> = Runtime::new();
            if with_sink {
                rt.set_trace(Box::new(SequenceDiagram::new()));
            }
            let gen = rt.from_iter(1..=6).filter(|n| n % 2 == 0).map(|n| n * 3);
            gen.collect::<Result<Vec<_>, _>>().unwrap()
        }

        assert_eq!(run(false), run(true));
        assert_eq!(run(true), vec![6, 12, 18]);
    }
}
