//! This module contains [`Relay`], the consumer/producer stage of a
//! generator pipeline: it pulls from an upstream coroutine by symmetric
//! transfer, transforms or drops the value, and re-yields the result to its
//! own consumer.
use crate::coroutine::{Awaitable, CoroHandle, CoroState, Coroutine, Transfer};
use crate::runtime::Context;

/// The stage's resumption point.
enum RelayPoint {
    /// About to transfer into the upstream for the next value.
    Pull,
    /// Just came back from the upstream; inspect what it left behind.
    Deliver,
}

/// A pipeline stage: pulls values from `upstream`, applies `op`, yields the
/// `Some` results downstream and silently pulls again on `None`.
///
/// The stage forwards upstream termination exactly once and never reports a
/// value after its upstream went terminal; an upstream fault makes the stage
/// fault with the same marker.
pub struct Relay<F> {
    upstream: CoroHandle,
    op: F,
    point: RelayPoint,
}

impl<F> Relay<F> {
    /// Creates a stage pulling from `upstream`.
    pub fn new(upstream: CoroHandle, op: F) -> Self {
        Self {
            upstream,
            op,
            point: RelayPoint::Pull,
        }
    }
}

impl<T: 'static, F: FnMut(T) -> Option<T>> Coroutine<T> for Relay<F> {
    fn resume(&mut self, cx: &mut Context<'_, T>) -> CoroState {
        loop {
            match self.point {
                RelayPoint::Pull => {
                    if let Some(fault) = cx.peer_fault(self.upstream) {
                        return CoroState::Faulted(fault);
                    }
                    if cx.peer_done(self.upstream) {
                        return CoroState::Complete;
                    }
                    self.point = RelayPoint::Deliver;
                    return CoroState::Yielded(Transfer::To(self.upstream));
                }
                RelayPoint::Deliver => {
                    self.point = RelayPoint::Pull;
                    if let Some(fault) = cx.peer_fault(self.upstream) {
                        return CoroState::Faulted(fault);
                    }
                    let Some(value) = cx.take_value(self.upstream) else {
                        // the upstream went terminal without producing
                        return CoroState::Complete;
                    };
                    let decision = match (self.op)(value) {
                        Some(out) => Awaitable::yield_back().carrying(out),
                        // dropped by the predicate: stay ready and pull again
                        None => Awaitable::ready(),
                    };
                    if let Some(transfer) = decision.fire(cx) {
                        return CoroState::Yielded(transfer);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Fault, RuntimeError};
    use crate::runtime::Runtime;

    #[test]
    fn test_filter_skips_without_suspending_downstream() {
        let rt: Runtime<i64> = Runtime::new();
        let mut odds = rt.from_iter(1..=9).filter(|n| n % 2 == 1);
        let mut got = Vec::new();
        while let Some(n) = odds.next_value().unwrap() {
            got.push(n);
        }
        assert_eq!(got, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_filter_everything_out() {
        let rt: Runtime<i64> = Runtime::new();
        let mut none = rt.from_iter(1..=6).filter(|_| false);
        assert_eq!(none.next_value().unwrap(), None);
        assert!(none.done());
    }

    #[test]
    fn test_stacked_stages_compose() {
        let rt: Runtime<i64> = Runtime::new();
        let gen = rt
            .from_iter(1..=10)
            .filter(|n| n % 2 == 0)
            .map(|n| n * n)
            .filter(|n| *n > 10);
        let got: Result<Vec<_>, _> = gen.collect();
        assert_eq!(got.unwrap(), vec![16, 36, 64, 100]);
    }

    #[test]
    fn test_upstream_fault_propagates_through_chain() {
        let rt: Runtime<i64> = Runtime::new();
        let mut n = 0i64;
        let source = rt.try_from_fn(move || {
            n += 1;
            if n <= 2 {
                Some(Ok(n))
            } else {
                Some(Err(Fault::new("upstream died")))
            }
        });
        let source_co = source.handle();
        let mut chain = source.map(|n| n * 100).filter(|_| true);

        assert_eq!(chain.next_value().unwrap(), Some(100));
        assert_eq!(chain.next_value().unwrap(), Some(200));
        assert_eq!(
            chain.next_value(),
            Err(RuntimeError::Faulted(Fault::new("upstream died")))
        );
        // every stage ended faulted, none pretends to still have values
        assert_eq!(rt.fault(source_co), Some(Fault::new("upstream died")));
        assert!(chain.done());
    }

    #[test]
    fn test_iterator_surfaces_fault_once() {
        let rt: Runtime<i64> = Runtime::new();
        let mut n = 0i64;
        let chain = rt
            .try_from_fn(move || {
                n += 1;
                if n == 1 {
                    Some(Ok(1))
                } else {
                    Some(Err(Fault::new("boom")))
                }
            })
            .map(|n| n * 10);
        let got: Vec<_> = chain.collect();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], Ok(10));
        assert!(got[1].is_err());
    }
}
