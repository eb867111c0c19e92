//! This module contains the [`Runtime`]: the arena of coroutine slots and the
//! trampoline that drives them. The trampoline follows [`Transfer`] targets
//! iteratively, so symmetric transfer through an arbitrarily long chain never
//! grows the call stack.
use slab::Slab;
use std::cell::RefCell;
use std::rc::Rc;

use crate::cfg::RuntimeCfg;
use crate::coroutine::{CoroHandle, CoroState, CoroStatus, Coroutine, CoroutineImpl, Transfer};
use crate::error::{Fault, RuntimeError};
use crate::trace::{NoopTrace, TraceEvent, TraceSink};

/// One arena entry: the state machine plus everything the runtime tracks for
/// it between steps.
struct Slot<T: 'static> {
    generation: u32,
    name: String,
    status: CoroStatus,
    /// Taken out of the slot while the machine is running a step.
    machine: Option<CoroutineImpl<T>>,
    /// The last value the coroutine published and nobody consumed yet.
    value: Option<T>,
    /// The coroutine that last symmetric-transferred into this one.
    /// Re-established at every handoff; `Transfer::Waiter` and the
    /// terminal bounce both resolve through it.
    waiter: Option<CoroHandle>,
    fault: Option<Fault>,
}

fn slot_of<T: 'static>(slots: &Slab<Slot<T>>, handle: CoroHandle) -> Option<&Slot<T>> {
    slots
        .get(handle.index as usize)
        .filter(|slot| slot.generation == handle.generation)
}

fn slot_of_mut<T: 'static>(slots: &mut Slab<Slot<T>>, handle: CoroHandle) -> Option<&mut Slot<T>> {
    slots
        .get_mut(handle.index as usize)
        .filter(|slot| slot.generation == handle.generation)
}

/// The coroutine's window into the runtime for the duration of one step.
///
/// A body publishes its own value here, consumes a peer's value and inspects
/// peer state. It cannot resume or destroy anything; control is only moved
/// through the [`Transfer`] returned from the step.
pub struct Context<'a, T: 'static> {
    slots: &'a mut Slab<Slot<T>>,
    handle: CoroHandle,
}

impl<'a, T: 'static> Context<'a, T> {
    /// Returns the handle of the coroutine being stepped.
    pub fn handle(&self) -> CoroHandle {
        self.handle
    }

    /// Publishes a value into this coroutine's slot. It stays there until a
    /// consumer takes it.
    pub fn set_value(&mut self, value: T) {
        if let Some(slot) = slot_of_mut(self.slots, self.handle) {
            slot.value = Some(value);
        }
    }

    /// Consumes the peer's published value, if any.
    pub fn take_value(&mut self, peer: CoroHandle) -> Option<T> {
        slot_of_mut(self.slots, peer).and_then(|slot| slot.value.take())
    }

    /// Returns the peer's status, or `None` for a stale handle.
    pub fn peer_status(&self, peer: CoroHandle) -> Option<CoroStatus> {
        slot_of(self.slots, peer).map(|slot| slot.status)
    }

    /// Returns whether the peer can never produce again. A stale handle
    /// counts as done.
    pub fn peer_done(&self, peer: CoroHandle) -> bool {
        slot_of(self.slots, peer).map_or(true, |slot| slot.status.is_terminal())
    }

    /// Returns the peer's recorded fault, if it faulted.
    pub fn peer_fault(&self, peer: CoroHandle) -> Option<Fault> {
        slot_of(self.slots, peer).and_then(|slot| slot.fault.clone())
    }

    /// Returns the coroutine that last transferred into this one.
    pub fn waiter(&self) -> Option<CoroHandle> {
        slot_of(self.slots, self.handle).and_then(|slot| slot.waiter)
    }
}

struct Inner<T: 'static> {
    slots: Slab<Slot<T>>,
    next_generation: u32,
    trace: Box<dyn TraceSink>,
}

impl<T: 'static> Inner<T> {
    fn slot(&self, handle: CoroHandle) -> Result<&Slot<T>, RuntimeError> {
        slot_of(&self.slots, handle).ok_or(RuntimeError::StaleHandle(handle))
    }

    fn slot_mut(&mut self, handle: CoroHandle) -> Result<&mut Slot<T>, RuntimeError> {
        slot_of_mut(&mut self.slots, handle).ok_or(RuntimeError::StaleHandle(handle))
    }

    fn is_resumable(&self, handle: CoroHandle) -> bool {
        slot_of(&self.slots, handle).is_some_and(|slot| slot.status.is_resumable())
    }

    fn name_of(&self, handle: CoroHandle) -> String {
        slot_of(&self.slots, handle)
            .map(|slot| slot.name.clone())
            .unwrap_or_else(|| handle.to_string())
    }

    fn spawn(&mut self, name: Option<String>, machine: CoroutineImpl<T>) -> CoroHandle {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        let entry = self.slots.vacant_entry();
        let index = entry.key() as u32;
        let name = name.unwrap_or_else(|| format!("co{}", index));
        let handle = CoroHandle::new(index, generation);
        log::trace!("spawned {} ({})", handle, name);
        if self.trace.enabled() {
            let event = TraceEvent::Spawned { co: name.clone() };
            self.trace.record(&event);
        }
        entry.insert(Slot {
            generation,
            name,
            status: CoroStatus::Created,
            machine: Some(machine),
            value: None,
            waiter: None,
            fault: None,
        });
        handle
    }

    fn destroy(&mut self, handle: CoroHandle) -> Result<(), RuntimeError> {
        if self.slot(handle)?.status == CoroStatus::Running {
            return Err(RuntimeError::Reentrant(handle));
        }
        let slot = self.slots.remove(handle.index as usize);
        log::trace!("destroyed {} ({})", handle, slot.name);
        if self.trace.enabled() {
            let event = TraceEvent::Destroyed { co: slot.name.clone() };
            self.trace.record(&event);
        }
        // dropping the slot here releases the machine's captured locals and
        // any unconsumed value, suspended or not
        drop(slot);
        Ok(())
    }

    fn resume(&mut self, first: CoroHandle) -> Result<(), RuntimeError> {
        let status = self.slot(first)?.status;
        if status.is_terminal() {
            return Err(RuntimeError::ResumeTerminal(first));
        }
        if !status.is_resumable() {
            return Err(RuntimeError::Reentrant(first));
        }
        if self.trace.enabled() {
            let event = TraceEvent::Resumed {
                co: self.name_of(first),
            };
            self.trace.record(&event);
        }
        self.drive(first);
        Ok(())
    }

    /// The trampoline. Runs one step, settles the outcome, follows the
    /// transfer to the next handle, repeats until control leaves outward.
    fn drive(&mut self, first: CoroHandle) {
        let mut current = first;
        loop {
            let mut machine = {
                let Some(slot) = slot_of_mut(&mut self.slots, current) else {
                    break;
                };
                if !slot.status.is_resumable() {
                    break;
                }
                let Some(machine) = slot.machine.take() else {
                    break;
                };
                slot.status = CoroStatus::Running;
                machine
            };
            log::trace!("stepping {}", current);
            let state = machine.resume(&mut Context {
                slots: &mut self.slots,
                handle: current,
            });
            match self.settle(current, machine, state) {
                Some(next) => current = next,
                None => break,
            }
        }
    }

    /// Writes the step's outcome back into the slot and returns the next
    /// handle to run, if any.
    fn settle(
        &mut self,
        current: CoroHandle,
        machine: CoroutineImpl<T>,
        state: CoroState,
    ) -> Option<CoroHandle> {
        match state {
            CoroState::Yielded(transfer) => {
                let published = {
                    let slot = slot_of_mut(&mut self.slots, current)?;
                    slot.machine = Some(machine);
                    slot.status = CoroStatus::Suspended;
                    slot.value.is_some()
                };
                if published && self.trace.enabled() {
                    let event = TraceEvent::Yielded {
                        co: self.name_of(current),
                    };
                    self.trace.record(&event);
                }
                self.follow(current, transfer)
            }
            CoroState::Complete => {
                // the frame is dropped right away so captured locals are
                // released at completion, not at destroy
                drop(machine);
                {
                    let slot = slot_of_mut(&mut self.slots, current)?;
                    slot.status = CoroStatus::Done;
                    slot.value = None;
                }
                log::trace!("{} completed", current);
                if self.trace.enabled() {
                    let event = TraceEvent::Completed {
                        co: self.name_of(current),
                    };
                    self.trace.record(&event);
                }
                self.bounce(current)
            }
            CoroState::Faulted(fault) => {
                drop(machine);
                {
                    let slot = slot_of_mut(&mut self.slots, current)?;
                    slot.status = CoroStatus::Faulted;
                    slot.value = None;
                    slot.fault = Some(fault.clone());
                }
                log::debug!("{} faulted: {}", current, fault);
                if self.trace.enabled() {
                    let event = TraceEvent::Faulted {
                        co: self.name_of(current),
                        fault,
                    };
                    self.trace.record(&event);
                }
                self.bounce(current)
            }
        }
    }

    /// Resolves a suspension's transfer target.
    fn follow(&mut self, from: CoroHandle, transfer: Transfer) -> Option<CoroHandle> {
        match transfer {
            Transfer::Caller => {
                self.emit_suspended(from);
                None
            }
            Transfer::Idle => {
                if self.trace.enabled() {
                    let event = TraceEvent::Parked {
                        co: self.name_of(from),
                    };
                    self.trace.record(&event);
                }
                None
            }
            Transfer::Current => Some(from),
            Transfer::Waiter => match self.slot(from).ok().and_then(|slot| slot.waiter) {
                Some(waiter) if self.is_resumable(waiter) => {
                    self.emit_transferred(from, waiter);
                    Some(waiter)
                }
                _ => {
                    self.emit_suspended(from);
                    None
                }
            },
            Transfer::To(peer) => {
                if self.is_resumable(peer) {
                    if let Ok(slot) = self.slot_mut(peer) {
                        slot.waiter = Some(from);
                    }
                    self.emit_transferred(from, peer);
                    Some(peer)
                } else {
                    // terminal or stale peer: bounce back immediately so the
                    // transferring coroutine observes the absent value
                    Some(from)
                }
            }
        }
    }

    /// After a terminal step, hands control to the coroutine that was
    /// waiting on this one, so termination ripples down a chain one stage
    /// per step.
    fn bounce(&mut self, from: CoroHandle) -> Option<CoroHandle> {
        let waiter = self.slot(from).ok().and_then(|slot| slot.waiter)?;
        if self.is_resumable(waiter) {
            self.emit_transferred(from, waiter);
            Some(waiter)
        } else {
            None
        }
    }

    fn emit_suspended(&mut self, handle: CoroHandle) {
        if self.trace.enabled() {
            let event = TraceEvent::Suspended {
                co: self.name_of(handle),
            };
            self.trace.record(&event);
        }
    }

    fn emit_transferred(&mut self, from: CoroHandle, to: CoroHandle) {
        if self.trace.enabled() {
            let event = TraceEvent::Transferred {
                from: self.name_of(from),
                to: self.name_of(to),
            };
            self.trace.record(&event);
        }
    }
}

/// The single-threaded cooperative runtime: an arena of coroutine slots and
/// the trampoline that drives them.
///
/// A `Runtime` value is a cheap handle; clones share the same arena, which is
/// how [`Generator`](crate::generator::Generator) wrappers and their pipeline
/// stages reach it. Everything is `!Send`; resumes are strictly sequential
/// and deterministic.
pub struct Runtime<T: 'static> {
    shared: Rc<RefCell<Inner<T>>>,
}

impl<T: 'static> Clone for Runtime<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: 'static> Runtime<T> {
    /// Creates a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeCfg::default())
    }

    /// Creates a runtime with the given configuration.
    pub fn with_config(cfg: RuntimeCfg) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Inner {
                slots: Slab::with_capacity(cfg.slots_capacity()),
                next_generation: 1,
                trace: Box::new(NoopTrace),
            })),
        }
    }

    /// Installs a trace sink. Replaces the previous one.
    pub fn set_trace(&self, sink: Box<dyn TraceSink>) {
        self.shared.borrow_mut().trace = sink;
    }

    /// Spawns a coroutine into the arena. The machine starts `Created`; the
    /// first resume runs its body. The returned handle is non-owning: the
    /// coroutine lives until [`destroy`](Runtime::destroy) or until the
    /// runtime itself is gone.
    pub fn spawn<C: Coroutine<T> + 'static>(&self, machine: C) -> CoroHandle {
        self.shared.borrow_mut().spawn(None, Box::new(machine))
    }

    /// Like [`spawn`](Runtime::spawn), with a name used in trace events.
    pub fn spawn_named<C: Coroutine<T> + 'static>(
        &self,
        name: impl Into<String>,
        machine: C,
    ) -> CoroHandle {
        self.shared
            .borrow_mut()
            .spawn(Some(name.into()), Box::new(machine))
    }

    /// Runs the coroutine forward from its last suspension point until
    /// control returns outward, following symmetric transfers in between.
    ///
    /// Resuming a terminal coroutine is a contract violation and fails with
    /// [`ResumeTerminal`](RuntimeError::ResumeTerminal); it never silently
    /// no-ops.
    pub fn resume(&self, handle: CoroHandle) -> Result<(), RuntimeError> {
        self.shared.borrow_mut().resume(handle)
    }

    /// Returns the coroutine's lifecycle status. Pure query.
    pub fn status(&self, handle: CoroHandle) -> Result<CoroStatus, RuntimeError> {
        self.shared.borrow().slot(handle).map(|slot| slot.status)
    }

    /// Returns whether the coroutine reached a terminal state. Pure query.
    pub fn is_done(&self, handle: CoroHandle) -> Result<bool, RuntimeError> {
        Ok(self.status(handle)?.is_terminal())
    }

    /// Returns the recorded fault, if the coroutine faulted.
    pub fn fault(&self, handle: CoroHandle) -> Option<Fault> {
        self.shared
            .borrow()
            .slot(handle)
            .ok()
            .and_then(|slot| slot.fault.clone())
    }

    /// Consumes the coroutine's published value, if any.
    pub fn take_value(&self, handle: CoroHandle) -> Option<T> {
        self.shared
            .borrow_mut()
            .slot_mut(handle)
            .ok()
            .and_then(|slot| slot.value.take())
    }

    /// Drops the coroutine's published value, if any.
    pub fn clear_value(&self, handle: CoroHandle) {
        if let Ok(slot) = self.shared.borrow_mut().slot_mut(handle) {
            slot.value = None;
        }
    }

    /// Destroys the coroutine, releasing its machine and any unconsumed
    /// value. Valid in any non-running state, suspended included. A second
    /// destroy of the same handle fails with
    /// [`StaleHandle`](RuntimeError::StaleHandle).
    pub fn destroy(&self, handle: CoroHandle) -> Result<(), RuntimeError> {
        let Ok(mut inner) = self.shared.try_borrow_mut() else {
            return Err(RuntimeError::Reentrant(handle));
        };
        inner.destroy(handle)
    }

    /// Returns how many coroutines are currently in the arena.
    pub fn live(&self) -> usize {
        self.shared.borrow().slots.len()
    }
}

impl<T: 'static> Default for Runtime<T> {
    fn default() -> Self {
        Self::new()
    }
}
