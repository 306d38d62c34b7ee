//! Tuples and the per-node Tuple Store.
//!
//! A tuple is an ordered bundle of fact handles flowing between nodes.
//! Tuples live in a session-wide [`TupleArena`]; nodes refer to them by
//! [`TupleId`] and keep their own records about them.

mod store;


pub use store::{StoreHandle, TupleStore, Visit};

use std::any::Any;
use std::fmt;

use smallvec::SmallVec;
use tupleflow_core::ConsistencyError;

use crate::fact::FactHandle;

/// Fact handles of a tuple, left to right.
pub type FactHandles = SmallVec<[FactHandle; 4]>;

/// Identity of a tuple in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TupleId {
    index: u32,
    generation: u32,
}

impl fmt::Debug for TupleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}#{}", self.index, self.generation)
    }
}

/// Lifecycle of a tuple within a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleState {
    /// Inserted or updated and still matched.
    Live,
    /// Retracted; readable until the change settles.
    Dying,
}

/// Data a node attaches to the tuples it creates, such as a group's state.
pub type Payload = Box<dyn Any + Send>;

struct Tuple {
    facts: FactHandles,
    state: TupleState,
    payload: Option<Payload>,
}

struct TupleSlot {
    generation: u32,
    tuple: Option<Tuple>,
}

/// Session-wide tuple storage.
///
/// Killing a tuple only marks it dying; its slot is released by
/// [`TupleArena::release_dying`] once the change has settled.
pub(crate) struct TupleArena {
    slots: Vec<TupleSlot>,
    free: Vec<u32>,
    dying: Vec<TupleId>,
    occupied: usize,
}

impl TupleArena {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            dying: Vec::new(),
            occupied: 0,
        }
    }

    pub(crate) fn create(&mut self, facts: FactHandles) -> TupleId {
        self.create_with(facts, None)
    }

    pub(crate) fn create_with(&mut self, facts: FactHandles, payload: Option<Payload>) -> TupleId {
        let tuple = Tuple {
            facts,
            state: TupleState::Live,
            payload,
        };
        self.occupied += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.tuple = Some(tuple);
            return TupleId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(TupleSlot {
            generation: 0,
            tuple: Some(tuple),
        });
        TupleId {
            index,
            generation: 0,
        }
    }

    fn tuple(&self, id: TupleId) -> Result<&Tuple, ConsistencyError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.tuple.as_ref())
            .ok_or_else(|| ConsistencyError::UnknownTuple {
                tuple: format!("{:?}", id),
            })
    }

    pub(crate) fn facts(&self, id: TupleId) -> Result<&[FactHandle], ConsistencyError> {
        self.tuple(id).map(|tuple| tuple.facts.as_slice())
    }

    /// The payload of a tuple, if it carries one of type `T`.
    pub(crate) fn payload<T: Any>(&self, id: TupleId) -> Result<&T, ConsistencyError> {
        self.tuple(id)?
            .payload
            .as_ref()
            .and_then(|payload| payload.downcast_ref())
            .ok_or_else(|| ConsistencyError::missing("TupleArena::payload", id))
    }

    pub(crate) fn payload_mut<T: Any>(&mut self, id: TupleId) -> Result<&mut T, ConsistencyError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.tuple.as_mut())
            .and_then(|tuple| tuple.payload.as_mut())
            .and_then(|payload| payload.downcast_mut())
            .ok_or_else(|| ConsistencyError::missing("TupleArena::payload_mut", id))
    }

    pub(crate) fn kill(&mut self, id: TupleId) -> Result<(), ConsistencyError> {
        let tuple = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.tuple.as_mut())
            .ok_or_else(|| ConsistencyError::missing("TupleArena::kill", id))?;
        if tuple.state == TupleState::Dying {
            return Err(ConsistencyError::missing("TupleArena::kill", id));
        }
        tuple.state = TupleState::Dying;
        self.dying.push(id);
        Ok(())
    }

    /// Frees every tuple killed since the last release. Returns how many.
    pub(crate) fn release_dying(&mut self) -> usize {
        let released = self.dying.len();
        for id in self.dying.drain(..) {
            let slot = &mut self.slots[id.index as usize];
            slot.tuple = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
        self.occupied -= released;
        released
    }

    pub(crate) fn pending_release(&self) -> usize {
        self.dying.len()
    }

    /// Number of live tuples.
    pub(crate) fn live_count(&self) -> usize {
        self.occupied - self.dying.len()
    }

    /// Drops every tuple. Old ids stay invalid.
    pub(crate) fn clear(&mut self) {
        self.dying.clear();
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.tuple.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
        self.free.reverse();
        self.occupied = 0;
    }
}
