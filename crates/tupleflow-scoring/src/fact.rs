//! Fact storage for a session.
//!
//! Facts live in a slab addressed by generational [`FactHandle`]s, so a
//! handle to a retracted fact never aliases a later one.

use std::fmt;

/// Stable identity of a fact inserted into a session.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactHandle {
    index: u32,
    generation: u32,
}

impl FactHandle {
    /// Slot index of the fact. Handles are ordered by slot, then generation.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Debug for FactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}#{}", self.index, self.generation)
    }
}

impl fmt::Display for FactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct FactSlot<F> {
    generation: u32,
    fact: Option<F>,
}

/// Slab of live facts.
pub(crate) struct FactTable<F> {
    slots: Vec<FactSlot<F>>,
    free: Vec<u32>,
    len: usize,
}

impl<F> FactTable<F> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, fact: F) -> FactHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.fact = Some(fact);
            return FactHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(FactSlot {
            generation: 0,
            fact: Some(fact),
        });
        FactHandle {
            index,
            generation: 0,
        }
    }

    fn slot(&self, handle: FactHandle) -> Option<&FactSlot<F>> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
    }

    pub(crate) fn get(&self, handle: FactHandle) -> Option<&F> {
        self.slot(handle).and_then(|slot| slot.fact.as_ref())
    }

    pub(crate) fn get_mut(&mut self, handle: FactHandle) -> Option<&mut F> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.fact.as_mut())
    }

    pub(crate) fn contains(&self, handle: FactHandle) -> bool {
        self.get(handle).is_some()
    }

    pub(crate) fn remove(&mut self, handle: FactHandle) -> Option<F> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let fact = slot.fact.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(fact)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Live facts in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (FactHandle, &F)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.fact.as_ref().map(|fact| {
                (
                    FactHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    fact,
                )
            })
        })
    }

    pub(crate) fn handles(&self) -> Vec<FactHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}
