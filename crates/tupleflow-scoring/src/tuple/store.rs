//! Insertion-ordered tuple store with O(1) removal by handle.

use std::fmt;

use tupleflow_core::ConsistencyError;

/// Handle to an entry of a [`TupleStore`].
///
/// A handle becomes dangling once its entry is removed; the slot's
/// generation changes so a reused slot never validates an old handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreHandle {
    slot: u32,
    generation: u32,
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}#{}", self.slot, self.generation)
    }
}

/// What [`TupleStore::for_each`] should do with the visited entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Keep,
    Remove,
}

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    element: Option<T>,
    prev: Option<u32>,
    next: Option<u32>,
}

/// An intrusive doubly-linked list over a slab.
///
/// Iteration follows insertion order. Removing through a handle unlinks the
/// entry in constant time, including while [`for_each`](Self::for_each) is
/// visiting it.
///
/// # Example
///
/// ```
/// use tupleflow_scoring::tuple::{TupleStore, Visit};
///
/// let mut store = TupleStore::new();
/// let a = store.add('a');
/// store.add('b');
/// store.add('c');
///
/// store.remove(a).unwrap();
/// assert_eq!(store.iter().collect::<String>(), "bc");
///
/// store.for_each(|_, c| if *c == 'b' { Visit::Remove } else { Visit::Keep });
/// assert_eq!(store.iter().collect::<String>(), "c");
/// ```
#[derive(Debug)]
pub struct TupleStore<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<T> Default for TupleStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TupleStore<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Appends an element and returns the handle of its entry.
    pub fn add(&mut self, element: T) -> StoreHandle {
        let prev = self.tail;
        let slot = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.entries[slot as usize];
                entry.element = Some(element);
                entry.prev = prev;
                entry.next = None;
                slot
            }
            None => {
                self.entries.push(Entry {
                    generation: 0,
                    element: Some(element),
                    prev,
                    next: None,
                });
                (self.entries.len() - 1) as u32
            }
        };
        match prev {
            Some(tail) => self.entries[tail as usize].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
        StoreHandle {
            slot,
            generation: self.entries[slot as usize].generation,
        }
    }

    /// Removes the entry a handle points at.
    pub fn remove(&mut self, handle: StoreHandle) -> Result<T, ConsistencyError> {
        if self.get(handle).is_none() {
            return Err(ConsistencyError::DanglingHandle {
                context: "TupleStore::remove",
                handle: format!("{:?}", handle),
            });
        }
        self.unlink(handle.slot)
            .ok_or_else(|| ConsistencyError::DanglingHandle {
                context: "TupleStore::remove",
                handle: format!("{:?}", handle),
            })
    }

    pub fn get(&self, handle: StoreHandle) -> Option<&T> {
        self.entries
            .get(handle.slot as usize)
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.element.as_ref())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates elements in insertion order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            store: self,
            cursor: self.head,
        }
    }

    /// Visits every entry in insertion order.
    ///
    /// The visitor may ask to remove the visited entry; the successor is
    /// captured before the visit, so iteration continues unaffected.
    /// Returns the number of removed entries.
    pub fn for_each<V>(&mut self, mut visitor: V) -> usize
    where
        V: FnMut(StoreHandle, &T) -> Visit,
    {
        let mut cursor = self.head;
        let mut removed = 0;
        while let Some(slot) = cursor {
            let entry = &self.entries[slot as usize];
            cursor = entry.next;
            let visit = match entry.element.as_ref() {
                Some(element) => visitor(
                    StoreHandle {
                        slot,
                        generation: entry.generation,
                    },
                    element,
                ),
                None => Visit::Keep,
            };
            if visit == Visit::Remove && self.unlink(slot).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Removes every entry, returning the elements in insertion order.
    pub fn drain(&mut self) -> Vec<T> {
        let mut drained = Vec::with_capacity(self.len);
        while let Some(head) = self.head {
            match self.unlink(head) {
                Some(element) => drained.push(element),
                None => break,
            }
        }
        drained
    }

    fn unlink(&mut self, slot: u32) -> Option<T> {
        let entry = self.entries.get_mut(slot as usize)?;
        let element = entry.element.take()?;
        let (prev, next) = (entry.prev.take(), entry.next.take());
        entry.generation = entry.generation.wrapping_add(1);

        match prev {
            Some(p) => self.entries[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entries[n as usize].prev = prev,
            None => self.tail = prev,
        }
        self.free.push(slot);
        self.len -= 1;
        Some(element)
    }
}

/// Iterator over a [`TupleStore`] in insertion order.
pub struct Iter<'a, T> {
    store: &'a TupleStore<T>,
    cursor: Option<u32>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let slot = self.cursor?;
        let entry = &self.store.entries[slot as usize];
        self.cursor = entry.next;
        entry.element.as_ref()
    }
}
