//! Ordered index that groups points into runs of consecutive values.
//!
//! Two neighbouring points are consecutive when their distance does not
//! exceed the index's maximum gap. Each maximal run of consecutive points is a
//! [`Sequence`]; the space between two neighbouring sequences is a [`Break`].
//! Both are views computed from the index; only sequence bounds are stored.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::ops::Bound::{Excluded, Included, Unbounded};

use indexmap::IndexSet;
use tupleflow_core::{ConsistencyError, RangePoint};

/// Points with attached elements, grouped into sequences.
///
/// Inserting or removing one element touches at most the two sequences
/// neighbouring its point. The first and last sequence starts are cached, so
/// [`Sequence::is_first`], [`Sequence::is_last`], [`Break::is_first`] and
/// [`Break::is_last`] run in constant time.
///
/// # Example
///
/// ```
/// use tupleflow_scoring::index::RangeIndex;
///
/// let mut index = RangeIndex::new(1i64);
/// for (item, point) in [1, 2, 4, 5, 6, 10].into_iter().enumerate() {
///     index.insert(point, item).unwrap();
/// }
///
/// let breaks: Vec<_> = index.breaks().map(|b| b.length()).collect();
/// assert_eq!(breaks, vec![2, 4]);
///
/// index.insert(3, 99).unwrap();
/// assert_eq!(index.breaks().count(), 1);
/// ```
pub struct RangeIndex<P: RangePoint, T> {
    max_gap: P::Distance,
    points: BTreeMap<P, IndexSet<T>>,
    item_points: HashMap<T, P>,
    // start -> end, inclusive
    sequences: BTreeMap<P, P>,
    first_start: Option<P>,
    last_start: Option<P>,
}

impl<P: RangePoint, T: Debug> Debug for RangeIndex<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeIndex")
            .field("max_gap", &self.max_gap)
            .field("sequences", &self.sequences)
            .field("len", &self.item_points.len())
            .finish()
    }
}

impl<P, T> RangeIndex<P, T>
where
    P: RangePoint,
    T: Copy + Eq + Hash + Debug,
{
    /// Creates an empty index. Points at most `max_gap` apart are consecutive.
    pub fn new(max_gap: P::Distance) -> Self {
        Self {
            max_gap,
            points: BTreeMap::new(),
            item_points: HashMap::new(),
            sequences: BTreeMap::new(),
            first_start: None,
            last_start: None,
        }
    }

    pub fn max_gap(&self) -> P::Distance {
        self.max_gap
    }

    /// Places `item` at `point`.
    pub fn insert(&mut self, point: P, item: T) -> Result<(), ConsistencyError> {
        if self.item_points.contains_key(&item) {
            return Err(ConsistencyError::duplicate("RangeIndex::insert", item));
        }
        self.item_points.insert(item, point);

        if let Some(items) = self.points.get_mut(&point) {
            items.insert(item);
            return Ok(());
        }
        let mut items = IndexSet::new();
        items.insert(item);
        self.points.insert(point, items);

        let prev = self
            .sequences
            .range(..point)
            .next_back()
            .map(|(start, end)| (*start, *end));
        if let Some((_, end)) = prev {
            if end > point {
                // inside an existing sequence
                return Ok(());
            }
        }
        let next = self
            .sequences
            .range((Excluded(point), Unbounded))
            .next()
            .map(|(start, end)| (*start, *end));

        let joins_prev = prev.filter(|(_, end)| end.distance(point) <= self.max_gap);
        let joins_next = next.filter(|(start, _)| point.distance(*start) <= self.max_gap);
        match (joins_prev, joins_next) {
            (Some((prev_start, _)), Some((next_start, next_end))) => {
                self.sequences.remove(&next_start);
                self.sequences.insert(prev_start, next_end);
            }
            (Some((prev_start, _)), None) => {
                self.sequences.insert(prev_start, point);
            }
            (None, Some((next_start, next_end))) => {
                self.sequences.remove(&next_start);
                self.sequences.insert(point, next_end);
            }
            (None, None) => {
                self.sequences.insert(point, point);
            }
        }
        self.refresh_bounds();
        Ok(())
    }

    /// Removes `item`, returning the point it was placed at.
    pub fn remove(&mut self, item: T) -> Result<P, ConsistencyError> {
        let point = self
            .item_points
            .remove(&item)
            .ok_or_else(|| ConsistencyError::missing("RangeIndex::remove", item))?;
        let items = self
            .points
            .get_mut(&point)
            .ok_or_else(|| ConsistencyError::missing("RangeIndex::remove", point))?;
        if !items.shift_remove(&item) {
            return Err(ConsistencyError::missing("RangeIndex::remove", item));
        }
        if !items.is_empty() {
            return Ok(point);
        }
        self.points.remove(&point);

        let (start, end) = self
            .sequences
            .range(..=point)
            .next_back()
            .map(|(start, end)| (*start, *end))
            .ok_or_else(|| ConsistencyError::missing("RangeIndex::remove sequence", point))?;

        let before = self.points.range(..point).next_back().map(|(p, _)| *p);
        let after = self
            .points
            .range((Excluded(point), Unbounded))
            .next()
            .map(|(p, _)| *p);

        if start == point && end == point {
            self.sequences.remove(&start);
        } else if start == point {
            let new_start =
                after.ok_or_else(|| ConsistencyError::missing("RangeIndex::remove", point))?;
            self.sequences.remove(&start);
            self.sequences.insert(new_start, end);
        } else if end == point {
            let new_end =
                before.ok_or_else(|| ConsistencyError::missing("RangeIndex::remove", point))?;
            self.sequences.insert(start, new_end);
        } else if let (Some(before), Some(after)) = (before, after) {
            if before.distance(after) > self.max_gap {
                self.sequences.insert(start, before);
                self.sequences.insert(after, end);
            }
        }
        self.refresh_bounds();
        Ok(point)
    }

    fn refresh_bounds(&mut self) {
        self.first_start = self.sequences.keys().next().copied();
        self.last_start = self.sequences.keys().next_back().copied();
    }

    /// The point `item` is placed at.
    pub fn point_of(&self, item: T) -> Option<P> {
        self.item_points.get(&item).copied()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.item_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_points.is_empty()
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    pub fn break_count(&self) -> usize {
        self.sequences.len().saturating_sub(1)
    }

    fn view(&self, start: P, end: P) -> Sequence<'_, P, T> {
        Sequence {
            index: self,
            start,
            end,
        }
    }

    /// Sequences in ascending order.
    pub fn sequences(&self) -> impl Iterator<Item = Sequence<'_, P, T>> + '_ {
        self.sequences
            .iter()
            .map(move |(start, end)| self.view(*start, *end))
    }

    pub fn first_sequence(&self) -> Option<Sequence<'_, P, T>> {
        self.sequences
            .iter()
            .next()
            .map(|(start, end)| self.view(*start, *end))
    }

    pub fn last_sequence(&self) -> Option<Sequence<'_, P, T>> {
        self.sequences
            .iter()
            .next_back()
            .map(|(start, end)| self.view(*start, *end))
    }

    /// Breaks in ascending order.
    pub fn breaks(&self) -> impl Iterator<Item = Break<'_, P, T>> + '_ {
        let mut sequences = self.sequences();
        let mut previous = sequences.next();
        std::iter::from_fn(move || {
            let next = sequences.next()?;
            let prev = previous.replace(next)?;
            Some(Break {
                previous: prev,
                next,
            })
        })
    }

    /// Breaks whose length is at least `length`.
    pub fn breaks_at_least(
        &self,
        length: P::Distance,
    ) -> impl Iterator<Item = Break<'_, P, T>> + '_ {
        self.breaks().filter(move |b| b.length() >= length)
    }

    /// Items placed in `[from, to]`, ordered by point then insertion.
    pub fn items_between(&self, from: P, to: P) -> impl Iterator<Item = (P, T)> + '_ {
        let range = if from <= to {
            Some(self.points.range((Included(from), Included(to))))
        } else {
            None
        };
        range
            .into_iter()
            .flatten()
            .flat_map(|(point, items)| items.iter().map(move |item| (*point, *item)))
    }

    /// Sequences sharing at least one point with `[from, to]`.
    pub fn sequences_overlapping(
        &self,
        from: P,
        to: P,
    ) -> impl Iterator<Item = Sequence<'_, P, T>> + '_ {
        let containing = self
            .sequences
            .range(..=from)
            .next_back()
            .filter(|(_, end)| **end >= from && from <= to)
            .map(|(start, end)| self.view(*start, *end));
        let later = if from < to {
            Some(self.sequences.range((Excluded(from), Included(to))))
        } else {
            None
        };
        containing.into_iter().chain(
            later
                .into_iter()
                .flatten()
                .map(move |(start, end)| self.view(*start, *end)),
        )
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.item_points.clear();
        self.sequences.clear();
        self.first_start = None;
        self.last_start = None;
    }
}

/// A maximal run of consecutive points.
pub struct Sequence<'a, P: RangePoint, T> {
    index: &'a RangeIndex<P, T>,
    start: P,
    end: P,
}

impl<P: RangePoint, T> Clone for Sequence<'_, P, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: RangePoint, T> Copy for Sequence<'_, P, T> {}

impl<P: RangePoint, T> Debug for Sequence<'_, P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence[{:?}..={:?}]", self.start, self.end)
    }
}

impl<'a, P, T> Sequence<'a, P, T>
where
    P: RangePoint,
    T: Copy + Eq + Hash + Debug,
{
    pub fn first_point(&self) -> P {
        self.start
    }

    pub fn last_point(&self) -> P {
        self.end
    }

    /// First item at the first point.
    pub fn first_item(&self) -> Option<T> {
        self.index
            .points
            .get(&self.start)
            .and_then(|items| items.first().copied())
    }

    /// Last item at the last point.
    pub fn last_item(&self) -> Option<T> {
        self.index
            .points
            .get(&self.end)
            .and_then(|items| items.last().copied())
    }

    /// Items of this sequence, ordered by point then insertion.
    pub fn items(&self) -> impl Iterator<Item = (P, T)> + 'a {
        self.index.items_between(self.start, self.end)
    }

    /// Number of items in this sequence.
    pub fn count(&self) -> usize {
        self.index
            .points
            .range(self.start..=self.end)
            .map(|(_, items)| items.len())
            .sum()
    }

    /// Distance from the first to the last point.
    pub fn span(&self) -> P::Distance {
        self.start.distance(self.end)
    }

    /// Length counting the first point as one gap: `max_gap + span`,
    /// saturating at the largest distance.
    pub fn length(&self) -> P::Distance {
        P::add_distance(self.index.max_gap, self.span())
    }

    pub fn is_first(&self) -> bool {
        self.index.first_start == Some(self.start)
    }

    pub fn is_last(&self) -> bool {
        self.index.last_start == Some(self.start)
    }

    /// The break before this sequence.
    pub fn previous_break(&self) -> Option<Break<'a, P, T>> {
        let index = self.index;
        index
            .sequences
            .range(..self.start)
            .next_back()
            .map(|(start, end)| Break {
                previous: index.view(*start, *end),
                next: *self,
            })
    }

    /// The break after this sequence.
    pub fn next_break(&self) -> Option<Break<'a, P, T>> {
        let index = self.index;
        index
            .sequences
            .range((Excluded(self.start), Unbounded))
            .next()
            .map(|(start, end)| Break {
                previous: *self,
                next: index.view(*start, *end),
            })
    }
}

/// The gap between two neighbouring sequences.
pub struct Break<'a, P: RangePoint, T> {
    previous: Sequence<'a, P, T>,
    next: Sequence<'a, P, T>,
}

impl<P: RangePoint, T> Clone for Break<'_, P, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: RangePoint, T> Copy for Break<'_, P, T> {}

impl<P: RangePoint, T> Debug for Break<'_, P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Break({:?}..{:?})", self.previous.end, self.next.start)
    }
}

impl<'a, P, T> Break<'a, P, T>
where
    P: RangePoint,
    T: Copy + Eq + Hash + Debug,
{
    pub fn previous_sequence(&self) -> Sequence<'a, P, T> {
        self.previous
    }

    pub fn next_sequence(&self) -> Sequence<'a, P, T> {
        self.next
    }

    /// Last point before the break.
    pub fn previous_end(&self) -> P {
        self.previous.end
    }

    /// First point after the break.
    pub fn next_start(&self) -> P {
        self.next.start
    }

    /// Distance across the break.
    pub fn length(&self) -> P::Distance {
        self.previous.end.distance(self.next.start)
    }

    pub fn is_first(&self) -> bool {
        self.previous.is_first()
    }

    pub fn is_last(&self) -> bool {
        self.next.is_last()
    }
}
