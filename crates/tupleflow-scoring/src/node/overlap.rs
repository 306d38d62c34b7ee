//! Interval index for overlap joins.

use std::collections::HashMap;

use tupleflow_core::{ConsistencyError, RangePoint, TupleFlowError};

use super::join::{JoinIndex, JoinNode};
use crate::index::RangeIndex;
use crate::tuple::TupleId;

/// Join node matching half-open intervals `[start, end)` that overlap.
pub type OverlapJoinNode<F, P, LK, RK> = JoinNode<F, IntervalIndex<P>, LK, RK>;

/// Indexes half-open intervals by their start point.
///
/// A lookup scans starts in `[probe_start - max_span, probe_end)`, where
/// `max_span` is the longest interval ever stored since the last clear, then
/// keeps the intervals that really overlap. Empty intervals overlap nothing.
pub struct IntervalIndex<P: RangePoint> {
    starts: RangeIndex<P, TupleId>,
    intervals: HashMap<TupleId, (P, P)>,
    max_span: Option<P::Distance>,
}

impl<P: RangePoint> Default for IntervalIndex<P> {
    fn default() -> Self {
        Self {
            starts: RangeIndex::new(P::zero_distance()),
            intervals: HashMap::new(),
            max_span: None,
        }
    }
}

impl<P: RangePoint> IntervalIndex<P> {
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// True if the half-open intervals share a point.
pub fn overlaps<P: Ord>(a: &(P, P), b: &(P, P)) -> bool {
    a.0 < a.1 && b.0 < b.1 && a.0 < b.1 && b.0 < a.1
}

impl<P: RangePoint> JoinIndex for IntervalIndex<P> {
    type Key = (P, P);

    fn put(&mut self, key: (P, P), tuple: TupleId) -> Result<(), TupleFlowError> {
        let (start, end) = key;
        if end < start {
            return Err(TupleFlowError::DomainRange(format!(
                "interval end {:?} precedes start {:?}",
                end, start
            )));
        }
        if self.intervals.contains_key(&tuple) {
            return Err(ConsistencyError::duplicate("IntervalIndex::put", tuple).into());
        }
        self.starts.insert(start, tuple)?;
        self.intervals.insert(tuple, key);
        let span = start.distance(end);
        self.max_span = Some(self.max_span.map_or(span, |max| max.max(span)));
        Ok(())
    }

    fn remove(&mut self, tuple: TupleId) -> Result<(P, P), ConsistencyError> {
        let key = self
            .intervals
            .remove(&tuple)
            .ok_or_else(|| ConsistencyError::missing("IntervalIndex::remove", tuple))?;
        self.starts.remove(tuple)?;
        Ok(key)
    }

    fn key_of(&self, tuple: TupleId) -> Option<&(P, P)> {
        self.intervals.get(&tuple)
    }

    fn matching(&self, key: &(P, P)) -> Vec<TupleId> {
        let Some(max_span) = self.max_span else {
            return Vec::new();
        };
        let (start, end) = *key;
        if end <= start {
            return Vec::new();
        }
        self.starts
            .items_between(start.retreat(max_span), end)
            .filter(|(_, tuple)| {
                self.intervals
                    .get(tuple)
                    .is_some_and(|interval| overlaps(interval, key))
            })
            .map(|(_, tuple)| tuple)
            .collect()
    }

    fn clear(&mut self) {
        self.starts.clear();
        self.intervals.clear();
        self.max_span = None;
    }
}
