//! Consecutive collector: runs of consecutive points per group.

use std::marker::PhantomData;

use tupleflow_core::{ConsistencyError, RangePoint};

use super::{Accumulator, Collector};
use crate::index::RangeIndex;
use crate::tuple::TupleId;

/// Creates a collector placing each fact at a point of a [`RangeIndex`].
///
/// The weigher sees the whole index and can score its sequences and breaks,
/// for instance penalizing every run of consecutive shifts longer than five.
pub fn consecutive<F, P, M>(point: M, max_gap: P::Distance) -> ConsecutiveCollector<F, P, M>
where
    P: RangePoint,
    M: Fn(&F) -> P + Send,
{
    ConsecutiveCollector {
        point,
        max_gap,
        _phantom: PhantomData,
    }
}

/// Created by the [`consecutive()`] function.
pub struct ConsecutiveCollector<F, P: RangePoint, M> {
    point: M,
    max_gap: P::Distance,
    _phantom: PhantomData<fn(&F)>,
}

impl<F, P, M> Collector<F> for ConsecutiveCollector<F, P, M>
where
    P: RangePoint,
    M: Fn(&F) -> P + Send,
{
    type Value = P;
    type Result = RangeIndex<P, TupleId>;
    type Accumulator = ConsecutiveAccumulator<P>;

    fn extract(&self, facts: &[&F]) -> P {
        (self.point)(facts[0])
    }

    fn create_accumulator(&self) -> ConsecutiveAccumulator<P> {
        ConsecutiveAccumulator {
            index: RangeIndex::new(self.max_gap),
        }
    }
}

/// Accumulator holding one range index per group.
#[derive(Debug)]
pub struct ConsecutiveAccumulator<P: RangePoint> {
    index: RangeIndex<P, TupleId>,
}

impl<P: RangePoint> Accumulator<P, RangeIndex<P, TupleId>> for ConsecutiveAccumulator<P> {
    fn accumulate(&mut self, tuple: TupleId, point: &P) -> Result<(), ConsistencyError> {
        self.index.insert(*point, tuple)
    }

    fn retract(&mut self, tuple: TupleId, point: &P) -> Result<(), ConsistencyError> {
        let stored = self.index.remove(tuple)?;
        if stored != *point {
            return Err(ConsistencyError::missing("ConsecutiveAccumulator::retract", point));
        }
        Ok(())
    }

    fn finish(&self) -> &RangeIndex<P, TupleId> {
        &self.index
    }
}
