//! Count collector for counting tuples.

use std::marker::PhantomData;

use tupleflow_core::ConsistencyError;

use super::{Accumulator, Collector};
use crate::tuple::TupleId;

/// Creates a collector that counts tuples.
pub fn count<F>() -> CountCollector<F> {
    CountCollector {
        _phantom: PhantomData,
    }
}

/// A collector that counts tuples.
///
/// Created by the [`count()`] function.
pub struct CountCollector<F> {
    _phantom: PhantomData<fn(&F)>,
}

impl<F> Collector<F> for CountCollector<F> {
    type Value = ();
    type Result = usize;
    type Accumulator = CountAccumulator;

    #[inline]
    fn extract(&self, _facts: &[&F]) {}

    fn create_accumulator(&self) -> CountAccumulator {
        CountAccumulator { count: 0 }
    }
}

/// Accumulator for counting tuples.
#[derive(Debug)]
pub struct CountAccumulator {
    count: usize,
}

impl Accumulator<(), usize> for CountAccumulator {
    #[inline]
    fn accumulate(&mut self, _tuple: TupleId, _: &()) -> Result<(), ConsistencyError> {
        self.count += 1;
        Ok(())
    }

    fn retract(&mut self, tuple: TupleId, _: &()) -> Result<(), ConsistencyError> {
        self.count = self
            .count
            .checked_sub(1)
            .ok_or_else(|| ConsistencyError::missing("CountAccumulator::retract", tuple))?;
        Ok(())
    }

    #[inline]
    fn finish(&self) -> &usize {
        &self.count
    }
}
