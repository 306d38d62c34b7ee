// Sum collector for summing values extracted from tuples.

use std::marker::PhantomData;
use std::ops::{AddAssign, SubAssign};

use tupleflow_core::ConsistencyError;

use super::{Accumulator, Collector};
use crate::tuple::TupleId;

// Creates a collector that sums a value mapped from each fact.
pub fn sum<F, T, M>(mapper: M) -> SumCollector<F, T, impl Fn(&[&F]) -> T + Send>
where
    T: Default + Copy + AddAssign + SubAssign + Send,
    M: Fn(&F) -> T + Send,
{
    SumCollector {
        mapper: move |facts: &[&F]| mapper(facts[0]),
        _phantom: PhantomData,
    }
}

// Creates a collector that sums a value mapped from each pair of facts.
pub fn sum_bi<F, T, M>(mapper: M) -> SumCollector<F, T, impl Fn(&[&F]) -> T + Send>
where
    T: Default + Copy + AddAssign + SubAssign + Send,
    M: Fn(&F, &F) -> T + Send,
{
    SumCollector {
        mapper: move |facts: &[&F]| mapper(facts[0], facts[1]),
        _phantom: PhantomData,
    }
}

// Collector that sums values extracted from tuples.
//
// Created by the [`sum()`] and [`sum_bi()`] functions.
pub struct SumCollector<F, T, M> {
    mapper: M,
    _phantom: PhantomData<fn(&F) -> T>,
}

impl<F, T, M> Collector<F> for SumCollector<F, T, M>
where
    T: Default + Copy + AddAssign + SubAssign + Send,
    M: Fn(&[&F]) -> T + Send,
{
    type Value = T;
    type Result = T;
    type Accumulator = SumAccumulator<T>;

    #[inline]
    fn extract(&self, facts: &[&F]) -> T {
        (self.mapper)(facts)
    }

    fn create_accumulator(&self) -> SumAccumulator<T> {
        SumAccumulator { sum: T::default() }
    }
}

// Accumulator for summing values.
//
// Works with pre-extracted values, so a retract subtracts exactly what was added.
#[derive(Debug)]
pub struct SumAccumulator<T> {
    sum: T,
}

impl<T> Accumulator<T, T> for SumAccumulator<T>
where
    T: Default + Copy + AddAssign + SubAssign + Send,
{
    #[inline]
    fn accumulate(&mut self, _tuple: TupleId, value: &T) -> Result<(), ConsistencyError> {
        self.sum += *value;
        Ok(())
    }

    #[inline]
    fn retract(&mut self, _tuple: TupleId, value: &T) -> Result<(), ConsistencyError> {
        self.sum -= *value;
        Ok(())
    }

    #[inline]
    fn finish(&self) -> &T {
        &self.sum
    }
}
