// Collectors for grouping and aggregating tuples.

mod consecutive;
mod count;
mod sum;


pub use consecutive::{consecutive, ConsecutiveAccumulator, ConsecutiveCollector};
pub use count::{count, CountAccumulator, CountCollector};
pub use sum::{sum, sum_bi, SumAccumulator, SumCollector};

use tupleflow_core::ConsistencyError;

use crate::tuple::TupleId;

/// Turns the facts of each grouped tuple into a value and folds the values
/// of one group into an accumulator.
pub trait Collector<F>: Send {
    /// What one tuple contributes.
    type Value: Send;
    /// What the weigher sees for a group.
    type Result: ?Sized;
    type Accumulator: Accumulator<Self::Value, Self::Result>;

    fn extract(&self, facts: &[&F]) -> Self::Value;

    fn create_accumulator(&self) -> Self::Accumulator;
}

/// Incrementally maintained aggregate of one group.
///
/// `retract` receives exactly the value that was accumulated for the tuple.
pub trait Accumulator<V, R: ?Sized>: Send {
    fn accumulate(&mut self, tuple: TupleId, value: &V) -> Result<(), ConsistencyError>;

    fn retract(&mut self, tuple: TupleId, value: &V) -> Result<(), ConsistencyError>;

    fn finish(&self) -> &R;
}
