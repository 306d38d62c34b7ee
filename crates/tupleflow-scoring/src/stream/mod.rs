//! Fluent constraint stream API.
//!
//! Streams describe the propagation network; building the factory turns the
//! description into a [`Session`](crate::session::Session).
//!
//! # Example
//!
//! ```
//! use tupleflow_core::HardSoftScore;
//! use tupleflow_scoring::stream::{collector::count, joiner::equal, ConstraintFactory};
//!
//! #[derive(Debug, Clone)]
//! struct Shift {
//!     employee: Option<usize>,
//!     day: i64,
//! }
//!
//! let factory = ConstraintFactory::<Shift, HardSoftScore>::new();
//!
//! factory
//!     .for_each(|s: &Shift| s.employee.is_none())
//!     .penalize(HardSoftScore::ONE_SOFT)
//!     .as_constraint("Unassigned shift");
//!
//! factory
//!     .for_each(|s: &Shift| s.employee.is_some())
//!     .join_unique(equal(|s: &Shift| (s.employee, s.day)))
//!     .penalize(HardSoftScore::ONE_HARD)
//!     .as_constraint("One shift per day");
//!
//! factory
//!     .for_each(|s: &Shift| s.employee.is_some())
//!     .group_by(|s: &Shift| s.employee, count())
//!     .penalize_with(HardSoftScore::ONE_SOFT, |_, n: &usize| (*n as i64) * (*n as i64))
//!     .as_constraint("Balanced workload");
//!
//! let mut session = factory.build().unwrap();
//! session.insert_fact(Shift { employee: Some(0), day: 1 }).unwrap();
//! session.insert_fact(Shift { employee: Some(0), day: 1 }).unwrap();
//! session.insert_fact(Shift { employee: None, day: 2 }).unwrap();
//!
//! assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(-1, -5));
//! ```

mod bi_stream;
mod builder;
mod factory;
mod grouped_stream;
mod tri_stream;
mod uni_stream;

pub mod collector;
pub mod joiner;

#[cfg(test)]
mod tests;

pub use bi_stream::BiStream;
pub use builder::{ConstraintBuilder, GroupedConstraintBuilder};
pub use factory::ConstraintFactory;
pub use grouped_stream::GroupedStream;
pub use tri_stream::TriStream;
pub use uni_stream::UniStream;

use std::sync::Arc;

use tupleflow_core::Score;

use crate::fact::FactHandle;
use crate::node::{IfExistsNode, JoinNode, Node, PairFilter};
use joiner::Joiner;

// Pair filters keep self-joins from matching a fact with itself.
pub(crate) fn ordered_pair(left: &[FactHandle], right: &[FactHandle]) -> bool {
    left[0] < right[0]
}

pub(crate) fn distinct_facts(left: &[FactHandle], right: &[FactHandle]) -> bool {
    left[0] != right[0]
}

pub(crate) fn join_node<F, Sc, J>(
    joiner: J,
    pair_filter: Option<PairFilter>,
) -> Box<dyn Node<F, Sc>>
where
    F: 'static,
    Sc: Score,
    J: Joiner<F>,
{
    let left = Arc::new(joiner);
    let right = Arc::clone(&left);
    let node = JoinNode::<F, J::Index, _, _>::new(
        move |facts: &[&F]| left.left_key(facts[0]),
        move |facts: &[&F]| right.right_key(facts[0]),
    );
    match pair_filter {
        Some(filter) => Box::new(node.with_pair_filter(filter)),
        None => Box::new(node),
    }
}

pub(crate) fn if_exists_node<F, Sc, J>(
    should_exist: bool,
    joiner: J,
    pair_filter: Option<PairFilter>,
) -> Box<dyn Node<F, Sc>>
where
    F: 'static,
    Sc: Score,
    J: Joiner<F>,
{
    let left = Arc::new(joiner);
    let right = Arc::clone(&left);
    let node = IfExistsNode::<F, J::Index, _, _>::new(
        should_exist,
        move |facts: &[&F]| left.left_key(facts[0]),
        move |facts: &[&F]| right.right_key(facts[0]),
    );
    match pair_filter {
        Some(filter) => Box::new(node.with_pair_filter(filter)),
        None => Box::new(node),
    }
}
