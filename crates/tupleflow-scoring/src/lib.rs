//! Incremental constraint-score propagation for TupleFlow.
//!
//! This crate turns a declarative constraint network into a live scoring
//! session:
//! - Tuple stores with O(1) removal through a stored handle
//! - Equality and range (sequence/break) indexes
//! - Source, filter, join, if-exists, group and scorer nodes
//! - A fluent constraint-stream builder and the change-driving [`Session`]
//!
//! # Architecture
//!
//! A fact change touches only the tuples that matched it: each node keeps the
//! key every tuple was indexed under, and every derived tuple is recorded in
//! the tuple store of the tuple(s) that produced it.

// Node and stream generics carry closures as type parameters
#![allow(clippy::type_complexity)]

pub mod fact;
pub mod index;
pub mod node;
pub mod session;
pub mod stream;
pub mod tuple;

pub use fact::FactHandle;
pub use index::{Break, EqualityIndex, RangeIndex, Sequence};
pub use node::{Node, NodeId, Side, SignalKind};
pub use session::{ConstraintTotal, ConstraintWeightOverrides, NodeStats, Session, SignalCounts};
pub use stream::collector::{consecutive, count, sum, sum_bi, Accumulator, Collector};
pub use stream::joiner::{equal, equal_bi, overlapping, Joiner};
pub use stream::{
    BiStream, ConstraintBuilder, ConstraintFactory, GroupedConstraintBuilder, GroupedStream,
    TriStream, UniStream,
};
pub use tuple::{StoreHandle, TupleId, TupleStore, Visit};
