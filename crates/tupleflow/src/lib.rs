//! TupleFlow - Incremental Constraint Scoring in Rust
//!
//! Declare constraints once, then feed fact changes to a [`Session`]: only
//! the matches a change touches are rescored.
//!
//! # Example
//!
//! ```rust
//! use tupleflow::prelude::*;
//!
//! #[derive(Clone, Debug)]
//! struct Queen {
//!     column: i64,
//!     row: i64,
//! }
//!
//! let factory = ConstraintFactory::<Queen, SimpleScore>::new();
//! factory
//!     .for_all()
//!     .join_unique(joiner::equal(|q: &Queen| q.row))
//!     .penalize(SimpleScore::ONE)
//!     .as_constraint("Row conflict");
//! let mut session = factory.build().unwrap();
//!
//! let a = session.insert_fact(Queen { column: 0, row: 1 }).unwrap();
//! session.insert_fact(Queen { column: 1, row: 1 }).unwrap();
//! assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-1));
//!
//! session.update_fact(a, |q| q.row = 0).unwrap();
//! assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(0));
//! ```

// Score types
pub use tupleflow_core::score::{
    HardMediumSoftScore, HardSoftScore, ParseableScore, Score, SimpleScore,
};

// Errors and constraint identity
pub use tupleflow_core::{ConsistencyError, ConstraintRef, ImpactType, TupleFlowError};

// Value ranges for domain validation
pub use tupleflow_core::domain;

// Constraint stream API
pub use tupleflow_scoring::stream;

// Live scoring
pub use tupleflow_scoring::{
    ConstraintTotal, ConstraintWeightOverrides, FactHandle, NodeStats, Session,
};

// Configuration
pub use tupleflow_config::{ConfigError, EngineConfig, EnvironmentMode};

/// Lower-level building blocks: tuple stores, indexes and nodes.
pub mod engine {
    pub use tupleflow_scoring::{index, node, tuple};
}

pub mod prelude {
    pub use super::{
        ConstraintWeightOverrides, EngineConfig, EnvironmentMode, FactHandle, Session,
        TupleFlowError,
    };
    pub use super::{HardMediumSoftScore, HardSoftScore, Score, SimpleScore};
    pub use super::stream::{collector, joiner, ConstraintFactory};
}
