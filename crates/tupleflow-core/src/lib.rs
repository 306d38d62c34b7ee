//! TupleFlow Core - shared types for the incremental scoring engine
//!
//! This crate provides the fundamental abstractions used by the engine:
//! - Score types for representing solution quality
//! - Constraint identification and impact direction
//! - The error taxonomy (consistency violations, domain-range errors)
//! - Value ranges and range-point arithmetic

pub mod constraint;
pub mod domain;
pub mod error;
pub mod score;

pub use constraint::{ConstraintRef, ImpactType};
pub use domain::{IntegerRange, ListValueRange, RangePoint, RealRange, ValueRange};
pub use error::{ConsistencyError, TupleFlowError};
pub use score::{
    HardMediumSoftScore, HardSoftScore, ParseableScore, Score, ScoreLevel, ScoreParseError,
    SimpleScore,
};
