//! Multi-level scores.
//!
//! Levels are compared highest priority first. The engine only ever changes
//! a score by adding or subtracting impacts.

#[macro_use]
mod macros;

mod hard_medium_soft;
mod hard_soft;
mod simple;
mod traits;


pub use hard_medium_soft::HardMediumSoftScore;
pub use hard_soft::HardSoftScore;
pub use simple::SimpleScore;
pub use traits::{ParseableScore, Score, ScoreParseError};

/// What a score level stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreLevel {
    /// Must reach zero for a feasible solution.
    Hard,
    Medium,
    Soft,
}
