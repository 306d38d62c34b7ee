//! Error types for TupleFlow

use thiserror::Error;

/// Main error type for TupleFlow operations
#[derive(Debug, Error)]
pub enum TupleFlowError {
    /// Error in engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value range or interval was constructed with malformed bounds,
    /// or a value outside the domain was offered.
    #[error("Domain range error: {0}")]
    DomainRange(String),

    /// The propagation network detected an internal inconsistency.
    #[error("Consistency violation: {0}")]
    Consistency(#[from] ConsistencyError),

    /// An assert mode found that the incremental score drifted from a full recalculation.
    #[error(
        "Score corruption: incremental score ({incremental}) \
         differs from recalculated score ({recalculated})"
    )]
    ScoreCorruption {
        incremental: String,
        recalculated: String,
    },

    /// The session observed an earlier consistency violation and must be rebuilt.
    #[error("Session is corrupted and must be rebuilt: {0}")]
    Corrupted(String),
}

/// An internal-consistency violation inside the propagation network.
///
/// These signal a bug in the network wiring or in the change driver's
/// before/after discipline. They are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    /// An element was inserted into a structure that already holds it.
    #[error("{context}: {item} was already inserted")]
    DuplicateInsert { context: &'static str, item: String },

    /// An element was removed from a structure that does not hold it.
    #[error("{context}: {item} was never inserted or was already removed")]
    MissingOnRetract { context: &'static str, item: String },

    /// A tuple store handle no longer refers to a linked entry.
    #[error("{context}: handle {handle} is not linked")]
    DanglingHandle { context: &'static str, handle: String },

    /// An element that still carries a live store handle was offered again.
    #[error("{context}: {item} still carries a live handle")]
    HandleInUse { context: &'static str, item: String },

    /// A fact handle does not refer to a live fact.
    #[error("unknown fact {handle}")]
    UnknownFact { handle: String },

    /// A tuple id does not refer to a live tuple.
    #[error("unknown tuple {tuple}")]
    UnknownTuple { tuple: String },
}

impl ConsistencyError {
    /// Shorthand for [`ConsistencyError::DuplicateInsert`].
    pub fn duplicate(context: &'static str, item: impl std::fmt::Debug) -> Self {
        ConsistencyError::DuplicateInsert {
            context,
            item: format!("{:?}", item),
        }
    }

    /// Shorthand for [`ConsistencyError::MissingOnRetract`].
    pub fn missing(context: &'static str, item: impl std::fmt::Debug) -> Self {
        ConsistencyError::MissingOnRetract {
            context,
            item: format!("{:?}", item),
        }
    }
}

/// Result type alias for TupleFlow operations
pub type Result<T> = std::result::Result<T, TupleFlowError>;
