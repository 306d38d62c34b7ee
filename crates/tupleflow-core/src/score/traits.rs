//! The `Score` contract used by score accumulators.

use std::fmt::{Debug, Display};
use std::ops::{Add, Neg, Sub};

use super::ScoreLevel;

/// A fixed number of `i64` levels compared lexicographically.
///
/// Accumulators add an impact when a match appears and subtract the very
/// same value when it disappears, so arithmetic must be exact: no score type
/// may round.
pub trait Score:
    Copy
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + Eq
    + Ord
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// The additive identity.
    fn zero() -> Self;

    /// True when the highest-priority level is not negative.
    fn is_feasible(&self) -> bool;

    fn levels_count() -> usize;

    /// Level values, highest priority first.
    fn to_level_numbers(&self) -> Vec<i64>;

    /// Inverse of [`Score::to_level_numbers`]; `None` if the slice length
    /// is not [`Score::levels_count`].
    fn from_level_numbers(levels: &[i64]) -> Option<Self>;

    /// Multiplies every level by `factor`.
    fn scale(&self, factor: i64) -> Self;

    /// What the level at `index` stands for.
    fn level_label(index: usize) -> Option<ScoreLevel>;
}

/// A score with a textual form, used for configured constraint weights.
pub trait ParseableScore: Score {
    /// Parses the form produced by `Display`, e.g. `"-1hard/0soft"`.
    fn parse(text: &str) -> Result<Self, ScoreParseError>;
}

/// A score string that does not match its type's format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid score '{text}': {reason}")]
pub struct ScoreParseError {
    pub text: String,
    pub reason: String,
}

impl ScoreParseError {
    pub(crate) fn new(text: &str, reason: impl Into<String>) -> Self {
        Self {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

// Parses one `<number><suffix>` level of a slash-separated score.
pub(crate) fn parse_level(
    text: &str,
    part: Option<&str>,
    suffix: &str,
) -> Result<i64, ScoreParseError> {
    let part = part
        .map(str::trim)
        .ok_or_else(|| ScoreParseError::new(text, format!("missing '{suffix}' level")))?;
    let number = part.strip_suffix(suffix).ok_or_else(|| {
        ScoreParseError::new(text, format!("'{part}' does not end with '{suffix}'"))
    })?;
    number
        .parse()
        .map_err(|e| ScoreParseError::new(text, format!("'{number}': {e}")))
}
