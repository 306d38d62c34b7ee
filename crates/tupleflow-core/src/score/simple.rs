//! Single-level score.

/// One `i64` level; feasible when not negative.
///
/// ```
/// use tupleflow_core::{ParseableScore, Score, SimpleScore};
///
/// let worse = SimpleScore::of(-5);
/// let better = SimpleScore::parse("-3").unwrap();
///
/// assert!(better > worse);
/// assert!(!worse.is_feasible());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleScore {
    score: i64,
}

impl SimpleScore {
    pub const ZERO: SimpleScore = SimpleScore::of(0);
    pub const ONE: SimpleScore = SimpleScore::of(1);

    #[inline]
    pub const fn of(score: i64) -> Self {
        SimpleScore { score }
    }

    #[inline]
    pub const fn score(&self) -> i64 {
        self.score
    }
}

score_levels!(SimpleScore { score: Soft }, feasible: score);
score_text!(SimpleScore { score => "" });
