//! Two-level hard/soft score.

/// Hard and soft levels. Soft only breaks ties between equal hard levels.
///
/// ```
/// use tupleflow_core::HardSoftScore;
///
/// let infeasible = HardSoftScore::of(-1, -100);
/// let feasible = HardSoftScore::of(0, -200);
/// assert!(feasible > infeasible);
/// assert!(HardSoftScore::of(0, -50) > feasible);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardSoftScore {
    hard: i64,
    soft: i64,
}

impl HardSoftScore {
    pub const ZERO: HardSoftScore = HardSoftScore::of(0, 0);
    pub const ONE_HARD: HardSoftScore = HardSoftScore::of(1, 0);
    pub const ONE_SOFT: HardSoftScore = HardSoftScore::of(0, 1);

    #[inline]
    pub const fn of(hard: i64, soft: i64) -> Self {
        HardSoftScore { hard, soft }
    }

    #[inline]
    pub const fn of_hard(hard: i64) -> Self {
        HardSoftScore::of(hard, 0)
    }

    #[inline]
    pub const fn of_soft(soft: i64) -> Self {
        HardSoftScore::of(0, soft)
    }

    #[inline]
    pub const fn hard(&self) -> i64 {
        self.hard
    }

    #[inline]
    pub const fn soft(&self) -> i64 {
        self.soft
    }
}

score_levels!(HardSoftScore { hard: Hard, soft: Soft }, feasible: hard);
score_text!(HardSoftScore { hard => "hard", soft => "soft" });
