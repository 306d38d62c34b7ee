//! Three-level hard/medium/soft score.

/// ```
/// use tupleflow_core::HardMediumSoftScore;
///
/// let a = HardMediumSoftScore::of(0, -10, -100);
/// let b = HardMediumSoftScore::of(0, -5, -200);
/// assert!(b > a);
/// assert_eq!(b.to_string(), "0hard/-5medium/-200soft");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardMediumSoftScore {
    hard: i64,
    medium: i64,
    soft: i64,
}

impl HardMediumSoftScore {
    pub const ZERO: HardMediumSoftScore = HardMediumSoftScore::of(0, 0, 0);
    pub const ONE_HARD: HardMediumSoftScore = HardMediumSoftScore::of(1, 0, 0);
    pub const ONE_MEDIUM: HardMediumSoftScore = HardMediumSoftScore::of(0, 1, 0);
    pub const ONE_SOFT: HardMediumSoftScore = HardMediumSoftScore::of(0, 0, 1);

    #[inline]
    pub const fn of(hard: i64, medium: i64, soft: i64) -> Self {
        HardMediumSoftScore { hard, medium, soft }
    }

    #[inline]
    pub const fn hard(&self) -> i64 {
        self.hard
    }

    #[inline]
    pub const fn medium(&self) -> i64 {
        self.medium
    }

    #[inline]
    pub const fn soft(&self) -> i64 {
        self.soft
    }
}

score_levels!(
    HardMediumSoftScore { hard: Hard, medium: Medium, soft: Soft },
    feasible: hard
);
score_text!(HardMediumSoftScore { hard => "hard", medium => "medium", soft => "soft" });
