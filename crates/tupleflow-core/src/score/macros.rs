//! Impls shared by the fixed-level score types.
//!
//! Each score type is a struct of `i64` level fields, listed highest
//! priority first.

/// Ordering, arithmetic, `Debug` and the `Score` impl.
///
/// `feasible` names the level that must not be negative.
macro_rules! score_levels {
    ($type:ident { $($field:ident: $level:ident),+ }, feasible: $feasible:ident) => {
        impl Ord for $type {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                std::cmp::Ordering::Equal $(.then(self.$field.cmp(&other.$field)))+
            }
        }

        impl PartialOrd for $type {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl std::ops::Add for $type {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                Self { $($field: self.$field + rhs.$field),+ }
            }
        }

        impl std::ops::Sub for $type {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                Self { $($field: self.$field - rhs.$field),+ }
            }
        }

        impl std::ops::Neg for $type {
            type Output = Self;

            fn neg(self) -> Self {
                Self { $($field: -self.$field),+ }
            }
        }

        impl std::fmt::Debug for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($type))
                    $(.field(&self.$field))+
                    .finish()
            }
        }

        impl $crate::score::Score for $type {
            fn zero() -> Self {
                Self { $($field: 0),+ }
            }

            fn is_feasible(&self) -> bool {
                self.$feasible >= 0
            }

            fn levels_count() -> usize {
                [$(stringify!($field)),+].len()
            }

            fn to_level_numbers(&self) -> Vec<i64> {
                vec![$(self.$field),+]
            }

            fn from_level_numbers(levels: &[i64]) -> Option<Self> {
                let mut levels = levels.iter().copied();
                let score = Self { $($field: levels.next()?),+ };
                levels.next().is_none().then_some(score)
            }

            fn scale(&self, factor: i64) -> Self {
                Self { $($field: self.$field * factor),+ }
            }

            fn level_label(index: usize) -> Option<$crate::score::ScoreLevel> {
                [$($crate::score::ScoreLevel::$level),+].get(index).copied()
            }
        }
    };
}

/// `Display` and `ParseableScore` for the `"-1hard/0soft"` form.
macro_rules! score_text {
    ($type:ident { $($field:ident => $suffix:literal),+ }) => {
        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let levels = [$(format!("{}{}", self.$field, $suffix)),+];
                f.write_str(&levels.join("/"))
            }
        }

        impl $crate::score::ParseableScore for $type {
            fn parse(text: &str) -> Result<Self, $crate::score::ScoreParseError> {
                let mut parts = text.trim().split('/');
                let score = Self {
                    $($field: $crate::score::traits::parse_level(text, parts.next(), $suffix)?),+
                };
                match parts.next() {
                    None => Ok(score),
                    Some(extra) => Err($crate::score::ScoreParseError::new(
                        text,
                        format!("unexpected level '{}'", extra),
                    )),
                }
            }
        }
    };
}
