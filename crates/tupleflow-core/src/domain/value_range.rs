//! Value ranges for planning variables.
//!
//! A value range is either countable (a finite, indexable set of values)
//! or uncountable (a continuous interval that can only be sampled).

use rand::Rng;

use crate::error::TupleFlowError;

/// The set of values a planning variable may take.
///
/// # Example
///
/// ```
/// use tupleflow_core::{IntegerRange, ValueRange};
///
/// let range = IntegerRange::new(0, 3).unwrap();
/// assert_eq!(range.size(), Some(3));
/// assert_eq!(range.get(2), Some(2));
/// assert!(!range.contains(&3));
/// ```
pub trait ValueRange<V> {
    /// Returns the number of values, or `None` for an uncountable range.
    fn size(&self) -> Option<usize>;

    /// Returns the value at `index` for countable ranges.
    fn get(&self, index: usize) -> Option<V>;

    /// Returns true if the value lies inside the range.
    fn contains(&self, value: &V) -> bool;

    /// Draws a uniformly distributed value, or `None` if the range is empty.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<V>;

    /// Returns true if the range enumerates its values.
    fn is_countable(&self) -> bool {
        self.size().is_some()
    }

    /// Returns true if the range holds no values.
    fn is_empty(&self) -> bool {
        self.size() == Some(0)
    }
}

/// Integers in `[from, to)` stepping by `increment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerRange {
    from: i64,
    to: i64,
    increment: i64,
}

impl IntegerRange {
    /// Creates the range `[from, to)` with increment 1.
    pub fn new(from: i64, to: i64) -> Result<Self, TupleFlowError> {
        Self::with_increment(from, to, 1)
    }

    /// Creates the range `[from, to)` stepping by `increment`.
    ///
    /// # Errors
    ///
    /// Fails with [`TupleFlowError::DomainRange`] when `from > to`, when the
    /// increment is not positive, or when the span is not a multiple of it.
    pub fn with_increment(from: i64, to: i64, increment: i64) -> Result<Self, TupleFlowError> {
        if from > to {
            return Err(TupleFlowError::DomainRange(format!(
                "integer range from ({}) is greater than to ({})",
                from, to
            )));
        }
        if increment <= 0 {
            return Err(TupleFlowError::DomainRange(format!(
                "integer range increment ({}) must be positive",
                increment
            )));
        }
        let span = i128::from(to) - i128::from(from);
        if span % i128::from(increment) != 0 {
            return Err(TupleFlowError::DomainRange(format!(
                "integer range span ({}) is not a multiple of its increment ({})",
                span, increment
            )));
        }
        Ok(Self { from, to, increment })
    }

    // Number of values; the widened span never overflows.
    fn count(&self) -> u128 {
        ((i128::from(self.to) - i128::from(self.from)) / i128::from(self.increment)) as u128
    }

    pub fn from(&self) -> i64 {
        self.from
    }

    pub fn to(&self) -> i64 {
        self.to
    }

    /// Iterates the values in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i64> {
        let increment = self.increment;
        (self.from..self.to).step_by(increment as usize)
    }
}

impl ValueRange<i64> for IntegerRange {
    /// Saturates at `usize::MAX` for spans wider than the address space.
    fn size(&self) -> Option<usize> {
        Some(usize::try_from(self.count()).unwrap_or(usize::MAX))
    }

    fn get(&self, index: usize) -> Option<i64> {
        let index = index as u128;
        if index >= self.count() {
            return None;
        }
        let offset = i128::try_from(index).ok()?.checked_mul(i128::from(self.increment))?;
        i64::try_from(i128::from(self.from) + offset).ok()
    }

    fn contains(&self, value: &i64) -> bool {
        *value >= self.from
            && *value < self.to
            && (i128::from(*value) - i128::from(self.from)) % i128::from(self.increment) == 0
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<i64> {
        let size = self.size()?;
        if size == 0 {
            return None;
        }
        self.get(rng.random_range(0..size))
    }
}

/// An explicit list of values, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ListValueRange<V> {
    values: Vec<V>,
}

impl<V> ListValueRange<V> {
    pub fn new(values: Vec<V>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }
}

impl<V: Clone + PartialEq> ValueRange<V> for ListValueRange<V> {
    fn size(&self) -> Option<usize> {
        Some(self.values.len())
    }

    fn get(&self, index: usize) -> Option<V> {
        self.values.get(index).cloned()
    }

    fn contains(&self, value: &V) -> bool {
        self.values.contains(value)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<V> {
        if self.values.is_empty() {
            return None;
        }
        self.get(rng.random_range(0..self.values.len()))
    }
}

/// Real numbers in the half-open interval `[from, to)`.
///
/// The range is uncountable: it can only be sampled. Sampling never yields
/// `to`, even when floating point rounding of `from + r * (to - from)` would.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealRange {
    from: f64,
    to: f64,
}

impl RealRange {
    /// Creates the range `[from, to)`.
    ///
    /// # Errors
    ///
    /// Fails with [`TupleFlowError::DomainRange`] for non-finite bounds or
    /// when `from > to`.
    pub fn new(from: f64, to: f64) -> Result<Self, TupleFlowError> {
        if !from.is_finite() || !to.is_finite() {
            return Err(TupleFlowError::DomainRange(format!(
                "real range bounds must be finite, got [{}, {})",
                from, to
            )));
        }
        if from > to {
            return Err(TupleFlowError::DomainRange(format!(
                "real range from ({}) is greater than to ({})",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> f64 {
        self.from
    }

    pub fn to(&self) -> f64 {
        self.to
    }

    /// Maps a unit fraction in `[0, 1)` into the range, clamped below `to`.
    pub fn at_fraction(&self, fraction: f64) -> f64 {
        let value = self.from + fraction * (self.to - self.from);
        if value >= self.to {
            next_below(self.to).max(self.from)
        } else if value < self.from {
            self.from
        } else {
            value
        }
    }
}

impl ValueRange<f64> for RealRange {
    fn size(&self) -> Option<usize> {
        None
    }

    fn get(&self, _index: usize) -> Option<f64> {
        None
    }

    fn contains(&self, value: &f64) -> bool {
        *value >= self.from && *value < self.to
    }

    fn is_empty(&self) -> bool {
        self.from == self.to
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.at_fraction(rng.random::<f64>()))
    }
}

/// Returns the largest finite `f64` strictly below `x`.
fn next_below(x: f64) -> f64 {
    if x == 0.0 {
        -f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else {
        f64::from_bits(x.to_bits() + 1)
    }
}
