//! Ordered points with a measurable distance.

use std::fmt::Debug;
use std::ops::Add;

use num_traits::PrimInt;

/// A point on an ordered axis that range indexes can place values on.
///
/// The distance between two points decides whether they belong to the same
/// run of consecutive values: two neighbours are consecutive when their
/// distance does not exceed the index's maximum gap.
///
/// # Example
///
/// ```
/// use tupleflow_core::RangePoint;
///
/// assert_eq!(4i64.distance(10), 6);
/// assert_eq!(3u32.retreat(5), 0);
/// ```
pub trait RangePoint: Copy + Ord + Debug + Send + Sync + 'static {
    /// The type of the distance between two points.
    type Distance: Copy + Ord + Debug + Add<Output = Self::Distance> + Send + Sync + 'static;

    /// Returns the distance from `self` to a later point `to`.
    fn distance(self, to: Self) -> Self::Distance;

    /// Moves the point back by `by`, saturating at the axis minimum.
    fn retreat(self, by: Self::Distance) -> Self;

    /// The distance between a point and itself.
    fn zero_distance() -> Self::Distance;

    /// Sum of two distances, saturating at the largest distance.
    fn add_distance(a: Self::Distance, b: Self::Distance) -> Self::Distance;
}

impl<T> RangePoint for T
where
    T: PrimInt + Debug + Send + Sync + 'static,
{
    type Distance = T;

    #[inline]
    fn distance(self, to: Self) -> T {
        to.saturating_sub(self)
    }

    #[inline]
    fn retreat(self, by: T) -> Self {
        self.saturating_sub(by)
    }

    #[inline]
    fn zero_distance() -> T {
        T::zero()
    }

    #[inline]
    fn add_distance(a: T, b: T) -> T {
        a.saturating_add(b)
    }
}
