//! Value domains for facts and range indexes.
//!
//! - [`ValueRange`]: finite and infinite ranges a planning variable draws from
//! - [`RangePoint`]: ordered points with a distance, used by range indexes

mod point;
mod value_range;


pub use point::RangePoint;
pub use value_range::{IntegerRange, ListValueRange, RealRange, ValueRange};
