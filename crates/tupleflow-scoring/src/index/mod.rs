//! Indexes used by join and group nodes.
//!
//! - [`EqualityIndex`]: key → insertion-ordered bucket of tuples
//! - [`RangeIndex`]: ordered points grouped into [`Sequence`]s separated by
//!   [`Break`]s, with range queries over the points

mod equal;
mod range;


pub use equal::EqualityIndex;
pub use range::{Break, RangeIndex, Sequence};
