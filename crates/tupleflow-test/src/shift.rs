//! Shift scheduling test fixtures.
//!
//! A shift covers the half-open interval `[start, end)` on `day` and may be
//! assigned to an employee.
//!
//! # Example
//!
//! ```
//! use tupleflow_test::shift::{count_overlaps, Shift};
//!
//! let shifts = vec![
//!     Shift::assigned(0, 1, 0, 8),
//!     Shift::assigned(1, 1, 6, 12),
//!     Shift::assigned(2, 2, 6, 12),
//! ];
//! assert_eq!(count_overlaps(&shifts), 1);
//! ```

/// A shift with an optional employee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shift {
    pub id: usize,
    pub employee: Option<u32>,
    pub day: i64,
    pub start: i64,
    pub end: i64,
}

impl Shift {
    /// Creates an assigned shift on day 0.
    pub fn assigned(id: usize, employee: u32, start: i64, end: i64) -> Self {
        Self {
            id,
            employee: Some(employee),
            day: 0,
            start,
            end,
        }
    }

    /// Creates an unassigned shift on day 0.
    pub fn unassigned(id: usize, start: i64, end: i64) -> Self {
        Self {
            id,
            employee: None,
            day: 0,
            start,
            end,
        }
    }

    /// Creates an assigned full-day shift.
    pub fn on_day(id: usize, employee: u32, day: i64) -> Self {
        Self {
            id,
            employee: Some(employee),
            day,
            start: day * 24,
            end: day * 24 + 8,
        }
    }
}

/// True if two half-open intervals share a point. Empty intervals overlap nothing.
pub fn intervals_overlap(a: (i64, i64), b: (i64, i64)) -> bool {
    a.0 < a.1 && b.0 < b.1 && a.0 < b.1 && b.0 < a.1
}

/// Counts unordered pairs of shifts of the same employee whose intervals overlap.
pub fn count_overlaps(shifts: &[Shift]) -> i64 {
    let mut overlaps = 0;
    for (i, a) in shifts.iter().enumerate() {
        for b in &shifts[i + 1..] {
            if a.employee.is_some()
                && a.employee == b.employee
                && intervals_overlap((a.start, a.end), (b.start, b.end))
            {
                overlaps += 1;
            }
        }
    }
    overlaps
}

/// Bounds `(first, last)` of each run of points whose neighbours are at
/// most `max_gap` apart, in ascending order. Duplicate points collapse.
pub fn consecutive_runs(points: &[i64], max_gap: i64) -> Vec<(i64, i64)> {
    let mut sorted = points.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let mut runs: Vec<(i64, i64)> = Vec::new();
    for point in sorted {
        match runs.last_mut() {
            Some(run) if point - run.1 <= max_gap => run.1 = point,
            _ => runs.push((point, point)),
        }
    }
    runs
}
