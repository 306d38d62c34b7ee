//! N-Queens test fixtures.
//!
//! Queens sit in fixed columns; the row is the value a change driver moves.
//! Two queens conflict when they share a row or a diagonal.
//!
//! # Example
//!
//! ```
//! use tupleflow_test::nqueens::{calculate_conflicts, Queen};
//!
//! let queens = Queen::with_rows(&[0, 2, 1, 3]);
//! assert_eq!(calculate_conflicts(&queens), 2);
//! ```

use tupleflow_core::SimpleScore;

/// A queen in a fixed column with an optional row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Queen {
    pub id: i64,
    pub column: i64,
    pub row: Option<i64>,
}

impl Queen {
    pub fn new(id: i64, column: i64, row: Option<i64>) -> Self {
        Self { id, column, row }
    }

    /// Creates a queen with an assigned row.
    pub fn assigned(id: i64, column: i64, row: i64) -> Self {
        Self::new(id, column, Some(row))
    }

    /// Creates a queen with no row assigned.
    pub fn unassigned(id: i64, column: i64) -> Self {
        Self::new(id, column, None)
    }

    /// Queens in columns `0..n` at the given rows.
    pub fn with_rows(rows: &[i64]) -> Vec<Queen> {
        rows.iter()
            .enumerate()
            .map(|(i, &row)| Queen::assigned(i as i64, i as i64, row))
            .collect()
    }

    /// Rising diagonal index, if assigned.
    pub fn ascending_diagonal(&self) -> Option<i64> {
        self.row.map(|row| row + self.column)
    }

    /// Falling diagonal index, if assigned.
    pub fn descending_diagonal(&self) -> Option<i64> {
        self.row.map(|row| row - self.column)
    }
}

/// Counts conflicting queen pairs: one per shared row and one per shared
/// diagonal. Unassigned queens never conflict.
pub fn calculate_conflicts(queens: &[Queen]) -> i64 {
    let mut conflicts = 0;
    for (i, a) in queens.iter().enumerate() {
        for b in &queens[i + 1..] {
            if a.row.is_none() || b.row.is_none() {
                continue;
            }
            if a.row == b.row {
                conflicts += 1;
            }
            if a.ascending_diagonal() == b.ascending_diagonal() {
                conflicts += 1;
            }
            if a.descending_diagonal() == b.descending_diagonal() {
                conflicts += 1;
            }
        }
    }
    conflicts
}

/// Score a full recalculation gives: one point of penalty per conflict.
pub fn expected_score(queens: &[Queen]) -> SimpleScore {
    SimpleScore::of(-calculate_conflicts(queens))
}
