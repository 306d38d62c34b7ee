//! Per-constraint and per-node observations of a session.

use tupleflow_core::{ConstraintRef, ImpactType, Score};

use crate::node::{Side, SignalKind};

/// Score contribution of one constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintTotal<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub impact_type: ImpactType,
    /// Weight in effect, after overrides.
    pub weight: Sc,
    /// Sum of all match impacts.
    pub score: Sc,
    /// Matched tuples, or non-empty groups for grouped constraints.
    pub match_count: usize,
}

/// Signals received on one side of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCounts {
    pub inserts: u64,
    pub updates: u64,
    pub retracts: u64,
}

impl SignalCounts {
    pub fn total(&self) -> u64 {
        self.inserts + self.updates + self.retracts
    }
}

/// Signals a node received since the session was built or last rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStats {
    pub kind: &'static str,
    pub left: SignalCounts,
    pub right: SignalCounts,
}

impl NodeStats {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            left: SignalCounts::default(),
            right: SignalCounts::default(),
        }
    }

    pub(crate) fn record(&mut self, side: Side, kind: SignalKind) {
        let counts = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        match kind {
            SignalKind::Insert => counts.inserts += 1,
            SignalKind::Update => counts.updates += 1,
            SignalKind::Retract => counts.retracts += 1,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.left = SignalCounts::default();
        self.right = SignalCounts::default();
    }
}
