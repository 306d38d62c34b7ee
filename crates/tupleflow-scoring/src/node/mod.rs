//! Propagation nodes.
//!
//! A session owns its nodes in topological order. Sources turn fact changes
//! into tuples; every other node receives insert/update/retract signals for
//! tuples on a [`Side`] and emits signals for its own output tuples through
//! the [`Propagation`] context. Terminal nodes fold matches into the score.

mod filter;
mod group;
mod if_exists;
mod join;
mod overlap;
mod scorer;
mod source;

#[cfg(test)]
mod tests;

pub use filter::FilterNode;
pub use group::{GroupNode, OnGroup};
pub use if_exists::IfExistsNode;
pub use join::{JoinIndex, JoinNode, PairFilter};
pub use overlap::{overlaps, IntervalIndex, OverlapJoinNode};
pub use scorer::ScorerNode;
pub use source::ForEachNode;

use std::any::Any;

use smallvec::SmallVec;
use tupleflow_core::{ConsistencyError, Score, TupleFlowError};

use crate::fact::{FactHandle, FactTable};
use crate::session::{ConstraintTotal, ConstraintWeightOverrides};
use crate::tuple::{FactHandles, Payload, TupleArena, TupleId};

/// Index of a node inside its session.
pub type NodeId = usize;

/// Input a signal arrives on. Single-input nodes only see [`Side::Left`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    #[inline]
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Kind of change carried by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Insert,
    Update,
    Retract,
}

/// A change to one tuple, emitted by a node for its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub kind: SignalKind,
    pub tuple: TupleId,
}

/// Kind of change made to a fact by the change driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactChange {
    Insert,
    Update,
    Retract,
}

/// Node's view of the session while it handles one signal.
pub struct Propagation<'a, F, Sc> {
    facts: &'a FactTable<F>,
    tuples: &'a mut TupleArena,
    score: &'a mut Sc,
    emitted: &'a mut Vec<Signal>,
}

impl<'a, F, Sc: Score> Propagation<'a, F, Sc> {
    pub(crate) fn new(
        facts: &'a FactTable<F>,
        tuples: &'a mut TupleArena,
        score: &'a mut Sc,
        emitted: &'a mut Vec<Signal>,
    ) -> Self {
        Self {
            facts,
            tuples,
            score,
            emitted,
        }
    }

    /// The fact behind a handle. Retracted facts stay readable until their
    /// change settles.
    pub fn fact(&self, handle: FactHandle) -> Result<&'a F, ConsistencyError> {
        let facts: &'a FactTable<F> = self.facts;
        facts.get(handle).ok_or_else(|| ConsistencyError::UnknownFact {
            handle: handle.to_string(),
        })
    }

    /// The facts of a tuple, left to right.
    pub fn tuple_facts(&self, tuple: TupleId) -> Result<SmallVec<[&'a F; 4]>, ConsistencyError> {
        let facts: &'a FactTable<F> = self.facts;
        self.tuples
            .facts(tuple)?
            .iter()
            .map(|handle| {
                facts.get(*handle).ok_or_else(|| ConsistencyError::UnknownFact {
                    handle: handle.to_string(),
                })
            })
            .collect()
    }

    /// The fact handles of a tuple, left to right.
    pub fn tuple_handles(&self, tuple: TupleId) -> Result<FactHandles, ConsistencyError> {
        self.tuples
            .facts(tuple)
            .map(|handles| handles.iter().copied().collect())
    }

    pub fn create_tuple(&mut self, facts: FactHandles) -> TupleId {
        self.tuples.create(facts)
    }

    /// Creates a tuple carrying data of its own instead of facts.
    pub fn create_tuple_with(&mut self, facts: FactHandles, payload: Payload) -> TupleId {
        self.tuples.create_with(facts, Some(payload))
    }

    pub fn payload<T: Any>(&self, tuple: TupleId) -> Result<&T, ConsistencyError> {
        self.tuples.payload(tuple)
    }

    pub fn payload_mut<T: Any>(&mut self, tuple: TupleId) -> Result<&mut T, ConsistencyError> {
        self.tuples.payload_mut(tuple)
    }

    /// Marks a tuple dying. It is freed once the change settles.
    pub fn kill_tuple(&mut self, tuple: TupleId) -> Result<(), ConsistencyError> {
        self.tuples.kill(tuple)
    }

    pub fn emit(&mut self, kind: SignalKind, tuple: TupleId) {
        self.emitted.push(Signal { kind, tuple });
    }

    /// Adds a delta to the session score.
    pub fn add_score(&mut self, delta: Sc) {
        *self.score = *self.score + delta;
    }
}

/// Reads a value out of a tuple for a node: a key, a predicate or a weight.
///
/// Closures over the tuple's facts implement it directly. Tuples standing
/// for a group are read through [`OnGroup`].
pub trait TupleFn<F, T>: Send {
    fn apply<Sc: Score>(
        &self,
        tuple: TupleId,
        ctx: &Propagation<'_, F, Sc>,
    ) -> Result<T, ConsistencyError>;
}

impl<F, T, G> TupleFn<F, T> for G
where
    G: Fn(&[&F]) -> T + Send,
{
    fn apply<Sc: Score>(
        &self,
        tuple: TupleId,
        ctx: &Propagation<'_, F, Sc>,
    ) -> Result<T, ConsistencyError> {
        Ok(self(&ctx.tuple_facts(tuple)?))
    }
}

/// A node of the propagation network.
///
/// Every method fails with a [`ConsistencyError`] (wrapped in
/// [`TupleFlowError`]) when asked to insert a tuple it already holds or to
/// update/retract one it never saw. Nodes never retry.
pub trait Node<F, Sc: Score>: Send {
    /// Short label used in logs.
    fn kind(&self) -> &'static str;

    /// Reacts to a fact change. Only source nodes override this.
    fn fact_changed(
        &mut self,
        _change: FactChange,
        _fact: FactHandle,
        _ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        Ok(())
    }

    fn insert(
        &mut self,
        side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError>;

    fn update(
        &mut self,
        side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError>;

    fn retract(
        &mut self,
        side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError>;

    /// Drops all state, as if no tuple was ever seen.
    fn reset(&mut self);

    /// Score contribution of a terminal node.
    fn constraint_total(&self) -> Option<ConstraintTotal<Sc>> {
        None
    }

    /// Replaces a terminal node's declared weight when overridden.
    fn apply_weight_overrides(&mut self, _overrides: &ConstraintWeightOverrides<Sc>) {}
}

pub(crate) fn no_upstream(kind: &'static str, tuple: TupleId) -> TupleFlowError {
    ConsistencyError::missing(kind, tuple).into()
}
