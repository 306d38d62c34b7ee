//! Source node: selects facts and wraps each in a single-fact tuple.

use std::collections::HashMap;
use std::marker::PhantomData;

use smallvec::smallvec;
use tupleflow_core::{ConsistencyError, Score, TupleFlowError};

use super::{no_upstream, FactChange, Node, Propagation, Side, SignalKind};
use crate::fact::FactHandle;
use crate::tuple::TupleId;

/// Emits one tuple per fact matching the predicate.
///
/// An update re-evaluates the predicate: a fact that starts matching is
/// inserted, one that stops matching is retracted, and one that still matches
/// is forwarded as an update.
pub struct ForEachNode<F, P> {
    predicate: P,
    tuples: HashMap<FactHandle, TupleId>,
    _phantom: PhantomData<fn(&F)>,
}

impl<F, P> ForEachNode<F, P>
where
    P: Fn(&F) -> bool,
{
    pub fn new(predicate: P) -> Self {
        Self {
            predicate,
            tuples: HashMap::new(),
            _phantom: PhantomData,
        }
    }

    /// Number of facts currently selected.
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl<F, Sc, P> Node<F, Sc> for ForEachNode<F, P>
where
    Sc: Score,
    P: Fn(&F) -> bool + Send,
{
    fn kind(&self) -> &'static str {
        "for_each"
    }

    fn fact_changed(
        &mut self,
        change: FactChange,
        fact: FactHandle,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        match change {
            FactChange::Insert => {
                if !(self.predicate)(ctx.fact(fact)?) {
                    return Ok(());
                }
                if self.tuples.contains_key(&fact) {
                    return Err(ConsistencyError::duplicate("ForEachNode::insert", fact).into());
                }
                let tuple = ctx.create_tuple(smallvec![fact]);
                self.tuples.insert(fact, tuple);
                ctx.emit(SignalKind::Insert, tuple);
            }
            FactChange::Update => {
                let matches = (self.predicate)(ctx.fact(fact)?);
                match (self.tuples.get(&fact).copied(), matches) {
                    (Some(tuple), true) => ctx.emit(SignalKind::Update, tuple),
                    (Some(tuple), false) => {
                        self.tuples.remove(&fact);
                        ctx.kill_tuple(tuple)?;
                        ctx.emit(SignalKind::Retract, tuple);
                    }
                    (None, true) => {
                        let tuple = ctx.create_tuple(smallvec![fact]);
                        self.tuples.insert(fact, tuple);
                        ctx.emit(SignalKind::Insert, tuple);
                    }
                    (None, false) => {}
                }
            }
            FactChange::Retract => {
                // facts the predicate rejected were never selected
                if let Some(tuple) = self.tuples.remove(&fact) {
                    ctx.kill_tuple(tuple)?;
                    ctx.emit(SignalKind::Retract, tuple);
                }
            }
        }
        Ok(())
    }

    fn insert(
        &mut self,
        _side: Side,
        tuple: TupleId,
        _ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        Err(no_upstream("ForEachNode", tuple))
    }

    fn update(
        &mut self,
        _side: Side,
        tuple: TupleId,
        _ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        Err(no_upstream("ForEachNode", tuple))
    }

    fn retract(
        &mut self,
        _side: Side,
        tuple: TupleId,
        _ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        Err(no_upstream("ForEachNode", tuple))
    }

    fn reset(&mut self) {
        self.tuples.clear();
    }
}
