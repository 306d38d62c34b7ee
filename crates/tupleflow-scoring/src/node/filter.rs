//! Filter node: forwards tuples whose facts satisfy a predicate.

use std::collections::HashMap;
use std::marker::PhantomData;

use tupleflow_core::{ConsistencyError, Score, TupleFlowError};

use super::{Node, Propagation, Side, SignalKind, TupleFn};
use crate::tuple::TupleId;

/// Pass-through node. Output tuples are the input tuples themselves.
///
/// The node remembers whether each input passed, so an update can turn into
/// an insert or a retract downstream when the predicate flips.
pub struct FilterNode<F, P> {
    predicate: P,
    passed: HashMap<TupleId, bool>,
    _phantom: PhantomData<fn(&F)>,
}

impl<F, P> FilterNode<F, P>
where
    P: Fn(&[&F]) -> bool,
{
    pub fn new(predicate: P) -> Self {
        Self::reading(predicate)
    }
}

impl<F, P> FilterNode<F, P> {
    /// Filters with a predicate that reads the tuple itself, such as
    /// [`OnGroup`](super::OnGroup).
    pub fn reading(predicate: P) -> Self {
        Self {
            predicate,
            passed: HashMap::new(),
            _phantom: PhantomData,
        }
    }
}

impl<F, Sc, P> Node<F, Sc> for FilterNode<F, P>
where
    Sc: Score,
    P: TupleFn<F, bool>,
{
    fn kind(&self) -> &'static str {
        "filter"
    }

    fn insert(
        &mut self,
        _side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let passes = self.predicate.apply(tuple, ctx)?;
        if self.passed.insert(tuple, passes).is_some() {
            return Err(ConsistencyError::duplicate("FilterNode::insert", tuple).into());
        }
        if passes {
            ctx.emit(SignalKind::Insert, tuple);
        }
        Ok(())
    }

    fn update(
        &mut self,
        _side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let passes = self.predicate.apply(tuple, ctx)?;
        let passed = self
            .passed
            .get_mut(&tuple)
            .ok_or_else(|| ConsistencyError::missing("FilterNode::update", tuple))?;
        match (*passed, passes) {
            (true, true) => ctx.emit(SignalKind::Update, tuple),
            (true, false) => ctx.emit(SignalKind::Retract, tuple),
            (false, true) => ctx.emit(SignalKind::Insert, tuple),
            (false, false) => {}
        }
        *passed = passes;
        Ok(())
    }

    fn retract(
        &mut self,
        _side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let passed = self
            .passed
            .remove(&tuple)
            .ok_or_else(|| ConsistencyError::missing("FilterNode::retract", tuple))?;
        if passed {
            ctx.emit(SignalKind::Retract, tuple);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.passed.clear();
    }
}
