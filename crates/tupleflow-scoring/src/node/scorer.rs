//! Terminal node scoring each matched tuple.

use std::collections::HashMap;
use std::marker::PhantomData;

use tupleflow_core::{ConsistencyError, ConstraintRef, ImpactType, Score, TupleFlowError};

use super::{Node, Propagation, Side, TupleFn};
use crate::session::{ConstraintTotal, ConstraintWeightOverrides};
use crate::tuple::TupleId;

/// Score accumulator for one constraint.
///
/// Each match contributes `weight × sign × weigher(facts)`. The node
/// remembers the exact impact it added for every tuple and subtracts that
/// same value on retract, so the session score never drifts.
pub struct ScorerNode<F, Sc, W> {
    constraint: ConstraintRef,
    impact_type: ImpactType,
    weight: Sc,
    weigher: W,
    impacts: HashMap<TupleId, Sc>,
    total: Sc,
    _phantom: PhantomData<fn(&F)>,
}

impl<F, Sc, W> ScorerNode<F, Sc, W>
where
    Sc: Score,
    W: Fn(&[&F]) -> i64,
{
    pub fn new(constraint: ConstraintRef, impact_type: ImpactType, weight: Sc, weigher: W) -> Self {
        Self::reading(constraint, impact_type, weight, weigher)
    }
}

impl<F, Sc: Score, W> ScorerNode<F, Sc, W> {
    /// Scores with a weigher that reads the tuple itself, such as
    /// [`OnGroup`](super::OnGroup).
    pub fn reading(
        constraint: ConstraintRef,
        impact_type: ImpactType,
        weight: Sc,
        weigher: W,
    ) -> Self {
        Self {
            constraint,
            impact_type,
            weight,
            weigher,
            impacts: HashMap::new(),
            total: Sc::zero(),
            _phantom: PhantomData,
        }
    }

    fn impact_of(
        &self,
        tuple: TupleId,
        ctx: &Propagation<'_, F, Sc>,
    ) -> Result<Sc, ConsistencyError>
    where
        W: TupleFn<F, i64>,
    {
        let match_weight = self.weigher.apply(tuple, ctx)?;
        Ok(self.weight.scale(self.impact_type.sign() * match_weight))
    }
}

impl<F, Sc, W> Node<F, Sc> for ScorerNode<F, Sc, W>
where
    Sc: Score,
    W: TupleFn<F, i64>,
{
    fn kind(&self) -> &'static str {
        "scorer"
    }

    fn insert(
        &mut self,
        _side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let impact = self.impact_of(tuple, ctx)?;
        if self.impacts.insert(tuple, impact).is_some() {
            return Err(ConsistencyError::duplicate("ScorerNode::insert", tuple).into());
        }
        self.total = self.total + impact;
        ctx.add_score(impact);
        Ok(())
    }

    fn update(
        &mut self,
        _side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let impact = self.impact_of(tuple, ctx)?;
        let previous = self
            .impacts
            .get_mut(&tuple)
            .ok_or_else(|| ConsistencyError::missing("ScorerNode::update", tuple))?;
        let delta = impact - *previous;
        *previous = impact;
        self.total = self.total + delta;
        ctx.add_score(delta);
        Ok(())
    }

    fn retract(
        &mut self,
        _side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let impact = self
            .impacts
            .remove(&tuple)
            .ok_or_else(|| ConsistencyError::missing("ScorerNode::retract", tuple))?;
        self.total = self.total - impact;
        ctx.add_score(-impact);
        Ok(())
    }

    fn reset(&mut self) {
        self.impacts.clear();
        self.total = Sc::zero();
    }

    fn constraint_total(&self) -> Option<ConstraintTotal<Sc>> {
        Some(ConstraintTotal {
            constraint_ref: self.constraint.clone(),
            impact_type: self.impact_type,
            weight: self.weight,
            score: self.total,
            match_count: self.impacts.len(),
        })
    }

    fn apply_weight_overrides(&mut self, overrides: &ConstraintWeightOverrides<Sc>) {
        self.weight = overrides.get_or_default(&self.constraint.full_name(), self.weight);
    }
}
