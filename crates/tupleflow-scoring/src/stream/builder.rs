// Constraint builders: the last step of a stream, naming the constraint.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use tupleflow_core::{ConstraintRef, ImpactType, Score};

use crate::node::{NodeId, OnGroup, ScorerNode, TupleFn};
use crate::session::Network;

// Builder for a constraint scoring each matched tuple.
//
// Created by `penalize`/`reward` on uni, bi, tri and grouped streams.
pub struct ConstraintBuilder<F, Sc: Score, W> {
    network: Rc<RefCell<Network<F, Sc>>>,
    input: NodeId,
    impact_type: ImpactType,
    weight: Sc,
    weigher: W,
}

impl<F, Sc, W> ConstraintBuilder<F, Sc, W>
where
    F: 'static,
    Sc: Score,
    W: TupleFn<F, i64> + 'static,
{
    pub(crate) fn new(
        network: Rc<RefCell<Network<F, Sc>>>,
        input: NodeId,
        impact_type: ImpactType,
        weight: Sc,
        weigher: W,
    ) -> Self {
        Self {
            network,
            input,
            impact_type,
            weight,
            weigher,
        }
    }

    // Finalizes the constraint under `name`, returning its scorer node.
    pub fn as_constraint(self, name: &str) -> NodeId {
        self.as_constraint_in("", name)
    }

    // Finalizes the constraint under `package/name`.
    pub fn as_constraint_in(self, package: &str, name: &str) -> NodeId {
        let constraint = ConstraintRef::new(package, name);
        let full_name = constraint.full_name();
        let node = ScorerNode::reading(constraint, self.impact_type, self.weight, self.weigher);
        self.network
            .borrow_mut()
            .add_constraint(&full_name, Box::new(node), self.input)
    }
}

impl<F, Sc: Score, W> Debug for ConstraintBuilder<F, Sc, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintBuilder")
            .field("input", &self.input)
            .field("impact_type", &self.impact_type)
            .field("weight", &self.weight)
            .finish()
    }
}

// Builder for a constraint scoring each group of a `GroupedStream`.
pub type GroupedConstraintBuilder<F, Sc, K, C, W> = ConstraintBuilder<F, Sc, OnGroup<K, C, W>>;
