// Constraint stream over fact triples.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use tupleflow_core::{ImpactType, Score};

use super::builder::ConstraintBuilder;
use crate::node::{FilterNode, NodeId, Side};
use crate::session::Network;

pub struct TriStream<F, Sc: Score> {
    network: Rc<RefCell<Network<F, Sc>>>,
    node: NodeId,
}

impl<F, Sc: Score> Clone for TriStream<F, Sc> {
    fn clone(&self) -> Self {
        Self {
            network: Rc::clone(&self.network),
            node: self.node,
        }
    }
}

impl<F, Sc: Score> Debug for TriStream<F, Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriStream").field("node", &self.node).finish()
    }
}

impl<F: 'static, Sc: Score> TriStream<F, Sc> {
    pub(crate) fn new(network: Rc<RefCell<Network<F, Sc>>>, node: NodeId) -> Self {
        Self { network, node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&F, &F, &F) -> bool + Send + 'static,
    {
        let node = FilterNode::new(move |facts: &[&F]| predicate(facts[0], facts[1], facts[2]));
        let id = self
            .network
            .borrow_mut()
            .add_node(Box::new(node), &[(self.node, Side::Left)]);
        Self::new(self.network, id)
    }

    pub fn penalize(
        self,
        weight: Sc,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static> {
        self.impact(ImpactType::Penalty, weight, |_: &F, _: &F, _: &F| 1)
    }

    pub fn penalize_with<W>(
        self,
        weight: Sc,
        weigher: W,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static>
    where
        W: Fn(&F, &F, &F) -> i64 + Send + 'static,
    {
        self.impact(ImpactType::Penalty, weight, weigher)
    }

    pub fn reward(
        self,
        weight: Sc,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static> {
        self.impact(ImpactType::Reward, weight, |_: &F, _: &F, _: &F| 1)
    }

    pub fn reward_with<W>(
        self,
        weight: Sc,
        weigher: W,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static>
    where
        W: Fn(&F, &F, &F) -> i64 + Send + 'static,
    {
        self.impact(ImpactType::Reward, weight, weigher)
    }

    fn impact<W>(
        self,
        impact_type: ImpactType,
        weight: Sc,
        weigher: W,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static>
    where
        W: Fn(&F, &F, &F) -> i64 + Send + 'static,
    {
        ConstraintBuilder::new(
            self.network,
            self.node,
            impact_type,
            weight,
            move |facts: &[&F]| weigher(facts[0], facts[1], facts[2]),
        )
    }
}
