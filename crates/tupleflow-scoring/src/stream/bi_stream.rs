// Constraint stream over pairs of facts.

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use tupleflow_core::{ImpactType, Score};

use super::builder::ConstraintBuilder;
use super::collector::Collector;
use super::grouped_stream::GroupedStream;
use super::{TriStream, UniStream};
use crate::index::EqualityIndex;
use crate::node::{FilterNode, GroupNode, JoinNode, NodeId, Side};
use crate::session::Network;
use crate::tuple::TupleId;

// Stream of (left, right) fact pairs produced by a join.
pub struct BiStream<F, Sc: Score> {
    network: Rc<RefCell<Network<F, Sc>>>,
    node: NodeId,
}

impl<F, Sc: Score> Clone for BiStream<F, Sc> {
    fn clone(&self) -> Self {
        Self {
            network: Rc::clone(&self.network),
            node: self.node,
        }
    }
}

impl<F, Sc: Score> Debug for BiStream<F, Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiStream").field("node", &self.node).finish()
    }
}

impl<F: 'static, Sc: Score> BiStream<F, Sc> {
    pub(crate) fn new(network: Rc<RefCell<Network<F, Sc>>>, node: NodeId) -> Self {
        Self { network, node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&F, &F) -> bool + Send + 'static,
    {
        let node = FilterNode::new(move |facts: &[&F]| predicate(facts[0], facts[1]));
        let id = self
            .network
            .borrow_mut()
            .add_node(Box::new(node), &[(self.node, Side::Left)]);
        Self::new(self.network, id)
    }

    // Extends each pair with every fact of `other` whose key equals the pair's key.
    pub fn join<K, LK, RK>(
        self,
        other: UniStream<F, Sc>,
        left_key: LK,
        right_key: RK,
    ) -> TriStream<F, Sc>
    where
        K: Eq + Hash + Clone + Debug + Send + 'static,
        LK: Fn(&F, &F) -> K + Send + 'static,
        RK: Fn(&F) -> K + Send + 'static,
    {
        let node = JoinNode::<F, EqualityIndex<K, TupleId>, _, _>::new(
            move |facts: &[&F]| left_key(facts[0], facts[1]),
            move |facts: &[&F]| right_key(facts[0]),
        );
        let id = self.network.borrow_mut().add_node(
            Box::new(node),
            &[(self.node, Side::Left), (other.node(), Side::Right)],
        );
        TriStream::new(self.network, id)
    }

    pub fn group_by<K, KF, C>(self, key_fn: KF, collector: C) -> GroupedStream<F, Sc, K, C>
    where
        K: Eq + Hash + Clone + Debug + Send + 'static,
        KF: Fn(&F, &F) -> K + Send + 'static,
        C: Collector<F> + 'static,
        C::Accumulator: 'static,
    {
        let node = GroupNode::new(move |facts: &[&F]| key_fn(facts[0], facts[1]), collector);
        let id = self
            .network
            .borrow_mut()
            .add_node(Box::new(node), &[(self.node, Side::Left)]);
        GroupedStream::new(self.network, id)
    }

    pub fn penalize(
        self,
        weight: Sc,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static> {
        self.impact(ImpactType::Penalty, weight, |_: &F, _: &F| 1)
    }

    pub fn penalize_with<W>(
        self,
        weight: Sc,
        weigher: W,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static>
    where
        W: Fn(&F, &F) -> i64 + Send + 'static,
    {
        self.impact(ImpactType::Penalty, weight, weigher)
    }

    pub fn reward(
        self,
        weight: Sc,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static> {
        self.impact(ImpactType::Reward, weight, |_: &F, _: &F| 1)
    }

    pub fn reward_with<W>(
        self,
        weight: Sc,
        weigher: W,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static>
    where
        W: Fn(&F, &F) -> i64 + Send + 'static,
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
        W: Fn(&F, &F) -> i64 + Send + 'static,
    {
        ConstraintBuilder::new(
            self.network,
            self.node,
            impact_type,
            weight,
            move |facts: &[&F]| weigher(facts[0], facts[1]),
        )
    }
}
