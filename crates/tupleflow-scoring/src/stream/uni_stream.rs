// Constraint stream over single facts.
//
// A `UniStream` is a handle on one node of the factory's network. Every
// operation appends a node fed by that one and returns a stream on it.

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use tupleflow_core::{ImpactType, Score};

use super::builder::ConstraintBuilder;
use super::collector::Collector;
use super::grouped_stream::GroupedStream;
use super::joiner::Joiner;
use super::{distinct_facts, if_exists_node, join_node, ordered_pair, BiStream};
use crate::node::{FilterNode, GroupNode, NodeId, PairFilter, Side};
use crate::session::Network;

pub struct UniStream<F, Sc: Score> {
    network: Rc<RefCell<Network<F, Sc>>>,
    node: NodeId,
}

impl<F, Sc: Score> Clone for UniStream<F, Sc> {
    fn clone(&self) -> Self {
        Self {
            network: Rc::clone(&self.network),
            node: self.node,
        }
    }
}

impl<F, Sc: Score> Debug for UniStream<F, Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniStream").field("node", &self.node).finish()
    }
}

impl<F: 'static, Sc: Score> UniStream<F, Sc> {
    pub(crate) fn new(network: Rc<RefCell<Network<F, Sc>>>, node: NodeId) -> Self {
        Self { network, node }
    }

    // Id of the node this stream reads from.
    pub fn node(&self) -> NodeId {
        self.node
    }

    // Keeps only facts matching the predicate.
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&F) -> bool + Send + 'static,
    {
        let node = FilterNode::new(move |facts: &[&F]| predicate(facts[0]));
        let id = self
            .network
            .borrow_mut()
            .add_node(Box::new(node), &[(self.node, Side::Left)]);
        Self::new(self.network, id)
    }

    // Pairs every fact of this stream with every matching fact of `other`.
    //
    // A fact present in both streams is paired with itself when the joiner
    // matches it; use `join_unique` to rule that out.
    pub fn join<J>(self, other: UniStream<F, Sc>, joiner: J) -> BiStream<F, Sc>
    where
        J: Joiner<F>,
    {
        self.join_with_filter(other.node, joiner, None)
    }

    // Pairs matching facts of this stream with each other.
    //
    // Each unordered pair appears once, with the lower fact handle on the
    // left. A fact is never paired with itself.
    pub fn join_unique<J>(self, joiner: J) -> BiStream<F, Sc>
    where
        J: Joiner<F>,
    {
        let node = self.node;
        self.join_with_filter(node, joiner, Some(ordered_pair))
    }

    // Like `join`, keeping only pairs whose left fact handle is lower than the right one.
    pub fn join_unique_with<J>(self, other: UniStream<F, Sc>, joiner: J) -> BiStream<F, Sc>
    where
        J: Joiner<F>,
    {
        self.join_with_filter(other.node, joiner, Some(ordered_pair))
    }

    fn join_with_filter<J>(
        self,
        right: NodeId,
        joiner: J,
        filter: Option<PairFilter>,
    ) -> BiStream<F, Sc>
    where
        J: Joiner<F>,
    {
        let id = self.network.borrow_mut().add_node(
            join_node(joiner, filter),
            &[(self.node, Side::Left), (right, Side::Right)],
        );
        BiStream::new(self.network, id)
    }

    // Keeps facts for which at least one fact of `other` matches.
    pub fn if_exists<J>(self, other: UniStream<F, Sc>, joiner: J) -> Self
    where
        J: Joiner<F>,
    {
        self.existence(true, other.node, joiner, None)
    }

    // Keeps facts for which no fact of `other` matches.
    pub fn if_not_exists<J>(self, other: UniStream<F, Sc>, joiner: J) -> Self
    where
        J: Joiner<F>,
    {
        self.existence(false, other.node, joiner, None)
    }

    // Keeps facts for which another fact of `other` matches. A fact never matches itself.
    pub fn if_exists_other<J>(self, other: UniStream<F, Sc>, joiner: J) -> Self
    where
        J: Joiner<F>,
    {
        self.existence(true, other.node, joiner, Some(distinct_facts))
    }

    // Keeps facts for which no other fact of `other` matches.
    pub fn if_not_exists_other<J>(self, other: UniStream<F, Sc>, joiner: J) -> Self
    where
        J: Joiner<F>,
    {
        self.existence(false, other.node, joiner, Some(distinct_facts))
    }

    fn existence<J>(
        self,
        should_exist: bool,
        right: NodeId,
        joiner: J,
        filter: Option<PairFilter>,
    ) -> Self
    where
        J: Joiner<F>,
    {
        let id = self.network.borrow_mut().add_node(
            if_exists_node(should_exist, joiner, filter),
            &[(self.node, Side::Left), (right, Side::Right)],
        );
        Self::new(self.network, id)
    }

    // Groups facts by key and folds each group through the collector.
    //
    // The result is a stream with one tuple per non-empty group.
    pub fn group_by<K, KF, C>(self, key_fn: KF, collector: C) -> GroupedStream<F, Sc, K, C>
    where
        K: Eq + Hash + Clone + Debug + Send + 'static,
        KF: Fn(&F) -> K + Send + 'static,
        C: Collector<F> + 'static,
        C::Accumulator: 'static,
    {
        let node = GroupNode::new(move |facts: &[&F]| key_fn(facts[0]), collector);
        let id = self
            .network
            .borrow_mut()
            .add_node(Box::new(node), &[(self.node, Side::Left)]);
        GroupedStream::new(self.network, id)
    }

    // Penalizes each fact with the given weight.
    pub fn penalize(
        self,
        weight: Sc,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static> {
        self.impact(ImpactType::Penalty, weight, |_: &F| 1)
    }

    // Penalizes each fact with `weight × weigher(fact)`.
    pub fn penalize_with<W>(
        self,
        weight: Sc,
        weigher: W,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static>
    where
        W: Fn(&F) -> i64 + Send + 'static,
    {
        self.impact(ImpactType::Penalty, weight, weigher)
    }

    // Rewards each fact with the given weight.
    pub fn reward(
        self,
        weight: Sc,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static> {
        self.impact(ImpactType::Reward, weight, |_: &F| 1)
    }

    // Rewards each fact with `weight × weigher(fact)`.
    pub fn reward_with<W>(
        self,
        weight: Sc,
        weigher: W,
    ) -> ConstraintBuilder<F, Sc, impl Fn(&[&F]) -> i64 + Send + 'static>
    where
        W: Fn(&F) -> i64 + Send + 'static,
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
        W: Fn(&F) -> i64 + Send + 'static,
    {
        ConstraintBuilder::new(
            self.network,
            self.node,
            impact_type,
            weight,
            move |facts: &[&F]| weigher(facts[0]),
        )
    }
}
