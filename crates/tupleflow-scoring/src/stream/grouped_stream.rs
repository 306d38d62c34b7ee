// Grouped constraint stream: one tuple per group key, read as
// `(key, collector result)`.

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::rc::Rc;

use tupleflow_core::{ImpactType, Score};

use super::builder::{ConstraintBuilder, GroupedConstraintBuilder};
use super::collector::Collector;
use super::UniStream;
use crate::index::EqualityIndex;
use crate::node::{FilterNode, IfExistsNode, NodeId, OnGroup, Side};
use crate::session::Network;
use crate::tuple::TupleId;

// Stream of groups produced by `group_by`.
//
// Each group flows on as its own tuple: it can be filtered on its result,
// checked against other facts, and scored like any other stream.
//
// # Example
//
// ```
// use tupleflow_core::SimpleScore;
// use tupleflow_scoring::stream::{collector::sum, ConstraintFactory};
//
// struct Task { machine: u32, load: i64 }
//
// let factory = ConstraintFactory::<Task, SimpleScore>::new();
// factory
//     .for_all()
//     .group_by(|t: &Task| t.machine, sum(|t: &Task| t.load))
//     .filter(|_, load: &i64| *load > 10)
//     .penalize_with(SimpleScore::ONE, |_, load: &i64| *load - 10)
//     .as_constraint("Machine capacity");
//
// let mut session = factory.build().unwrap();
// session.insert_fact(Task { machine: 0, load: 8 }).unwrap();
// session.insert_fact(Task { machine: 0, load: 5 }).unwrap();
// session.insert_fact(Task { machine: 1, load: 4 }).unwrap();
// assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-3));
// ```
pub struct GroupedStream<F, Sc: Score, K, C> {
    network: Rc<RefCell<Network<F, Sc>>>,
    node: NodeId,
    _phantom: PhantomData<fn() -> (K, C)>,
}

impl<F, Sc: Score, K, C> Clone for GroupedStream<F, Sc, K, C> {
    fn clone(&self) -> Self {
        Self {
            network: Rc::clone(&self.network),
            node: self.node,
            _phantom: PhantomData,
        }
    }
}

impl<F, Sc, K, C> GroupedStream<F, Sc, K, C>
where
    F: 'static,
    Sc: Score,
    K: Eq + Hash + Clone + Debug + Send + 'static,
    C: Collector<F> + 'static,
    C::Accumulator: 'static,
{
    pub(crate) fn new(network: Rc<RefCell<Network<F, Sc>>>, node: NodeId) -> Self {
        Self {
            network,
            node,
            _phantom: PhantomData,
        }
    }

    // Id of the node this stream reads from.
    pub fn node(&self) -> NodeId {
        self.node
    }

    // Keeps only groups whose key and result match the predicate.
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&K, &C::Result) -> bool + Send + 'static,
    {
        let node = FilterNode::<F, _>::reading(OnGroup::<K, C, _>::new(predicate));
        let id = self
            .network
            .borrow_mut()
            .add_node(Box::new(node), &[(self.node, Side::Left)]);
        Self::new(self.network, id)
    }

    // Keeps groups for which at least one fact of `other` has an equal key.
    pub fn if_exists<Q, GK, FK>(self, other: UniStream<F, Sc>, group_key: GK, fact_key: FK) -> Self
    where
        Q: Eq + Hash + Clone + Debug + Send + 'static,
        GK: Fn(&K, &C::Result) -> Q + Send + 'static,
        FK: Fn(&F) -> Q + Send + 'static,
    {
        self.existence(true, other, group_key, fact_key)
    }

    // Keeps groups for which no fact of `other` has an equal key.
    pub fn if_not_exists<Q, GK, FK>(
        self,
        other: UniStream<F, Sc>,
        group_key: GK,
        fact_key: FK,
    ) -> Self
    where
        Q: Eq + Hash + Clone + Debug + Send + 'static,
        GK: Fn(&K, &C::Result) -> Q + Send + 'static,
        FK: Fn(&F) -> Q + Send + 'static,
    {
        self.existence(false, other, group_key, fact_key)
    }

    fn existence<Q, GK, FK>(
        self,
        should_exist: bool,
        other: UniStream<F, Sc>,
        group_key: GK,
        fact_key: FK,
    ) -> Self
    where
        Q: Eq + Hash + Clone + Debug + Send + 'static,
        GK: Fn(&K, &C::Result) -> Q + Send + 'static,
        FK: Fn(&F) -> Q + Send + 'static,
    {
        let node = IfExistsNode::<F, EqualityIndex<Q, TupleId>, _, _>::reading(
            should_exist,
            OnGroup::<K, C, _>::new(group_key),
            move |facts: &[&F]| fact_key(facts[0]),
        );
        let id = self.network.borrow_mut().add_node(
            Box::new(node),
            &[(self.node, Side::Left), (other.node(), Side::Right)],
        );
        Self::new(self.network, id)
    }

    // Penalizes each group with the given weight.
    pub fn penalize(
        self,
        weight: Sc,
    ) -> GroupedConstraintBuilder<F, Sc, K, C, impl Fn(&K, &C::Result) -> i64 + Send + 'static> {
        self.impact(ImpactType::Penalty, weight, |_: &K, _: &C::Result| 1)
    }

    // Penalizes each group with `weight × weigher(key, result)`.
    pub fn penalize_with<W>(
        self,
        weight: Sc,
        weigher: W,
    ) -> GroupedConstraintBuilder<F, Sc, K, C, W>
    where
        W: Fn(&K, &C::Result) -> i64 + Send + 'static,
    {
        self.impact(ImpactType::Penalty, weight, weigher)
    }

    // Rewards each group with the given weight.
    pub fn reward(
        self,
        weight: Sc,
    ) -> GroupedConstraintBuilder<F, Sc, K, C, impl Fn(&K, &C::Result) -> i64 + Send + 'static> {
        self.impact(ImpactType::Reward, weight, |_: &K, _: &C::Result| 1)
    }

    // Rewards each group with `weight × weigher(key, result)`.
    pub fn reward_with<W>(
        self,
        weight: Sc,
        weigher: W,
    ) -> GroupedConstraintBuilder<F, Sc, K, C, W>
    where
        W: Fn(&K, &C::Result) -> i64 + Send + 'static,
    {
        self.impact(ImpactType::Reward, weight, weigher)
    }

    fn impact<W>(
        self,
        impact_type: ImpactType,
        weight: Sc,
        weigher: W,
    ) -> GroupedConstraintBuilder<F, Sc, K, C, W>
    where
        W: Fn(&K, &C::Result) -> i64 + Send + 'static,
    {
        ConstraintBuilder::new(
            self.network,
            self.node,
            impact_type,
            weight,
            OnGroup::new(weigher),
        )
    }
}

impl<F, Sc: Score, K, C> Debug for GroupedStream<F, Sc, K, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupedStream").field("node", &self.node).finish()
    }
}
