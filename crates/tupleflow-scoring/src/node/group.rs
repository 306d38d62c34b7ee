//! Group node: one output tuple per group key.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tupleflow_core::{ConsistencyError, Score, TupleFlowError};

use super::{Node, Propagation, Side, SignalKind, TupleFn};
use crate::stream::collector::{Accumulator, Collector};
use crate::tuple::TupleId;

// payload of a group's output tuple
struct GroupRecord<K, A> {
    key: K,
    accumulator: A,
    size: usize,
}

/// Groups tuples by key and folds each group through a collector.
///
/// Every non-empty group is represented downstream by one tuple without
/// facts, whose payload holds the key and the accumulator. The first member
/// inserts that tuple, later changes to the group update it, and removing
/// the last member retracts it. Children read the key and the collector
/// result through [`OnGroup`].
pub struct GroupNode<F, K, KF, C>
where
    C: Collector<F>,
{
    key_fn: KF,
    collector: C,
    // group key -> output tuple
    groups: IndexMap<K, TupleId>,
    // key and value each tuple was accumulated with
    members: HashMap<TupleId, (K, C::Value)>,
    _phantom: PhantomData<fn(&F)>,
}

impl<F, K, KF, C> GroupNode<F, K, KF, C>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    KF: Fn(&[&F]) -> K,
    C: Collector<F>,
    C::Accumulator: 'static,
{
    pub fn new(key_fn: KF, collector: C) -> Self {
        Self {
            key_fn,
            collector,
            groups: IndexMap::new(),
            members: HashMap::new(),
            _phantom: PhantomData,
        }
    }

    /// Number of non-empty groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    fn add_member<Sc: Score>(
        &mut self,
        tuple: TupleId,
        key: &K,
        value: &C::Value,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), ConsistencyError> {
        let (group, kind) = match self.groups.get(key).copied() {
            Some(group) => (group, SignalKind::Update),
            None => {
                let record = GroupRecord {
                    key: key.clone(),
                    accumulator: self.collector.create_accumulator(),
                    size: 0,
                };
                let group = ctx.create_tuple_with(SmallVec::new(), Box::new(record));
                self.groups.insert(key.clone(), group);
                (group, SignalKind::Insert)
            }
        };
        let record = ctx.payload_mut::<GroupRecord<K, C::Accumulator>>(group)?;
        record.accumulator.accumulate(tuple, value)?;
        record.size += 1;
        ctx.emit(kind, group);
        Ok(())
    }

    fn remove_member<Sc: Score>(
        &mut self,
        tuple: TupleId,
        key: &K,
        value: &C::Value,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), ConsistencyError> {
        let group = *self
            .groups
            .get(key)
            .ok_or_else(|| ConsistencyError::missing("GroupNode group", key))?;
        let record = ctx.payload_mut::<GroupRecord<K, C::Accumulator>>(group)?;
        record.accumulator.retract(tuple, value)?;
        record.size -= 1;
        if record.size > 0 {
            ctx.emit(SignalKind::Update, group);
            return Ok(());
        }
        self.groups.swap_remove(key);
        ctx.kill_tuple(group)?;
        ctx.emit(SignalKind::Retract, group);
        Ok(())
    }

    fn extract<Sc: Score>(
        &self,
        tuple: TupleId,
        ctx: &Propagation<'_, F, Sc>,
    ) -> Result<(K, C::Value), ConsistencyError> {
        let facts = ctx.tuple_facts(tuple)?;
        Ok(((self.key_fn)(&facts), self.collector.extract(&facts)))
    }
}

impl<F, Sc, K, KF, C> Node<F, Sc> for GroupNode<F, K, KF, C>
where
    Sc: Score,
    K: Eq + Hash + Clone + Debug + Send + 'static,
    KF: Fn(&[&F]) -> K + Send,
    C: Collector<F>,
    C::Accumulator: 'static,
{
    fn kind(&self) -> &'static str {
        "group"
    }

    fn insert(
        &mut self,
        _side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        if self.members.contains_key(&tuple) {
            return Err(ConsistencyError::duplicate("GroupNode::insert", tuple).into());
        }
        let (key, value) = self.extract(tuple, ctx)?;
        self.add_member(tuple, &key, &value, ctx)?;
        self.members.insert(tuple, (key, value));
        Ok(())
    }

    fn update(
        &mut self,
        _side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let (key, value) = self.extract(tuple, ctx)?;
        let (old_key, old_value) = self
            .members
            .remove(&tuple)
            .ok_or_else(|| ConsistencyError::missing("GroupNode::update", tuple))?;
        if old_key == key {
            // stays in its group: swap the value without retracting the group
            let group = *self
                .groups
                .get(&key)
                .ok_or_else(|| ConsistencyError::missing("GroupNode group", &key))?;
            let record = ctx.payload_mut::<GroupRecord<K, C::Accumulator>>(group)?;
            record.accumulator.retract(tuple, &old_value)?;
            record.accumulator.accumulate(tuple, &value)?;
            ctx.emit(SignalKind::Update, group);
        } else {
            self.remove_member(tuple, &old_key, &old_value, ctx)?;
            self.add_member(tuple, &key, &value, ctx)?;
        }
        self.members.insert(tuple, (key, value));
        Ok(())
    }

    fn retract(
        &mut self,
        _side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let (key, value) = self
            .members
            .remove(&tuple)
            .ok_or_else(|| ConsistencyError::missing("GroupNode::retract", tuple))?;
        self.remove_member(tuple, &key, &value, ctx)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.groups.clear();
        self.members.clear();
    }
}

/// Reads a group tuple as `(key, collector result)`.
pub struct OnGroup<K, C, G> {
    read: G,
    _phantom: PhantomData<fn(&K, &C)>,
}

impl<K, C, G> OnGroup<K, C, G> {
    pub fn new(read: G) -> Self {
        Self {
            read,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, K, C, G> TupleFn<F, T> for OnGroup<K, C, G>
where
    K: Send + 'static,
    C: Collector<F>,
    C::Accumulator: 'static,
    G: Fn(&K, &C::Result) -> T + Send,
{
    fn apply<Sc: Score>(
        &self,
        tuple: TupleId,
        ctx: &Propagation<'_, F, Sc>,
    ) -> Result<T, ConsistencyError> {
        let record = ctx.payload::<GroupRecord<K, C::Accumulator>>(tuple)?;
        Ok((self.read)(&record.key, record.accumulator.finish()))
    }
}
