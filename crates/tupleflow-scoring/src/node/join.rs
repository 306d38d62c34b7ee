//! Two-input join node.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

use tupleflow_core::{ConsistencyError, Score, TupleFlowError};

use super::{Node, Propagation, Side, SignalKind};
use crate::fact::FactHandle;
use crate::index::EqualityIndex;
use crate::tuple::{StoreHandle, TupleId, TupleStore};

/// Extra condition on the fact handles of a candidate (left, right) pair.
pub type PairFilter = fn(&[FactHandle], &[FactHandle]) -> bool;

/// Index over one input of a two-input node.
///
/// Each tuple is stored under the key it had when inserted. `matching`
/// answers which stored tuples pair with a key computed on the other input.
pub trait JoinIndex: Send {
    type Key: Clone + PartialEq + Debug + Send;

    fn put(&mut self, key: Self::Key, tuple: TupleId) -> Result<(), TupleFlowError>;

    /// Removes a tuple, returning its stored key.
    fn remove(&mut self, tuple: TupleId) -> Result<Self::Key, ConsistencyError>;

    fn key_of(&self, tuple: TupleId) -> Option<&Self::Key>;

    /// Stored tuples matching `key`, in a deterministic order.
    fn matching(&self, key: &Self::Key) -> Vec<TupleId>;

    fn clear(&mut self);
}

impl<K> JoinIndex for EqualityIndex<K, TupleId>
where
    K: Eq + Hash + Clone + Debug + Send,
{
    type Key = K;

    fn put(&mut self, key: K, tuple: TupleId) -> Result<(), TupleFlowError> {
        EqualityIndex::put(self, key, tuple).map_err(Into::into)
    }

    fn remove(&mut self, tuple: TupleId) -> Result<K, ConsistencyError> {
        EqualityIndex::remove(self, tuple)
    }

    fn key_of(&self, tuple: TupleId) -> Option<&K> {
        EqualityIndex::key_of(self, tuple)
    }

    fn matching(&self, key: &K) -> Vec<TupleId> {
        self.get(key).iter().copied().collect()
    }

    fn clear(&mut self) {
        EqualityIndex::clear(self)
    }
}

/// Per-input state of a join node.
struct JoinSide<X> {
    index: X,
    // out-tuples each input tuple takes part in
    outs: HashMap<TupleId, TupleStore<TupleId>>,
}

impl<X: JoinIndex + Default> JoinSide<X> {
    fn new() -> Self {
        Self {
            index: X::default(),
            outs: HashMap::new(),
        }
    }

    fn outs_mut(&mut self, tuple: TupleId) -> Result<&mut TupleStore<TupleId>, ConsistencyError> {
        self.outs
            .get_mut(&tuple)
            .ok_or_else(|| ConsistencyError::missing("JoinNode out-store", tuple))
    }
}

struct OutRecord {
    parents: [TupleId; 2],
    entries: [StoreHandle; 2],
}

/// Joins left and right tuples whose keys match.
///
/// With an [`EqualityIndex`] the keys must be equal; with an
/// [`IntervalIndex`](super::IntervalIndex) the intervals must overlap.
/// Each input tuple is indexed under the key it had when inserted. An out
/// tuple concatenates the left facts then the right facts, and is recorded
/// in both parents' stores; retracting either parent unlinks the other entry
/// through the handle kept on the out record.
///
/// An update whose key is unchanged forwards an update for every out tuple
/// of that parent. A changed key is a retract followed by an insert.
pub struct JoinNode<F, X, LK, RK> {
    left_key: LK,
    right_key: RK,
    pair_filter: Option<PairFilter>,
    sides: [JoinSide<X>; 2],
    records: HashMap<TupleId, OutRecord>,
    _phantom: PhantomData<fn(&F)>,
}

impl<F, X, LK, RK> JoinNode<F, X, LK, RK>
where
    X: JoinIndex + Default,
    LK: Fn(&[&F]) -> X::Key,
    RK: Fn(&[&F]) -> X::Key,
{
    pub fn new(left_key: LK, right_key: RK) -> Self {
        Self {
            left_key,
            right_key,
            pair_filter: None,
            sides: [JoinSide::new(), JoinSide::new()],
            records: HashMap::new(),
            _phantom: PhantomData,
        }
    }

    /// Restricts matches to pairs accepted by `filter`.
    pub fn with_pair_filter(mut self, filter: PairFilter) -> Self {
        self.pair_filter = Some(filter);
        self
    }

    /// Number of live out tuples.
    pub fn out_count(&self) -> usize {
        self.records.len()
    }

    fn key_for<Sc: Score>(
        &self,
        side: Side,
        tuple: TupleId,
        ctx: &Propagation<'_, F, Sc>,
    ) -> Result<X::Key, ConsistencyError> {
        let facts = ctx.tuple_facts(tuple)?;
        Ok(match side {
            Side::Left => (self.left_key)(&facts),
            Side::Right => (self.right_key)(&facts),
        })
    }

    fn split(&mut self, side: Side) -> (&mut JoinSide<X>, &mut JoinSide<X>) {
        let [left, right] = &mut self.sides;
        match side {
            Side::Left => (left, right),
            Side::Right => (right, left),
        }
    }

    fn insert_keyed<Sc: Score>(
        &mut self,
        side: Side,
        tuple: TupleId,
        key: X::Key,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let (own, other) = self.split(side);
        if own.outs.contains_key(&tuple) {
            return Err(ConsistencyError::duplicate("JoinNode::insert", tuple).into());
        }
        own.index.put(key.clone(), tuple)?;
        own.outs.insert(tuple, TupleStore::new());
        let partners = other.index.matching(&key);
        for partner in partners {
            let (left, right) = match side {
                Side::Left => (tuple, partner),
                Side::Right => (partner, tuple),
            };
            self.create_out(left, right, ctx)?;
        }
        Ok(())
    }

    fn create_out<Sc: Score>(
        &mut self,
        left: TupleId,
        right: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let mut facts = ctx.tuple_handles(left)?;
        let right_facts = ctx.tuple_handles(right)?;
        if let Some(filter) = self.pair_filter {
            if !filter(&facts, &right_facts) {
                return Ok(());
            }
        }
        facts.extend_from_slice(&right_facts);
        let out = ctx.create_tuple(facts);
        let left_entry = self.sides[0].outs_mut(left)?.add(out);
        let right_entry = self.sides[1].outs_mut(right)?.add(out);
        let record = OutRecord {
            parents: [left, right],
            entries: [left_entry, right_entry],
        };
        if self.records.insert(out, record).is_some() {
            return Err(ConsistencyError::HandleInUse {
                context: "JoinNode::create_out",
                item: format!("{:?}", out),
            }
            .into());
        }
        ctx.emit(SignalKind::Insert, out);
        Ok(())
    }

    fn retract_side<Sc: Score>(
        &mut self,
        side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let (own, _) = self.split(side);
        own.index.remove(tuple)?;
        let mut store = own
            .outs
            .remove(&tuple)
            .ok_or_else(|| ConsistencyError::missing("JoinNode::retract", tuple))?;
        let other = side.other().index();
        for out in store.drain() {
            let record = self
                .records
                .remove(&out)
                .ok_or_else(|| ConsistencyError::missing("JoinNode out record", out))?;
            self.sides[other]
                .outs_mut(record.parents[other])?
                .remove(record.entries[other])?;
            ctx.kill_tuple(out)?;
            ctx.emit(SignalKind::Retract, out);
        }
        Ok(())
    }
}

impl<F, Sc, X, LK, RK> Node<F, Sc> for JoinNode<F, X, LK, RK>
where
    Sc: Score,
    X: JoinIndex + Default,
    LK: Fn(&[&F]) -> X::Key + Send,
    RK: Fn(&[&F]) -> X::Key + Send,
{
    fn kind(&self) -> &'static str {
        "join"
    }

    fn insert(
        &mut self,
        side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let key = self.key_for(side, tuple, ctx)?;
        self.insert_keyed(side, tuple, key, ctx)
    }

    fn update(
        &mut self,
        side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let key = self.key_for(side, tuple, ctx)?;
        let own = &self.sides[side.index()];
        let stored = own
            .index
            .key_of(tuple)
            .ok_or_else(|| ConsistencyError::missing("JoinNode::update", tuple))?;
        if *stored == key {
            let outs = own
                .outs
                .get(&tuple)
                .ok_or_else(|| ConsistencyError::missing("JoinNode::update", tuple))?;
            for out in outs.iter() {
                ctx.emit(SignalKind::Update, *out);
            }
            return Ok(());
        }
        self.retract_side(side, tuple, ctx)?;
        self.insert_keyed(side, tuple, key, ctx)
    }

    fn retract(
        &mut self,
        side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        self.retract_side(side, tuple, ctx)
    }

    fn reset(&mut self) {
        for side in &mut self.sides {
            side.index.clear();
            side.outs.clear();
        }
        self.records.clear();
    }
}
