//! Conditional propagation on the presence of matching right tuples.

use std::collections::HashMap;
use std::marker::PhantomData;

use tupleflow_core::{ConsistencyError, Score, TupleFlowError};

use super::join::{JoinIndex, PairFilter};
use super::{Node, Propagation, Side, SignalKind, TupleFn};
use crate::tuple::TupleId;

#[derive(Debug, Clone, Copy)]
struct Presence {
    matches: usize,
    propagated: bool,
}

/// Forwards a left tuple while at least one right tuple matches it
/// (`if_exists`), or while none does (`if_not_exists`).
///
/// Output tuples are the left tuples themselves. Match counts are kept per
/// left tuple and adjusted as right tuples come and go, so a right change
/// only touches the left tuples sharing its key.
pub struct IfExistsNode<F, X, LK, RK> {
    should_exist: bool,
    left_key: LK,
    right_key: RK,
    pair_filter: Option<PairFilter>,
    left: X,
    right: X,
    presence: HashMap<TupleId, Presence>,
    _phantom: PhantomData<fn(&F)>,
}

impl<F, X, LK, RK> IfExistsNode<F, X, LK, RK>
where
    X: JoinIndex + Default,
    LK: Fn(&[&F]) -> X::Key + Send,
    RK: Fn(&[&F]) -> X::Key + Send,
{
    pub fn new(should_exist: bool, left_key: LK, right_key: RK) -> Self {
        Self::reading(should_exist, left_key, right_key)
    }
}

impl<F, X, LK, RK> IfExistsNode<F, X, LK, RK>
where
    X: JoinIndex + Default,
    LK: TupleFn<F, X::Key>,
    RK: TupleFn<F, X::Key>,
{
    /// Like [`IfExistsNode::new`], with keys read from the tuples
    /// themselves, so group tuples can sit on the left.
    pub fn reading(should_exist: bool, left_key: LK, right_key: RK) -> Self {
        Self {
            should_exist,
            left_key,
            right_key,
            pair_filter: None,
            left: X::default(),
            right: X::default(),
            presence: HashMap::new(),
            _phantom: PhantomData,
        }
    }

    /// Only right tuples accepted by `filter` count as matches.
    pub fn with_pair_filter(mut self, filter: PairFilter) -> Self {
        self.pair_filter = Some(filter);
        self
    }

    fn accepts<Sc: Score>(
        &self,
        left: TupleId,
        right: TupleId,
        ctx: &Propagation<'_, F, Sc>,
    ) -> Result<bool, ConsistencyError> {
        match self.pair_filter {
            Some(filter) => Ok(filter(&ctx.tuple_handles(left)?, &ctx.tuple_handles(right)?)),
            None => Ok(true),
        }
    }

    fn insert_left<Sc: Score>(
        &mut self,
        tuple: TupleId,
        key: X::Key,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        if self.presence.contains_key(&tuple) {
            return Err(ConsistencyError::duplicate("IfExistsNode::insert", tuple).into());
        }
        let mut matches = 0;
        for right in self.right.matching(&key) {
            if self.accepts(tuple, right, ctx)? {
                matches += 1;
            }
        }
        self.left.put(key, tuple)?;
        let propagated = (matches > 0) == self.should_exist;
        self.presence.insert(
            tuple,
            Presence {
                matches,
                propagated,
            },
        );
        if propagated {
            ctx.emit(SignalKind::Insert, tuple);
        }
        Ok(())
    }

    fn retract_left<Sc: Score>(
        &mut self,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        self.left.remove(tuple)?;
        let presence = self
            .presence
            .remove(&tuple)
            .ok_or_else(|| ConsistencyError::missing("IfExistsNode::retract", tuple))?;
        if presence.propagated {
            ctx.emit(SignalKind::Retract, tuple);
        }
        Ok(())
    }

    fn insert_right<Sc: Score>(
        &mut self,
        tuple: TupleId,
        key: X::Key,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let lefts = self.left.matching(&key);
        self.right.put(key, tuple)?;
        for left in lefts {
            if self.accepts(left, tuple, ctx)? {
                self.adjust(left, true, ctx)?;
            }
        }
        Ok(())
    }

    fn retract_right<Sc: Score>(
        &mut self,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let key = self.right.remove(tuple)?;
        for left in self.left.matching(&key) {
            if self.accepts(left, tuple, ctx)? {
                self.adjust(left, false, ctx)?;
            }
        }
        Ok(())
    }

    fn adjust<Sc: Score>(
        &mut self,
        left: TupleId,
        gained: bool,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let presence = self
            .presence
            .get_mut(&left)
            .ok_or_else(|| ConsistencyError::missing("IfExistsNode presence", left))?;
        presence.matches = if gained {
            presence.matches + 1
        } else {
            presence
                .matches
                .checked_sub(1)
                .ok_or_else(|| ConsistencyError::missing("IfExistsNode match", left))?
        };
        let propagate = (presence.matches > 0) == self.should_exist;
        match (presence.propagated, propagate) {
            (false, true) => ctx.emit(SignalKind::Insert, left),
            (true, false) => ctx.emit(SignalKind::Retract, left),
            _ => {}
        }
        presence.propagated = propagate;
        Ok(())
    }

    fn key_for<Sc: Score>(
        &self,
        side: Side,
        tuple: TupleId,
        ctx: &Propagation<'_, F, Sc>,
    ) -> Result<X::Key, ConsistencyError> {
        match side {
            Side::Left => self.left_key.apply(tuple, ctx),
            Side::Right => self.right_key.apply(tuple, ctx),
        }
    }
}

impl<F, Sc, X, LK, RK> Node<F, Sc> for IfExistsNode<F, X, LK, RK>
where
    Sc: Score,
    X: JoinIndex + Default,
    LK: TupleFn<F, X::Key>,
    RK: TupleFn<F, X::Key>,
{
    fn kind(&self) -> &'static str {
        if self.should_exist {
            "if_exists"
        } else {
            "if_not_exists"
        }
    }

    fn insert(
        &mut self,
        side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let key = self.key_for(side, tuple, ctx)?;
        match side {
            Side::Left => self.insert_left(tuple, key, ctx),
            Side::Right => self.insert_right(tuple, key, ctx),
        }
    }

    fn update(
        &mut self,
        side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        let key = self.key_for(side, tuple, ctx)?;
        let stored = match side {
            Side::Left => self.left.key_of(tuple),
            Side::Right => self.right.key_of(tuple),
        }
        .ok_or_else(|| ConsistencyError::missing("IfExistsNode::update", tuple))?;

        if *stored == key {
            if side == Side::Left {
                let propagated = self.presence.get(&tuple).is_some_and(|p| p.propagated);
                if propagated {
                    ctx.emit(SignalKind::Update, tuple);
                }
            }
            return Ok(());
        }
        match side {
            Side::Left => {
                self.retract_left(tuple, ctx)?;
                self.insert_left(tuple, key, ctx)
            }
            Side::Right => {
                self.retract_right(tuple, ctx)?;
                self.insert_right(tuple, key, ctx)
            }
        }
    }

    fn retract(
        &mut self,
        side: Side,
        tuple: TupleId,
        ctx: &mut Propagation<'_, F, Sc>,
    ) -> Result<(), TupleFlowError> {
        match side {
            Side::Left => self.retract_left(tuple, ctx),
            Side::Right => self.retract_right(tuple, ctx),
        }
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
        self.presence.clear();
    }
}
