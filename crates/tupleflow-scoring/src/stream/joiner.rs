// Joiners for constraint stream joins.
//
// A joiner computes a key for each side of a join and picks the index that
// pairs keys up: equal keys through an equality index, overlapping
// half-open intervals through an interval index.
//
// # Example
//
// ```
// use tupleflow_scoring::stream::joiner::{equal, overlapping, Joiner};
//
// struct Shift { employee: usize, start: i64, end: i64 }
//
// let same_employee = equal(|s: &Shift| s.employee);
// let shift = Shift { employee: 1, start: 0, end: 8 };
// assert_eq!(same_employee.left_key(&shift), same_employee.right_key(&shift));
//
// let overlap = overlapping(
//     |s: &Shift| s.start,
//     |s: &Shift| s.end,
//     |s: &Shift| s.start,
//     |s: &Shift| s.end,
// );
// assert_eq!(overlap.left_key(&shift), (0, 8));
// ```

use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

use tupleflow_core::RangePoint;

use crate::index::EqualityIndex;
use crate::node::{IntervalIndex, JoinIndex};
use crate::tuple::TupleId;

// Matching condition between a left and a right fact.
pub trait Joiner<F>: Send + Sync + 'static {
    // Index holding the keys of one join input.
    type Index: JoinIndex + Default + 'static;

    fn left_key(&self, left: &F) -> <Self::Index as JoinIndex>::Key;

    fn right_key(&self, right: &F) -> <Self::Index as JoinIndex>::Key;
}

// Creates a joiner matching facts with equal keys, using one extractor for both sides.
pub fn equal<F, K, E>(key: E) -> EqualJoiner<E, E, K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    E: Fn(&F) -> K + Clone + Send + Sync + 'static,
{
    EqualJoiner {
        left: key.clone(),
        right: key,
        _phantom: PhantomData,
    }
}

// Creates a joiner matching facts with equal keys, using one extractor per side.
pub fn equal_bi<F, K, L, R>(left: L, right: R) -> EqualJoiner<L, R, K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    L: Fn(&F) -> K + Send + Sync + 'static,
    R: Fn(&F) -> K + Send + Sync + 'static,
{
    EqualJoiner {
        left,
        right,
        _phantom: PhantomData,
    }
}

// Joiner matching equal keys.
//
// Created by the [`equal()`] and [`equal_bi()`] functions.
pub struct EqualJoiner<L, R, K> {
    left: L,
    right: R,
    _phantom: PhantomData<fn() -> K>,
}

impl<F, K, L, R> Joiner<F> for EqualJoiner<L, R, K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    L: Fn(&F) -> K + Send + Sync + 'static,
    R: Fn(&F) -> K + Send + Sync + 'static,
{
    type Index = EqualityIndex<K, TupleId>;

    #[inline]
    fn left_key(&self, left: &F) -> K {
        (self.left)(left)
    }

    #[inline]
    fn right_key(&self, right: &F) -> K {
        (self.right)(right)
    }
}

// Creates a joiner matching facts whose half-open intervals overlap.
//
// Two intervals [start_a, end_a) and [start_b, end_b) overlap if
// start_a < end_b and start_b < end_a. Empty intervals overlap nothing, and
// an interval whose end precedes its start is rejected with a domain error
// when the fact reaches the join.
pub fn overlapping<F, P, Fsa, Fea, Fsb, Feb>(
    start_a: Fsa,
    end_a: Fea,
    start_b: Fsb,
    end_b: Feb,
) -> OverlappingJoiner<Fsa, Fea, Fsb, Feb, P>
where
    P: RangePoint,
    Fsa: Fn(&F) -> P + Send + Sync + 'static,
    Fea: Fn(&F) -> P + Send + Sync + 'static,
    Fsb: Fn(&F) -> P + Send + Sync + 'static,
    Feb: Fn(&F) -> P + Send + Sync + 'static,
{
    OverlappingJoiner {
        start_a,
        end_a,
        start_b,
        end_b,
        _phantom: PhantomData,
    }
}

// Joiner matching overlapping intervals.
//
// Created by the [`overlapping()`] function.
pub struct OverlappingJoiner<Fsa, Fea, Fsb, Feb, P> {
    start_a: Fsa,
    end_a: Fea,
    start_b: Fsb,
    end_b: Feb,
    _phantom: PhantomData<fn() -> P>,
}

impl<F, P, Fsa, Fea, Fsb, Feb> Joiner<F> for OverlappingJoiner<Fsa, Fea, Fsb, Feb, P>
where
    P: RangePoint,
    Fsa: Fn(&F) -> P + Send + Sync + 'static,
    Fea: Fn(&F) -> P + Send + Sync + 'static,
    Fsb: Fn(&F) -> P + Send + Sync + 'static,
    Feb: Fn(&F) -> P + Send + Sync + 'static,
{
    type Index = IntervalIndex<P>;

    #[inline]
    fn left_key(&self, left: &F) -> (P, P) {
        ((self.start_a)(left), (self.end_a)(left))
    }

    #[inline]
    fn right_key(&self, right: &F) -> (P, P) {
        ((self.start_b)(right), (self.end_b)(right))
    }
}
