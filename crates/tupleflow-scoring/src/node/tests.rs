//! Tests for propagation nodes, driven one signal at a time.

use tupleflow_core::{ConstraintRef, ImpactType, SimpleScore, TupleFlowError};

use super::*;
use crate::index::EqualityIndex;
use crate::stream::collector::{count, sum, CountCollector};

/// Facts, tuples and score a node sees, without a session around them.
struct Harness<F> {
    facts: FactTable<F>,
    tuples: TupleArena,
    score: SimpleScore,
    emitted: Vec<Signal>,
}

impl<F> Harness<F> {
    fn new() -> Self {
        Self {
            facts: FactTable::new(),
            tuples: TupleArena::new(),
            score: SimpleScore::of(0),
            emitted: Vec::new(),
        }
    }

    fn tuple(&mut self, fact: F) -> TupleId {
        let handle = self.facts.insert(fact);
        self.tuples.create(smallvec::smallvec![handle])
    }

    fn set(&mut self, tuple: TupleId, fact: F) {
        let handle = self.tuples.facts(tuple).unwrap()[0];
        *self.facts.get_mut(handle).unwrap() = fact;
    }

    fn facts_of(&self, tuple: TupleId) -> Vec<&F> {
        self.tuples
            .facts(tuple)
            .unwrap()
            .iter()
            .map(|handle| self.facts.get(*handle).unwrap())
            .collect()
    }

    fn send<N: Node<F, SimpleScore>>(
        &mut self,
        node: &mut N,
        kind: SignalKind,
        side: Side,
        tuple: TupleId,
    ) -> Result<Vec<Signal>, TupleFlowError> {
        {
            let mut ctx = Propagation::new(
                &self.facts,
                &mut self.tuples,
                &mut self.score,
                &mut self.emitted,
            );
            match kind {
                SignalKind::Insert => node.insert(side, tuple, &mut ctx)?,
                SignalKind::Update => node.update(side, tuple, &mut ctx)?,
                SignalKind::Retract => node.retract(side, tuple, &mut ctx)?,
            }
        }
        Ok(self.emitted.drain(..).collect())
    }
}

fn kinds(signals: &[Signal]) -> Vec<SignalKind> {
    signals.iter().map(|signal| signal.kind).collect()
}

fn key_join() -> JoinNode<
    (char, i64),
    EqualityIndex<i64, TupleId>,
    impl Fn(&[&(char, i64)]) -> i64,
    impl Fn(&[&(char, i64)]) -> i64,
> {
    JoinNode::new(
        |facts: &[&(char, i64)]| facts[0].1,
        |facts: &[&(char, i64)]| facts[0].1,
    )
}

mod join {
    use super::*;

    #[test]
    fn test_matching_keys_create_one_out_tuple() {
        let mut h = Harness::new();
        let mut node = key_join();
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 1));
        let c = h.tuple(('c', 2));

        assert!(h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap().is_empty());
        let out = h.send(&mut node, SignalKind::Insert, Side::Right, b).unwrap();
        assert_eq!(kinds(&out), vec![SignalKind::Insert]);
        assert!(h.send(&mut node, SignalKind::Insert, Side::Right, c).unwrap().is_empty());
        assert_eq!(node.out_count(), 1);

        let names: Vec<char> = h.facts_of(out[0].tuple).iter().map(|f| f.0).collect();
        assert_eq!(names, vec!['a', 'b']);
    }

    #[test]
    fn test_retracting_a_parent_retracts_its_out_tuples() {
        let mut h = Harness::new();
        let mut node = key_join();
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 1));
        let c = h.tuple(('c', 1));
        h.send(&mut node, SignalKind::Insert, Side::Right, b).unwrap();
        h.send(&mut node, SignalKind::Insert, Side::Right, c).unwrap();
        h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap();
        assert_eq!(node.out_count(), 2);

        let retracted = h.send(&mut node, SignalKind::Retract, Side::Left, a).unwrap();
        assert_eq!(kinds(&retracted), vec![SignalKind::Retract, SignalKind::Retract]);
        assert_eq!(node.out_count(), 0);
        assert_eq!(h.tuples.pending_release(), 2);
    }

    #[test]
    fn test_right_retract_unlinks_left_entry() {
        let mut h = Harness::new();
        let mut node = key_join();
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 1));
        h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap();
        h.send(&mut node, SignalKind::Insert, Side::Right, b).unwrap();

        let retracted = h.send(&mut node, SignalKind::Retract, Side::Right, b).unwrap();
        assert_eq!(kinds(&retracted), vec![SignalKind::Retract]);
        // the left parent no longer lists the out tuple
        assert!(h.send(&mut node, SignalKind::Retract, Side::Left, a).unwrap().is_empty());
    }

    #[test]
    fn test_update_with_unchanged_key_forwards_updates() {
        let mut h = Harness::new();
        let mut node = key_join();
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 1));
        h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap();
        let inserted = h.send(&mut node, SignalKind::Insert, Side::Right, b).unwrap();

        h.set(a, ('x', 1));
        let updated = h.send(&mut node, SignalKind::Update, Side::Left, a).unwrap();
        assert_eq!(updated, vec![Signal { kind: SignalKind::Update, tuple: inserted[0].tuple }]);
    }

    #[test]
    fn test_update_with_changed_key_is_retract_then_insert() {
        let mut h = Harness::new();
        let mut node = key_join();
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 1));
        let c = h.tuple(('c', 2));
        h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap();
        h.send(&mut node, SignalKind::Insert, Side::Right, b).unwrap();
        h.send(&mut node, SignalKind::Insert, Side::Right, c).unwrap();

        h.set(a, ('a', 2));
        let signals = h.send(&mut node, SignalKind::Update, Side::Left, a).unwrap();
        assert_eq!(kinds(&signals), vec![SignalKind::Retract, SignalKind::Insert]);
        let names: Vec<char> = h.facts_of(signals[1].tuple).iter().map(|f| f.0).collect();
        assert_eq!(names, vec!['a', 'c']);
        assert_eq!(node.out_count(), 1);
    }

    #[test]
    fn test_pair_filter_rejects_self_pairs() {
        let mut h = Harness::new();
        let mut node = key_join().with_pair_filter(|l, r| l[0] < r[0]);
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 1));
        for t in [a, b] {
            h.send(&mut node, SignalKind::Insert, Side::Left, t).unwrap();
            h.send(&mut node, SignalKind::Insert, Side::Right, t).unwrap();
        }
        assert_eq!(node.out_count(), 1);
    }

    #[test]
    fn test_consistency_violations() {
        let mut h = Harness::new();
        let mut node = key_join();
        let a = h.tuple(('a', 1));
        h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap();

        let err = h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap_err();
        assert!(matches!(
            err,
            TupleFlowError::Consistency(ConsistencyError::DuplicateInsert { .. })
        ));

        let err = h.send(&mut node, SignalKind::Retract, Side::Right, a).unwrap_err();
        assert!(matches!(
            err,
            TupleFlowError::Consistency(ConsistencyError::MissingOnRetract { .. })
        ));
    }

    #[test]
    fn test_reset_forgets_everything() {
        let mut h = Harness::new();
        let mut node = key_join();
        let a = h.tuple(('a', 1));
        h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap();
        Node::<(char, i64), SimpleScore>::reset(&mut node);
        assert_eq!(node.out_count(), 0);
        assert!(h.send(&mut node, SignalKind::Insert, Side::Left, a).is_ok());
    }
}

mod overlap {
    use super::*;

    type Interval = (i64, i64);

    fn interval_join() -> OverlapJoinNode<
        Interval,
        i64,
        impl Fn(&[&Interval]) -> (i64, i64),
        impl Fn(&[&Interval]) -> (i64, i64),
    > {
        JoinNode::new(|facts: &[&Interval]| *facts[0], |facts: &[&Interval]| *facts[0])
    }

    #[test]
    fn test_overlaps_is_half_open() {
        assert!(overlaps(&(0, 10), &(5, 15)));
        assert!(!overlaps(&(0, 10), &(10, 20)));
        assert!(!overlaps(&(3, 3), &(0, 10)));
        assert!(overlaps(&(0, 100), &(40, 41)));
    }

    #[test]
    fn test_overlapping_intervals_join() {
        let mut h = Harness::new();
        let mut node = interval_join();
        let long = h.tuple((0, 100));
        let touching = h.tuple((100, 110));
        let inside = h.tuple((40, 41));
        let late = h.tuple((95, 120));
        h.send(&mut node, SignalKind::Insert, Side::Left, long).unwrap();
        h.send(&mut node, SignalKind::Insert, Side::Left, touching).unwrap();

        let out = h.send(&mut node, SignalKind::Insert, Side::Right, inside).unwrap();
        assert_eq!(out.len(), 1);
        let out = h.send(&mut node, SignalKind::Insert, Side::Right, late).unwrap();
        // overlaps both [0, 100) and [100, 110)
        assert_eq!(out.len(), 2);
        assert_eq!(node.out_count(), 3);
    }

    #[test]
    fn test_empty_interval_matches_nothing() {
        let mut h = Harness::new();
        let mut node = interval_join();
        let wide = h.tuple((0, 10));
        let empty = h.tuple((5, 5));
        h.send(&mut node, SignalKind::Insert, Side::Left, wide).unwrap();
        assert!(h.send(&mut node, SignalKind::Insert, Side::Right, empty).unwrap().is_empty());
    }

    #[test]
    fn test_inverted_interval_is_a_domain_error() {
        let mut h = Harness::new();
        let mut node = interval_join();
        let inverted = h.tuple((10, 2));
        let err = h.send(&mut node, SignalKind::Insert, Side::Left, inverted).unwrap_err();
        assert!(matches!(err, TupleFlowError::DomainRange(_)));
    }

    #[test]
    fn test_moving_an_interval_rematches() {
        let mut h = Harness::new();
        let mut node = interval_join();
        let fixed = h.tuple((0, 10));
        let moving = h.tuple((20, 30));
        h.send(&mut node, SignalKind::Insert, Side::Left, fixed).unwrap();
        assert!(h.send(&mut node, SignalKind::Insert, Side::Right, moving).unwrap().is_empty());

        h.set(moving, (5, 15));
        let signals = h.send(&mut node, SignalKind::Update, Side::Right, moving).unwrap();
        assert_eq!(kinds(&signals), vec![SignalKind::Insert]);
        assert_eq!(node.out_count(), 1);
    }
}

mod if_exists {
    use super::*;

    fn existence(
        should_exist: bool,
    ) -> IfExistsNode<
        (char, i64),
        EqualityIndex<i64, TupleId>,
        impl Fn(&[&(char, i64)]) -> i64,
        impl Fn(&[&(char, i64)]) -> i64,
    > {
        IfExistsNode::new(
            should_exist,
            |facts: &[&(char, i64)]| facts[0].1,
            |facts: &[&(char, i64)]| facts[0].1,
        )
    }

    #[test]
    fn test_if_exists_follows_match_count() {
        let mut h = Harness::new();
        let mut node = existence(true);
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 1));
        let c = h.tuple(('c', 1));

        assert!(h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap().is_empty());
        assert_eq!(
            h.send(&mut node, SignalKind::Insert, Side::Right, b).unwrap(),
            vec![Signal { kind: SignalKind::Insert, tuple: a }]
        );
        assert!(h.send(&mut node, SignalKind::Insert, Side::Right, c).unwrap().is_empty());
        assert!(h.send(&mut node, SignalKind::Retract, Side::Right, b).unwrap().is_empty());
        assert_eq!(
            h.send(&mut node, SignalKind::Retract, Side::Right, c).unwrap(),
            vec![Signal { kind: SignalKind::Retract, tuple: a }]
        );
    }

    #[test]
    fn test_if_not_exists_is_the_complement() {
        let mut h = Harness::new();
        let mut node = existence(false);
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 1));

        assert_eq!(
            kinds(&h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap()),
            vec![SignalKind::Insert]
        );
        assert_eq!(
            kinds(&h.send(&mut node, SignalKind::Insert, Side::Right, b).unwrap()),
            vec![SignalKind::Retract]
        );
        assert_eq!(Node::<(char, i64), SimpleScore>::kind(&node), "if_not_exists");
    }

    #[test]
    fn test_left_key_change_recounts() {
        let mut h = Harness::new();
        let mut node = existence(true);
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 2));
        h.send(&mut node, SignalKind::Insert, Side::Right, b).unwrap();
        assert!(h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap().is_empty());

        h.set(a, ('a', 2));
        assert_eq!(
            kinds(&h.send(&mut node, SignalKind::Update, Side::Left, a).unwrap()),
            vec![SignalKind::Insert]
        );
        h.set(a, ('z', 2));
        assert_eq!(
            kinds(&h.send(&mut node, SignalKind::Update, Side::Left, a).unwrap()),
            vec![SignalKind::Update]
        );
    }

    #[test]
    fn test_right_key_change_moves_the_match() {
        let mut h = Harness::new();
        let mut node = existence(true);
        let a = h.tuple(('a', 1));
        let d = h.tuple(('d', 3));
        let b = h.tuple(('b', 1));
        h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap();
        h.send(&mut node, SignalKind::Insert, Side::Left, d).unwrap();
        h.send(&mut node, SignalKind::Insert, Side::Right, b).unwrap();

        h.set(b, ('b', 3));
        let signals = h.send(&mut node, SignalKind::Update, Side::Right, b).unwrap();
        assert_eq!(
            signals,
            vec![
                Signal { kind: SignalKind::Retract, tuple: a },
                Signal { kind: SignalKind::Insert, tuple: d },
            ]
        );
    }
}

mod filter {
    use super::*;

    #[test]
    fn test_update_flips_between_insert_and_retract() {
        let mut h = Harness::new();
        let mut node = FilterNode::new(|facts: &[&i64]| *facts[0] > 0);
        let t = h.tuple(-1);

        assert!(h.send(&mut node, SignalKind::Insert, Side::Left, t).unwrap().is_empty());
        h.set(t, 5);
        let out = h.send(&mut node, SignalKind::Update, Side::Left, t).unwrap();
        assert_eq!(kinds(&out), vec![SignalKind::Insert]);
        h.set(t, 6);
        let out = h.send(&mut node, SignalKind::Update, Side::Left, t).unwrap();
        assert_eq!(kinds(&out), vec![SignalKind::Update]);
        h.set(t, 0);
        let out = h.send(&mut node, SignalKind::Update, Side::Left, t).unwrap();
        assert_eq!(kinds(&out), vec![SignalKind::Retract]);
        assert!(h.send(&mut node, SignalKind::Retract, Side::Left, t).unwrap().is_empty());
    }
}

mod scorer {
    use super::*;

    #[test]
    fn test_impacts_are_remembered_per_tuple() {
        let mut h = Harness::new();
        let mut node = ScorerNode::new(
            ConstraintRef::new("", "Big values"),
            ImpactType::Penalty,
            SimpleScore::of(2),
            |facts: &[&i64]| *facts[0],
        );
        let t = h.tuple(3);
        h.send(&mut node, SignalKind::Insert, Side::Left, t).unwrap();
        assert_eq!(h.score, SimpleScore::of(-6));

        h.set(t, 5);
        h.send(&mut node, SignalKind::Update, Side::Left, t).unwrap();
        assert_eq!(h.score, SimpleScore::of(-10));

        // the fact changes again before the retract: the stored impact is subtracted
        h.set(t, 100);
        h.send(&mut node, SignalKind::Retract, Side::Left, t).unwrap();
        assert_eq!(h.score, SimpleScore::of(0));

        let total = Node::<i64, SimpleScore>::constraint_total(&node).unwrap();
        assert_eq!(total.score, SimpleScore::of(0));
        assert_eq!(total.match_count, 0);
    }

    #[test]
    fn test_weight_override_by_full_name() {
        let mut node = ScorerNode::new(
            ConstraintRef::new("queens", "Row conflict"),
            ImpactType::Reward,
            SimpleScore::of(1),
            |_: &[&i64]| 1,
        );
        let overrides =
            ConstraintWeightOverrides::from_pairs([("queens/Row conflict", SimpleScore::of(7))]);
        Node::<i64, SimpleScore>::apply_weight_overrides(&mut node, &overrides);
        let total = Node::<i64, SimpleScore>::constraint_total(&node).unwrap();
        assert_eq!(total.weight, SimpleScore::of(7));
        assert_eq!(total.impact_type, ImpactType::Reward);
    }
}

mod group {
    use super::*;
    use crate::stream::collector::Collector;

    fn read_group<K, KF, C, T, G>(
        h: &mut Harness<(char, i64)>,
        _node: &GroupNode<(char, i64), K, KF, C>,
        group: TupleId,
        read: G,
    ) -> T
    where
        K: Send + 'static,
        C: Collector<(char, i64)>,
        C::Accumulator: 'static,
        G: Fn(&K, &C::Result) -> T + Send,
    {
        let ctx = Propagation::new(&h.facts, &mut h.tuples, &mut h.score, &mut h.emitted);
        OnGroup::<K, C, G>::new(read).apply(group, &ctx).unwrap()
    }

    #[test]
    fn test_one_tuple_per_group() {
        let mut h = Harness::new();
        let mut node = GroupNode::new(|facts: &[&(char, i64)]| facts[0].1, count::<(char, i64)>());
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 1));
        let c = h.tuple(('c', 2));

        let first = h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap();
        assert_eq!(kinds(&first), vec![SignalKind::Insert]);
        let ones = first[0].tuple;
        let out = h.send(&mut node, SignalKind::Insert, Side::Left, b).unwrap();
        assert_eq!(out, vec![Signal { kind: SignalKind::Update, tuple: ones }]);
        let out = h.send(&mut node, SignalKind::Insert, Side::Left, c).unwrap();
        assert_eq!(kinds(&out), vec![SignalKind::Insert]);
        let twos = out[0].tuple;
        assert_ne!(ones, twos);
        assert_eq!(node.group_count(), 2);
        assert!(h.facts_of(ones).is_empty());
        assert_eq!(read_group(&mut h, &node, ones, |k: &i64, n: &usize| (*k, *n)), (1, 2));

        // b moves to c's group: both groups change
        h.set(b, ('b', 2));
        let out = h.send(&mut node, SignalKind::Update, Side::Left, b).unwrap();
        assert_eq!(
            out,
            vec![
                Signal { kind: SignalKind::Update, tuple: ones },
                Signal { kind: SignalKind::Update, tuple: twos },
            ]
        );
        assert_eq!(read_group(&mut h, &node, twos, |k: &i64, n: &usize| (*k, *n)), (2, 2));
    }

    #[test]
    fn test_emptied_group_retracts_its_tuple() {
        let mut h = Harness::new();
        let mut node = GroupNode::new(|facts: &[&(char, i64)]| facts[0].1, count::<(char, i64)>());
        let a = h.tuple(('a', 1));
        let b = h.tuple(('b', 2));
        let group = h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap()[0].tuple;
        h.send(&mut node, SignalKind::Insert, Side::Left, b).unwrap();

        let out = h.send(&mut node, SignalKind::Retract, Side::Left, a).unwrap();
        assert_eq!(out, vec![Signal { kind: SignalKind::Retract, tuple: group }]);
        assert_eq!(node.group_count(), 1);
        // dying, still readable until the change settles
        assert_eq!(h.tuples.pending_release(), 1);
        assert_eq!(read_group(&mut h, &node, group, |_: &i64, n: &usize| *n), 0);

        // the key comes back as a new group tuple
        h.tuples.release_dying();
        let out = h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap();
        assert_eq!(kinds(&out), vec![SignalKind::Insert]);
        assert_ne!(out[0].tuple, group);
    }

    #[test]
    fn test_sum_groups_retract_the_accumulated_value() {
        let mut h = Harness::new();
        let mut node = GroupNode::new(|_: &[&(char, i64)]| (), sum(|f: &(char, i64)| f.1));
        let a = h.tuple(('a', 4));
        let b = h.tuple(('b', 6));
        let group = h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap()[0].tuple;
        h.send(&mut node, SignalKind::Insert, Side::Left, b).unwrap();
        assert_eq!(read_group(&mut h, &node, group, |_: &(), total: &i64| *total), 10);

        // same key: the group is updated, never retracted
        h.set(b, ('b', 7));
        let out = h.send(&mut node, SignalKind::Update, Side::Left, b).unwrap();
        assert_eq!(kinds(&out), vec![SignalKind::Update]);
        assert_eq!(read_group(&mut h, &node, group, |_: &(), total: &i64| *total), 11);

        h.set(a, ('a', 40));
        h.send(&mut node, SignalKind::Retract, Side::Left, a).unwrap();
        assert_eq!(read_group(&mut h, &node, group, |_: &(), total: &i64| *total), 7);
    }

    #[test]
    fn test_group_tuples_feed_a_scorer() {
        let mut h = Harness::new();
        let mut group = GroupNode::new(|facts: &[&(char, i64)]| facts[0].1, count::<(char, i64)>());
        // penalize count² per key
        let mut scorer = ScorerNode::reading(
            ConstraintRef::new("", "Crowded keys"),
            ImpactType::Penalty,
            SimpleScore::of(1),
            OnGroup::<i64, CountCollector<(char, i64)>, _>::new(|_: &i64, n: &usize| {
                (*n * *n) as i64
            }),
        );
        let tuples = [h.tuple(('a', 1)), h.tuple(('b', 1)), h.tuple(('c', 2))];
        for t in tuples {
            for signal in h.send(&mut group, SignalKind::Insert, Side::Left, t).unwrap() {
                h.send(&mut scorer, signal.kind, Side::Left, signal.tuple).unwrap();
            }
        }
        assert_eq!(h.score, SimpleScore::of(-5));

        for signal in h.send(&mut group, SignalKind::Retract, Side::Left, tuples[2]).unwrap() {
            h.send(&mut scorer, signal.kind, Side::Left, signal.tuple).unwrap();
        }
        assert_eq!(h.score, SimpleScore::of(-4));
        let total = Node::<(char, i64), SimpleScore>::constraint_total(&scorer).unwrap();
        assert_eq!(total.match_count, 1);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut h = Harness::new();
        let mut node = GroupNode::new(|facts: &[&(char, i64)]| facts[0].0, count::<(char, i64)>());
        let a = h.tuple(('a', 1));
        h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap();
        let err = h.send(&mut node, SignalKind::Insert, Side::Left, a).unwrap_err();
        assert!(matches!(
            err,
            TupleFlowError::Consistency(ConsistencyError::DuplicateInsert { .. })
        ));
        let unseen = h.tuple(('b', 1));
        assert!(h.send(&mut node, SignalKind::Retract, Side::Left, unseen).is_err());
    }
}

mod source {
    use super::*;
    use crate::fact::FactHandle;

    fn change(
        h: &mut Harness<i64>,
        node: &mut ForEachNode<i64, impl Fn(&i64) -> bool + Send>,
        change: FactChange,
        fact: FactHandle,
    ) -> Vec<Signal> {
        {
            let mut ctx = Propagation::new(&h.facts, &mut h.tuples, &mut h.score, &mut h.emitted);
            Node::<i64, SimpleScore>::fact_changed(node, change, fact, &mut ctx).unwrap();
        }
        h.emitted.drain(..).collect()
    }

    #[test]
    fn test_predicate_transitions() {
        let mut h = Harness::new();
        let mut node = ForEachNode::new(|v: &i64| *v % 2 == 0);
        let f = h.facts.insert(1);

        assert!(change(&mut h, &mut node, FactChange::Insert, f).is_empty());
        *h.facts.get_mut(f).unwrap() = 2;
        let out = change(&mut h, &mut node, FactChange::Update, f);
        assert_eq!(kinds(&out), vec![SignalKind::Insert]);
        assert_eq!(node.len(), 1);
        *h.facts.get_mut(f).unwrap() = 4;
        let out = change(&mut h, &mut node, FactChange::Update, f);
        assert_eq!(kinds(&out), vec![SignalKind::Update]);
        let out = change(&mut h, &mut node, FactChange::Retract, f);
        assert_eq!(kinds(&out), vec![SignalKind::Retract]);
        assert!(node.is_empty());
        assert_eq!(h.tuples.pending_release(), 1);
    }

    #[test]
    fn test_tuple_signals_are_rejected() {
        let mut h = Harness::new();
        let mut node = ForEachNode::new(|_: &i64| true);
        let t = h.tuple(1);
        assert!(h.send(&mut node, SignalKind::Insert, Side::Left, t).is_err());
    }
}
