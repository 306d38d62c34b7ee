//! Tests for the constraint stream API.

use tupleflow_config::{EngineConfig, EnvironmentMode};
use tupleflow_core::{HardSoftScore, SimpleScore, TupleFlowError};
use tupleflow_test::nqueens::{calculate_conflicts, Queen};
use tupleflow_test::shift::{count_overlaps, Shift};

use super::collector::{consecutive, count, sum, sum_bi};
use super::joiner::{equal, equal_bi, overlapping};
use super::ConstraintFactory;
use crate::index::RangeIndex;
use crate::session::ConstraintWeightOverrides;
use crate::tuple::TupleId;

fn queens_factory() -> ConstraintFactory<Queen, SimpleScore> {
    let factory = ConstraintFactory::new();
    let assigned = |q: &Queen| q.row.is_some();
    factory
        .for_each(assigned)
        .join_unique(equal(|q: &Queen| q.row))
        .penalize(SimpleScore::ONE)
        .as_constraint("Row conflict");
    factory
        .for_each(assigned)
        .join_unique(equal(|q: &Queen| q.ascending_diagonal()))
        .penalize(SimpleScore::ONE)
        .as_constraint("Ascending diagonal conflict");
    factory
        .for_each(assigned)
        .join_unique(equal(|q: &Queen| q.descending_diagonal()))
        .penalize(SimpleScore::ONE)
        .as_constraint("Descending diagonal conflict");
    factory
}

mod factory {
    use super::*;

    #[test]
    fn test_queens_match_brute_force() {
        let queens = Queen::with_rows(&[0, 2, 1, 3]);
        let mut session = queens_factory().build().unwrap();
        let handles: Vec<_> = queens
            .iter()
            .map(|q| session.insert_fact(q.clone()).unwrap())
            .collect();
        assert_eq!(
            session.calculate_score().unwrap(),
            SimpleScore::of(-calculate_conflicts(&queens))
        );

        session.update_fact(handles[1], |q| q.row = Some(3)).unwrap();
        session.update_fact(handles[3], |q| q.row = Some(2)).unwrap();
        let moved: Vec<Queen> = session.facts().map(|(_, q)| q.clone()).collect();
        assert_eq!(
            session.calculate_score().unwrap(),
            SimpleScore::of(-calculate_conflicts(&moved))
        );
    }

    #[test]
    fn test_duplicate_constraint_names_are_rejected() {
        let factory = ConstraintFactory::<i64, SimpleScore>::new();
        factory.for_all().penalize(SimpleScore::ONE).as_constraint("Twice");
        factory.for_all().reward(SimpleScore::ONE).as_constraint("Twice");
        let err = factory.build().unwrap_err();
        assert!(matches!(err, TupleFlowError::Config(_)));
        assert!(err.to_string().contains("Twice"));
    }

    #[test]
    fn test_same_name_in_different_packages_is_allowed() {
        let factory = ConstraintFactory::<i64, SimpleScore>::new();
        factory.for_all().penalize(SimpleScore::ONE).as_constraint_in("a", "Same");
        factory.for_all().penalize(SimpleScore::ONE).as_constraint_in("b", "Same");
        let mut session = factory.build().unwrap();
        session.insert_fact(1).unwrap();
        let names: Vec<String> = session
            .constraint_totals()
            .iter()
            .map(|total| total.constraint_ref.full_name())
            .collect();
        assert_eq!(names, vec!["a/Same", "b/Same"]);
    }

    #[test]
    fn test_weight_overrides_replace_declared_weights() {
        let factory = ConstraintFactory::<i64, HardSoftScore>::new();
        factory
            .for_all()
            .penalize(HardSoftScore::ONE_SOFT)
            .as_constraint("Count values");
        let overrides =
            ConstraintWeightOverrides::from_pairs([("Count values", HardSoftScore::of(2, 0))]);
        let mut session = factory
            .build_with(EnvironmentMode::FastAssert, &overrides)
            .unwrap();
        session.insert_fact(1).unwrap();
        session.insert_fact(2).unwrap();
        assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(-4, 0));
        assert_eq!(session.constraint_totals()[0].weight, HardSoftScore::of(2, 0));
    }

    #[test]
    fn test_override_of_unknown_constraint_is_rejected() {
        let factory = ConstraintFactory::<i64, SimpleScore>::new();
        factory.for_all().penalize(SimpleScore::ONE).as_constraint("Known");
        let mut overrides = ConstraintWeightOverrides::new();
        overrides.put("Unknown", SimpleScore::of(3));
        let err = factory
            .build_with(EnvironmentMode::default(), &overrides)
            .unwrap_err();
        assert!(matches!(err, TupleFlowError::Config(_)));
    }

    #[test]
    fn test_build_from_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            environment_mode = "full_assert"

            [constraint_weights]
            "Row conflict" = "5"
            "#,
        )
        .unwrap();
        let mut session = queens_factory().build_from_config(&config).unwrap();
        assert_eq!(session.environment_mode(), EnvironmentMode::FullAssert);
        for queen in Queen::with_rows(&[0, 0]) {
            session.insert_fact(queen).unwrap();
        }
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-5));

        let bad = EngineConfig::new().with_constraint_weight("Row conflict", "five");
        let err = queens_factory().build_from_config(&bad).unwrap_err();
        assert!(matches!(err, TupleFlowError::Config(_)));
    }

    #[test]
    fn test_for_each_unique_pair() {
        let factory = ConstraintFactory::<i64, SimpleScore>::new();
        factory
            .for_each_unique_pair(|v: &i64| *v >= 0, equal(|v: &i64| *v % 3))
            .penalize(SimpleScore::ONE)
            .as_constraint("Same residue");
        let mut session = factory.build().unwrap();
        for v in [0, 3, 6, 1, -3] {
            session.insert_fact(v).unwrap();
        }
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-3));
    }
}

mod uni {
    use super::*;

    #[test]
    fn test_filter_and_reward() {
        let factory = ConstraintFactory::<i64, SimpleScore>::new();
        factory
            .for_all()
            .filter(|v: &i64| *v > 10)
            .reward_with(SimpleScore::ONE, |v: &i64| *v)
            .as_constraint("Large values");
        let mut session = factory.build().unwrap();
        let small = session.insert_fact(5).unwrap();
        session.insert_fact(20).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(20));

        session.update_fact(small, |v| *v = 15).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(35));
    }

    #[test]
    fn test_join_pairs_two_streams() {
        #[derive(Debug, Clone)]
        enum Fact {
            Employee { id: u32 },
            Shift { employee: u32 },
        }

        let factory = ConstraintFactory::<Fact, SimpleScore>::new();
        let employees = factory.for_each(|f: &Fact| matches!(f, Fact::Employee { .. }));
        let shifts = factory.for_each(|f: &Fact| matches!(f, Fact::Shift { .. }));
        let employee_of = |f: &Fact| match f {
            Fact::Employee { id } => *id,
            Fact::Shift { employee } => *employee,
        };
        employees
            .join(shifts, equal(employee_of))
            .penalize(SimpleScore::ONE)
            .as_constraint("Assigned shifts");
        let mut session = factory.build().unwrap();
        session.insert_fact(Fact::Employee { id: 1 }).unwrap();
        session.insert_fact(Fact::Shift { employee: 1 }).unwrap();
        session.insert_fact(Fact::Shift { employee: 1 }).unwrap();
        let other = session.insert_fact(Fact::Shift { employee: 2 }).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-2));

        session
            .update_fact(other, |f| *f = Fact::Shift { employee: 1 })
            .unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-3));
    }

    #[test]
    fn test_join_unique_with_another_stream() {
        let factory = ConstraintFactory::<i64, SimpleScore>::new();
        let evens = factory.for_each(|v: &i64| *v % 2 == 0);
        let all = factory.for_all();
        evens
            .join_unique_with(all, equal(|v: &i64| *v / 10))
            .penalize(SimpleScore::ONE)
            .as_constraint("Same decade");
        let mut session = factory.build().unwrap();
        for v in [10, 12, 13] {
            session.insert_fact(v).unwrap();
        }
        // (10, 12), (10, 13), (12, 13)
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-3));
    }

    #[test]
    fn test_if_exists_and_if_not_exists() {
        #[derive(Debug, Clone)]
        struct Task {
            machine: u32,
            active: bool,
        }

        let factory = ConstraintFactory::<Task, SimpleScore>::new();
        let active = factory.for_each(|t: &Task| t.active);
        factory
            .for_each(|t: &Task| !t.active)
            .if_exists(active.clone(), equal(|t: &Task| t.machine))
            .penalize(SimpleScore::ONE)
            .as_constraint("Idle next to active");
        factory
            .for_each(|t: &Task| !t.active)
            .if_not_exists(active, equal(|t: &Task| t.machine))
            .penalize(SimpleScore::of(10))
            .as_constraint("Idle machine");
        let mut session = factory
            .build_with(EnvironmentMode::FastAssert, &ConstraintWeightOverrides::new())
            .unwrap();

        let idle = session.insert_fact(Task { machine: 1, active: false }).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-10));
        let busy = session.insert_fact(Task { machine: 1, active: true }).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-1));
        session.update_fact(busy, |t| t.machine = 2).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-10));
        session.update_fact(idle, |t| t.active = true).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(0));
    }

    #[test]
    fn test_if_exists_other_ignores_the_fact_itself() {
        let factory = ConstraintFactory::<(u32, i64), SimpleScore>::new();
        let all = factory.for_all();
        all.clone()
            .if_exists_other(all.clone(), equal(|f: &(u32, i64)| f.0))
            .penalize(SimpleScore::ONE)
            .as_constraint("Shares a group");
        all.clone()
            .if_not_exists_other(all, equal(|f: &(u32, i64)| f.0))
            .reward(SimpleScore::ONE)
            .as_constraint("Alone in its group");
        let mut session = factory.build().unwrap();

        let first = session.insert_fact((1, 0)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(1));
        session.insert_fact((1, 1)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-2));
        session.update_fact(first, |f| f.0 = 2).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(2));
    }

    #[test]
    fn test_overlapping_shifts_match_brute_force() {
        let factory = ConstraintFactory::<Shift, HardSoftScore>::new();
        factory
            .for_each(|s: &Shift| s.employee.is_some())
            .join_unique(overlapping(
                |s: &Shift| s.start,
                |s: &Shift| s.end,
                |s: &Shift| s.start,
                |s: &Shift| s.end,
            ))
            .filter(|a: &Shift, b: &Shift| a.employee == b.employee)
            .penalize(HardSoftScore::ONE_HARD)
            .as_constraint("Overlapping shifts");
        let mut session = factory.build().unwrap();
        let mut shifts = vec![
            Shift::assigned(0, 1, 0, 8),
            Shift::assigned(1, 1, 6, 12),
            Shift::assigned(2, 2, 6, 12),
            Shift::assigned(3, 1, 12, 20),
            Shift::unassigned(4, 0, 24),
        ];
        let handles: Vec<_> = shifts
            .iter()
            .map(|s| session.insert_fact(s.clone()).unwrap())
            .collect();
        assert_eq!(
            session.calculate_score().unwrap(),
            HardSoftScore::of(-count_overlaps(&shifts), 0)
        );

        session.update_fact(handles[2], |s| s.employee = Some(1)).unwrap();
        session.update_fact(handles[4], |s| s.employee = Some(1)).unwrap();
        shifts[2].employee = Some(1);
        shifts[4].employee = Some(1);
        assert_eq!(
            session.calculate_score().unwrap(),
            HardSoftScore::of(-count_overlaps(&shifts), 0)
        );
    }
}

mod bi_and_tri {
    use super::*;

    #[test]
    fn test_bi_join_into_tri_stream() {
        let factory = ConstraintFactory::<i64, SimpleScore>::new();
        let all = factory.for_all();
        factory
            .for_all()
            .join_unique(equal(|v: &i64| *v % 2))
            .join(all, |a: &i64, b: &i64| a + b, |c: &i64| *c)
            .filter(|a: &i64, b: &i64, c: &i64| c != a && c != b)
            .penalize_with(SimpleScore::ONE, |_: &i64, _: &i64, c: &i64| *c)
            .as_constraint("Sum present");
        let mut session = factory.build().unwrap();
        for v in [1, 3, 4] {
            session.insert_fact(v).unwrap();
        }
        // 1 + 3 = 4
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-4));

        let six = session.insert_fact(6).unwrap();
        // 4 + 6 = 10 is absent
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-4));
        session.update_fact(six, |v| *v = 7).unwrap();
        // 1 + 3 = 4 is still the only sum present
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-4));
    }

    #[test]
    fn test_bi_filter_and_reward() {
        let factory = ConstraintFactory::<i64, SimpleScore>::new();
        factory
            .for_all()
            .join_unique(equal_bi(|v: &i64| *v / 10, |v: &i64| *v / 10))
            .filter(|a: &i64, b: &i64| (a - b).abs() > 1)
            .reward_with(SimpleScore::ONE, |a: &i64, b: &i64| (a - b).abs())
            .as_constraint("Spread within decade");
        let mut session = factory.build().unwrap();
        for v in [10, 11, 15] {
            session.insert_fact(v).unwrap();
        }
        // (10, 15) and (11, 15)
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(9));
    }

    #[test]
    fn test_bi_group_by_with_sum_bi() {
        let factory = ConstraintFactory::<(char, i64), SimpleScore>::new();
        factory
            .for_all()
            .join_unique(equal(|f: &(char, i64)| f.0))
            .group_by(
                |a: &(char, i64), _: &(char, i64)| a.0,
                sum_bi(|a: &(char, i64), b: &(char, i64)| a.1 * b.1),
            )
            .penalize_with(SimpleScore::ONE, |_: &char, total: &i64| *total)
            .as_constraint("Pair products");
        let mut session = factory.build().unwrap();
        session.insert_fact(('x', 2)).unwrap();
        let three = session.insert_fact(('x', 3)).unwrap();
        session.insert_fact(('x', 4)).unwrap();
        session.insert_fact(('y', 5)).unwrap();
        // 2·3 + 2·4 + 3·4
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-26));

        session.retract_fact(three).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-8));
    }
}

mod grouped {
    use super::*;

    #[test]
    fn test_count_per_key() {
        let factory = ConstraintFactory::<Shift, HardSoftScore>::new();
        factory
            .for_each(|s: &Shift| s.employee.is_some())
            .group_by(|s: &Shift| s.employee, count())
            .penalize_with(HardSoftScore::ONE_SOFT, |_, n: &usize| (*n * *n) as i64)
            .as_constraint("Fair workload");
        let mut session = factory.build().unwrap();
        let first = session.insert_fact(Shift::assigned(0, 1, 0, 8)).unwrap();
        session.insert_fact(Shift::assigned(1, 1, 8, 16)).unwrap();
        session.insert_fact(Shift::assigned(2, 2, 0, 8)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(0, -5));

        session.update_fact(first, |s| s.employee = Some(2)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(0, -5));
        session.update_fact(first, |s| s.employee = None).unwrap();
        assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(0, -2));
        assert_eq!(session.constraint_totals()[0].match_count, 2);
    }

    #[test]
    fn test_group_reward() {
        let factory = ConstraintFactory::<(char, i64), SimpleScore>::new();
        factory
            .for_all()
            .group_by(|f: &(char, i64)| f.0, sum(|f: &(char, i64)| f.1))
            .reward(SimpleScore::ONE)
            .as_constraint("Groups");
        factory
            .for_all()
            .group_by(|f: &(char, i64)| f.0, sum(|f: &(char, i64)| f.1))
            .reward_with(SimpleScore::ONE, |_: &char, total: &i64| *total)
            .as_constraint("Group totals");
        let mut session = factory.build().unwrap();
        session.insert_fact(('a', 1)).unwrap();
        session.insert_fact(('a', 2)).unwrap();
        let b = session.insert_fact(('b', 5)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(10));

        session.retract_fact(b).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(4));
    }

    #[test]
    fn test_filter_on_group_result() {
        let factory = ConstraintFactory::<Shift, HardSoftScore>::new();
        factory
            .for_each(|s: &Shift| s.employee.is_some())
            .group_by(|s: &Shift| s.employee, count())
            .filter(|_, n: &usize| *n > 2)
            .penalize_with(HardSoftScore::ONE_HARD, |_, n: &usize| *n as i64 - 2)
            .as_constraint("Overloaded employee");
        let mut session = factory.build().unwrap();
        let mut handles = Vec::new();
        for (id, start) in [0, 8, 16].into_iter().enumerate() {
            handles.push(session.insert_fact(Shift::assigned(id, 1, start, start + 8)).unwrap());
        }
        session.insert_fact(Shift::assigned(3, 2, 0, 8)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(-1, 0));
        assert_eq!(session.constraint_totals()[0].match_count, 1);

        // the group drops below the threshold and leaves the filter
        session.update_fact(handles[0], |s| s.employee = Some(2)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(0, 0));
        assert_eq!(session.constraint_totals()[0].match_count, 0);

        session.update_fact(handles[1], |s| s.employee = Some(2)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(-1, 0));
    }

    #[test]
    fn test_group_tuple_retracts_when_group_empties() {
        let factory = ConstraintFactory::<(char, i64), SimpleScore>::new();
        factory
            .for_all()
            .group_by(|f: &(char, i64)| f.0, sum(|f: &(char, i64)| f.1))
            .reward(SimpleScore::ONE)
            .as_constraint("Groups");
        let mut session = factory.build().unwrap();
        let a1 = session.insert_fact(('a', 1)).unwrap();
        let a2 = session.insert_fact(('a', 2)).unwrap();
        // two source tuples and one group tuple
        assert_eq!(session.tuple_count(), 3);
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(1));

        session.retract_fact(a1).unwrap();
        assert_eq!(session.tuple_count(), 2);
        session.retract_fact(a2).unwrap();
        assert_eq!(session.tuple_count(), 0);
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(0));
        assert_eq!(session.constraint_totals()[0].match_count, 0);

        session.insert_fact(('a', 5)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(1));
    }

    #[test]
    fn test_group_checked_against_other_facts() {
        let factory = ConstraintFactory::<(char, i64), SimpleScore>::new();
        let markers = factory.for_each(|f: &(char, i64)| f.0 == 'm');
        factory
            .for_each(|f: &(char, i64)| f.0 == 'w')
            .group_by(|f: &(char, i64)| f.1, count())
            .if_not_exists(markers, |key: &i64, _: &usize| *key, |f: &(char, i64)| f.1)
            .penalize_with(SimpleScore::ONE, |_, n: &usize| *n as i64)
            .as_constraint("Unmarked work");
        let mut session = factory
            .build_with(EnvironmentMode::FullAssert, &ConstraintWeightOverrides::new())
            .unwrap();
        let moved = session.insert_fact(('w', 1)).unwrap();
        session.insert_fact(('w', 1)).unwrap();
        session.insert_fact(('w', 2)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-3));

        let marker = session.insert_fact(('m', 1)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-1));

        // work moving out of the marked group lands in the unmarked one
        session.update_fact(moved, |f| f.1 = 2).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-2));

        session.retract_fact(marker).unwrap();
        assert_eq!(session.calculate_score().unwrap(), SimpleScore::of(-3));
    }

    #[test]
    fn test_consecutive_days() {
        let factory = ConstraintFactory::<Shift, HardSoftScore>::new();
        factory
            .for_each(|s: &Shift| s.employee.is_some())
            .group_by(|s: &Shift| s.employee, consecutive(|s: &Shift| s.day, 1))
            .penalize_with(HardSoftScore::ONE_SOFT, |_, days: &RangeIndex<i64, TupleId>| {
                days.sequences().map(|run| (run.count() as i64 - 2).max(0)).sum()
            })
            .as_constraint("Too many consecutive days");
        let mut session = factory
            .build_with(EnvironmentMode::FastAssert, &ConstraintWeightOverrides::new())
            .unwrap();

        let mut handles = Vec::new();
        for (id, day) in [1, 2, 3, 4, 7].into_iter().enumerate() {
            handles.push(session.insert_fact(Shift::on_day(id, 1, day)).unwrap());
        }
        session.insert_fact(Shift::on_day(5, 2, 1)).unwrap();
        assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(0, -2));

        // day 4 moves to 5, splitting the run into 1..=3 and 5
        session.update_fact(handles[3], |s| s.day = 5).unwrap();
        assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(0, -1));

        session.retract_fact(handles[1]).unwrap();
        assert_eq!(session.calculate_score().unwrap(), HardSoftScore::of(0, 0));
    }
}
