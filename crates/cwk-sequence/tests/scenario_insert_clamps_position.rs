//! Scenario: insert positions are clamped, never rejected.
//!
//! # Invariant under test
//! - requested <= 0       -> order 1 (prepend)
//! - requested >  N + 1   -> order N + 1 (append)
//! - in-range requests land exactly where asked and push the tail down.

use cwk_schemas::{Lesson, LessonId, UnitId};
use cwk_sequence::{check_siblings, plan_insert, Renumber};

fn lesson(id: i64, order: i32) -> Lesson {
    Lesson {
        id: LessonId(id),
        title: format!("L{id}"),
        unit_id: UnitId(1),
        order,
        lesson_type: "video".to_string(),
        url: format!("https://example.test/{id}"),
    }
}

fn three() -> Vec<Lesson> {
    vec![lesson(1, 1), lesson(2, 2), lesson(3, 3)]
}

#[test]
fn non_positive_request_prepends() {
    for requested in [0, -1, -1000, i64::MIN] {
        let plan = plan_insert(&three(), requested);
        assert_eq!(plan.order, 1, "requested={requested}");
        assert_eq!(plan.shifts.len(), 3, "every sibling moves down");
    }
}

#[test]
fn oversized_request_appends() {
    for requested in [4, 5, 99, i64::MAX] {
        let plan = plan_insert(&three(), requested);
        assert_eq!(plan.order, 4, "requested={requested}");
        assert!(plan.shifts.is_empty(), "append moves nobody");
    }
}

#[test]
fn insert_into_empty_set_is_order_one() {
    let empty: Vec<Lesson> = Vec::new();
    assert_eq!(plan_insert(&empty, 7).order, 1);
    assert_eq!(plan_insert(&empty, -7).order, 1);
}

/// L1(1), L2(2), L3(3); insert NL at 2 -> NL=2, L2=3, L3=4, L1 untouched.
#[test]
fn insert_in_middle_matches_worked_example() {
    let mut siblings = three();
    let plan = plan_insert(&siblings, 2);

    assert_eq!(plan.order, 2);
    assert_eq!(
        plan.shifts,
        vec![
            Renumber {
                id: LessonId(2),
                order: 3
            },
            Renumber {
                id: LessonId(3),
                order: 4
            },
        ]
    );

    for r in &plan.shifts {
        let l = siblings.iter_mut().find(|l| l.id == r.id).unwrap();
        l.order = r.order;
    }
    siblings.push(lesson(4, plan.order));

    let order_of = |id: i64| siblings.iter().find(|l| l.id == LessonId(id)).unwrap().order;
    assert_eq!(order_of(1), 1);
    assert_eq!(order_of(4), 2);
    assert_eq!(order_of(2), 3);
    assert_eq!(order_of(3), 4);
    check_siblings(&siblings).unwrap();
}
