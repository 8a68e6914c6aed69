//! Scenario: reconciliation is idempotent.
//!
//! # Invariant under test
//! Applying a plan and reconciling again with no catalog change yields a
//! clean plan (no writes) and the identical learner view.

mod common;

use common::{lesson, materialize, row};
use cwk_progress::reconcile_unit;
use cwk_schemas::{LessonStatus, ProgressRecord};

#[test]
fn second_pass_is_clean_and_identical() {
    let lessons = vec![lesson(1, 2), lesson(3, 1), lesson(5, 3)];
    let mut rows = vec![
        row(10, 1, LessonStatus::Complete),
        row(11, 2, LessonStatus::Incomplete),
        row(12, 4, LessonStatus::Complete),
    ];

    let first = reconcile_unit(&lessons, &rows);
    assert!(!first.is_clean());

    // Apply: drop orphans, add created rows.
    let created = materialize(&first, 100);
    rows.retain(|r| !first.orphaned.contains(&r.id));
    rows.extend(created.iter().cloned());
    let view_1 = first.assemble(&created).unwrap();

    let second = reconcile_unit(&lessons, &rows);
    assert!(second.is_clean(), "second pass must plan no writes");
    let view_2 = second.assemble(&Vec::<ProgressRecord>::new()).unwrap();

    assert_eq!(view_1, view_2);
    let orders: Vec<_> = view_2.iter().map(|lp| lp.lesson.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
}
