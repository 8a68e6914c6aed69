//! Scenario: sibling orders through the catalog operations.
//!
//! # Invariant under test
//! - L1, L2, L3; insert NL at 2 -> L1=1, NL=2, L2=3, L3=4.
//! - After a mixed run of inserts, moves and removes on units and lessons,
//!   every sibling set is exactly `1..=N` and the ordering audit is clean.

use cwk_catalog::{
    audit_ordering, create_lesson, create_unit, list_lessons, list_units, remove_lesson,
    remove_unit, update_lesson, update_unit,
};
use cwk_schemas::{LessonPatch, NewLesson, NewUnit, UnitPatch};
use cwk_sequence::check_siblings;
use cwk_testkit::{seed_account, seed_course, MemStore};

#[tokio::test]
async fn insert_in_the_middle_pushes_the_tail_down() {
    let store = MemStore::new();
    seed_account(&store, "Mosh").await.unwrap();
    let seeded = seed_course(&store, "Mosh", "C1", &[("U1", &["L1", "L2", "L3"])])
        .await
        .unwrap();
    let unit = seeded.unit(0).id;

    let nl = create_lesson(
        &store,
        NewLesson {
            unit_id: unit,
            title: "NL".to_string(),
            order: 2,
            lesson_type: "video".to_string(),
            url: "https://www.youtube.com/embed/NL".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(nl.order, 2);

    let got: Vec<(String, i32)> = list_lessons(&store, unit)
        .await
        .unwrap()
        .into_iter()
        .map(|l| (l.title, l.order))
        .collect();
    assert_eq!(
        got,
        vec![
            ("L1".to_string(), 1),
            ("NL".to_string(), 2),
            ("L2".to_string(), 3),
            ("L3".to_string(), 4),
        ]
    );
}

#[tokio::test]
async fn mixed_operations_keep_every_set_dense() {
    let store = MemStore::new();
    seed_account(&store, "Mosh").await.unwrap();
    let seeded = seed_course(
        &store,
        "Mosh",
        "DSA",
        &[("Arrays", &["a1", "a2", "a3"]), ("Trees", &["t1", "t2"])],
    )
    .await
    .unwrap();
    let course = seeded.course.id;
    let arrays = seeded.unit(0).id;

    let graphs = create_unit(
        &store,
        NewUnit {
            course_id: course,
            title: "Graphs".to_string(),
            order: -3,
        },
    )
    .await
    .unwrap();
    assert_eq!(graphs.order, 1);

    update_unit(
        &store,
        graphs.id,
        UnitPatch {
            title: None,
            order: Some(99),
        },
    )
    .await
    .unwrap();

    for (title, order) in [("a0", 0), ("a9", 50), ("a15", 3)] {
        create_lesson(
            &store,
            NewLesson {
                unit_id: arrays,
                title: title.to_string(),
                order,
                lesson_type: "video".to_string(),
                url: format!("https://www.youtube.com/embed/{title}"),
            },
        )
        .await
        .unwrap();
    }
    update_lesson(
        &store,
        seeded.lessons(0)[2].id,
        LessonPatch {
            order: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    remove_lesson(&store, seeded.lessons(0)[0].id).await.unwrap();
    remove_unit(&store, seeded.unit(1).id).await.unwrap();

    let units = list_units(&store, course).await.unwrap();
    check_siblings(&units).unwrap();
    assert_eq!(units.len(), 2);
    assert_eq!(units.last().unwrap().title, "Graphs");

    let lessons = list_lessons(&store, arrays).await.unwrap();
    check_siblings(&lessons).unwrap();
    assert_eq!(lessons.len(), 5);
    assert_eq!(lessons[0].title, "a3");

    assert!(audit_ordering(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn moving_onto_current_position_touches_no_sibling() {
    let store = MemStore::new();
    seed_account(&store, "Mosh").await.unwrap();
    let seeded = seed_course(&store, "Mosh", "C1", &[("U1", &["L1", "L2", "L3"])])
        .await
        .unwrap();
    let before = list_lessons(&store, seeded.unit(0).id).await.unwrap();

    let moved = update_lesson(
        &store,
        before[1].id,
        LessonPatch {
            order: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(moved.order, 2);
    assert_eq!(list_lessons(&store, seeded.unit(0).id).await.unwrap(), before);
}

#[tokio::test]
async fn audit_reports_planted_gaps() {
    let store = MemStore::new();
    seed_account(&store, "Mosh").await.unwrap();
    let seeded = seed_course(&store, "Mosh", "C1", &[("U1", &["L1", "L2"])])
        .await
        .unwrap();
    let l2 = seeded.lessons(0)[1].id;

    store
        .tamper(|st| {
            if let Some(l) = st.lessons.get_mut(&l2) {
                l.order = 7;
            }
        })
        .await;

    let report = audit_ordering(&store).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].violation.missing, vec![2]);
    assert_eq!(report[0].violation.out_of_range, vec![7]);
}
