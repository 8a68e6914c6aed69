//! Scenario: reading unit progress heals drift between lessons and rows.
//!
//! # Invariant under test
//! - Deleting lesson B after enrollment: the next read yields [A, C] and B's
//!   row is gone from storage.
//! - Adding lesson D at order 2 after enrollment: the next read yields
//!   [A, D, C] with D `incomplete` and persisted.

use cwk_catalog::{create_lesson, enroll, remove_lesson, set_lesson_status, unit_progress};
use cwk_schemas::{LessonStatus, NewLesson};
use cwk_testkit::{seed_account, seed_course, MemStore, SeededCourse};

async fn enrolled_setup() -> (MemStore, SeededCourse) {
    let store = MemStore::new();
    seed_account(&store, "Mosh").await.unwrap();
    seed_account(&store, "student1").await.unwrap();
    let seeded = seed_course(&store, "Mosh", "React", &[("Basics", &["A", "B", "C"])])
        .await
        .unwrap();
    enroll(&store, "student1", seeded.course.id).await.unwrap();
    (store, seeded)
}

fn titles(view: &[cwk_schemas::LessonProgress]) -> Vec<&str> {
    view.iter().map(|lp| lp.lesson.title.as_str()).collect()
}

#[tokio::test]
async fn deleted_lesson_row_is_removed_on_read() {
    let (store, seeded) = enrolled_setup().await;
    let unit = seeded.unit(0).id;
    let b = seeded.lessons(0)[1].id;

    remove_lesson(&store, b).await.unwrap();
    let before = store.snapshot().await;
    assert!(
        before.progress.values().any(|p| p.lesson_id == b),
        "lesson removal leaves the row for reconciliation"
    );

    let view = unit_progress(&store, "student1", unit).await.unwrap();
    assert_eq!(titles(&view), vec!["A", "C"]);
    assert_eq!(view[0].lesson.order, 1);
    assert_eq!(view[1].lesson.order, 2);

    let after = store.snapshot().await;
    assert!(!after.progress.values().any(|p| p.lesson_id == b));
    assert_eq!(after.progress.len(), 2);
}

#[tokio::test]
async fn added_lesson_gets_incomplete_row_on_read() {
    let (store, seeded) = enrolled_setup().await;
    let unit = seeded.unit(0).id;

    // Progress on A survives the heal untouched.
    let first = unit_progress(&store, "student1", unit).await.unwrap();
    set_lesson_status(&store, first[0].progress_id, LessonStatus::Complete)
        .await
        .unwrap();

    let d = create_lesson(
        &store,
        NewLesson {
            unit_id: unit,
            title: "D".to_string(),
            order: 2,
            lesson_type: "video".to_string(),
            url: "https://www.youtube.com/embed/D".to_string(),
        },
    )
    .await
    .unwrap();

    let view = unit_progress(&store, "student1", unit).await.unwrap();
    assert_eq!(titles(&view), vec!["A", "D", "B", "C"]);
    assert_eq!(view[0].status, LessonStatus::Complete);
    assert_eq!(view[1].status, LessonStatus::Incomplete);

    let snap = store.snapshot().await;
    let row = snap
        .progress
        .get(&view[1].progress_id)
        .expect("D's row is persisted");
    assert_eq!(row.lesson_id, d.id);
    assert_eq!(row.learner_username, "student1");
    assert_eq!(row.course_id, seeded.course.id);
}

#[tokio::test]
async fn delete_and_add_heal_in_one_read() {
    let (store, seeded) = enrolled_setup().await;
    let unit = seeded.unit(0).id;

    remove_lesson(&store, seeded.lessons(0)[1].id).await.unwrap();
    create_lesson(
        &store,
        NewLesson {
            unit_id: unit,
            title: "D".to_string(),
            order: 2,
            lesson_type: "video".to_string(),
            url: "https://www.youtube.com/embed/D".to_string(),
        },
    )
    .await
    .unwrap();

    let view = unit_progress(&store, "student1", unit).await.unwrap();
    assert_eq!(titles(&view), vec!["A", "D", "C"]);
    assert_eq!(store.snapshot().await.progress.len(), 3);
}
