//! Scenario: an operation either commits fully or leaves no trace.
//!
//! # Invariant under test
//! - A failed commit during an insert that shifts siblings leaves every
//!   sibling's order as it was.
//! - A failed commit during enrollment leaves no progress rows.
//! - The store surfaces the failure as transient.

use cwk_catalog::{create_lesson, enroll, list_lessons};
use cwk_schemas::NewLesson;
use cwk_testkit::{seed_account, seed_course, MemStore};

#[tokio::test]
async fn failed_insert_leaves_siblings_untouched() {
    let store = MemStore::new();
    seed_account(&store, "Mosh").await.unwrap();
    let seeded = seed_course(&store, "Mosh", "C1", &[("U1", &["L1", "L2", "L3"])])
        .await
        .unwrap();
    let unit = seeded.unit(0).id;
    let before = list_lessons(&store, unit).await.unwrap();

    store.fail_next_commit();
    let err = create_lesson(
        &store,
        NewLesson {
            unit_id: unit,
            title: "NL".to_string(),
            order: 1,
            lesson_type: "video".to_string(),
            url: "https://www.youtube.com/embed/NL".to_string(),
        },
    )
    .await
    .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(list_lessons(&store, unit).await.unwrap(), before);
}

#[tokio::test]
async fn failed_enroll_creates_no_rows_and_can_be_retried() {
    let store = MemStore::new();
    seed_account(&store, "Mosh").await.unwrap();
    seed_account(&store, "student3").await.unwrap();
    let seeded = seed_course(&store, "Mosh", "C1", &[("U1", &["L1", "L2"])])
        .await
        .unwrap();

    store.fail_next_commit();
    assert!(enroll(&store, "student3", seeded.course.id)
        .await
        .unwrap_err()
        .is_transient());
    assert!(store.snapshot().await.progress.is_empty());

    enroll(&store, "student3", seeded.course.id).await.unwrap();
    assert_eq!(store.snapshot().await.progress.len(), 2);
}
