#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use cwk_schemas::{
    CourseId, Lesson, LessonId, LessonStatus, ProgressId, ProgressRecord, UnitId,
};

pub const LEARNER: &str = "student1";

pub fn lesson(id: i64, order: i32) -> Lesson {
    Lesson {
        id: LessonId(id),
        title: format!("lesson-{id}"),
        unit_id: UnitId(1),
        order,
        lesson_type: "video".to_string(),
        url: format!("https://www.youtube.com/embed/{id}"),
    }
}

pub fn row(id: i64, lesson_id: i64, status: LessonStatus) -> ProgressRecord {
    ProgressRecord {
        id: ProgressId(id),
        learner_username: LEARNER.to_string(),
        course_id: CourseId(1),
        unit_id: UnitId(1),
        lesson_id: LessonId(lesson_id),
        status,
        updated_at_utc: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    }
}

/// Stand-in for the store: give each new row an id starting at `first_id`.
pub fn materialize(plan: &cwk_progress::ReconcilePlan, first_id: i64) -> Vec<ProgressRecord> {
    plan.new_rows(LEARNER, CourseId(1))
        .into_iter()
        .enumerate()
        .map(|(i, n)| ProgressRecord {
            id: ProgressId(first_id + i as i64),
            learner_username: n.learner_username,
            course_id: n.course_id,
            unit_id: n.unit_id,
            lesson_id: n.lesson_id,
            status: n.status,
            updated_at_utc: Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap(),
        })
        .collect()
}
