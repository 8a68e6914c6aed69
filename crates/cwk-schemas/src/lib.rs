//! Shared domain types for the coursework service.
//!
//! Plain data only: ids, catalog records, progress records and the request
//! shapes the catalog operations accept. Everything is `Serialize +
//! Deserialize` with camelCase field names so the daemon can hand these
//! straight to Axum's `Json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Generated id of a course row.
    CourseId
);
id_newtype!(
    /// Generated id of a unit row.
    UnitId
);
id_newtype!(
    /// Generated id of a lesson row. Lesson ids only ever grow, which is what
    /// the progress merge relies on.
    LessonId
);
id_newtype!(
    /// Generated id of a progress row.
    ProgressId
);

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// A learner / creator account. The credential hash is produced by the
/// authentication layer and is never serialized back out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub username: String,
    #[serde(skip_serializing, default)]
    pub credential_hash: String,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub username: String,
    pub credential_hash: String,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub creator_username: String,
    pub about: String,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub creator_username: String,
    pub title: String,
    #[serde(default)]
    pub about: String,
}

/// Partial course update. At least one field must be present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    pub title: Option<String>,
    pub about: Option<String>,
}

impl CoursePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.about.is_none()
    }
}

/// A course together with its units in display order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub units: Vec<Unit>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: UnitId,
    pub title: String,
    pub course_id: CourseId,
    /// 1-based, dense within the course.
    pub order: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUnit {
    pub course_id: CourseId,
    pub title: String,
    /// Requested position. Out-of-range values are clamped, never rejected.
    pub order: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPatch {
    pub title: Option<String>,
    pub order: Option<i64>,
}

impl UnitPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.order.is_none()
    }
}

/// A unit together with its lessons in display order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDetail {
    #[serde(flatten)]
    pub unit: Unit,
    pub lessons: Vec<Lesson>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub unit_id: UnitId,
    /// 1-based, dense within the unit.
    pub order: i32,
    /// Free-form type tag, e.g. "video".
    pub lesson_type: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLesson {
    pub unit_id: UnitId,
    pub title: String,
    pub order: i64,
    pub lesson_type: String,
    pub url: String,
}

/// Partial lesson update. The type tag is fixed at creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPatch {
    pub title: Option<String>,
    pub order: Option<i64>,
    pub url: Option<String>,
}

impl LessonPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.order.is_none() && self.url.is_none()
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    Incomplete,
    Complete,
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Incomplete => "incomplete",
            LessonStatus::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Result<Self, UnknownStatus> {
        match s {
            "incomplete" => Ok(LessonStatus::Incomplete),
            "complete" => Ok(LessonStatus::Complete),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Returned by [`LessonStatus::parse`] for anything but the two known values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid lesson status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

/// One learner's record for one lesson.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub id: ProgressId,
    pub learner_username: String,
    pub course_id: CourseId,
    pub unit_id: UnitId,
    pub lesson_id: LessonId,
    pub status: LessonStatus,
    pub updated_at_utc: DateTime<Utc>,
}

/// Progress row to be inserted; the store assigns id and timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProgress {
    pub learner_username: String,
    pub course_id: CourseId,
    pub unit_id: UnitId,
    pub lesson_id: LessonId,
    pub status: LessonStatus,
}

/// A lesson merged with the learner's progress on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub progress_id: ProgressId,
    pub status: LessonStatus,
}

/// Result of a status update: `{id, lessonId, status}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub id: ProgressId,
    pub lesson_id: LessonId,
    pub status: LessonStatus,
}

impl From<&ProgressRecord> for StatusUpdate {
    fn from(p: &ProgressRecord) -> Self {
        Self {
            id: p.id,
            lesson_id: p.lesson_id,
            status: p.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for s in [LessonStatus::Incomplete, LessonStatus::Complete] {
            assert_eq!(LessonStatus::parse(s.as_str()).unwrap(), s);
        }
        assert!(LessonStatus::parse("done").is_err());
    }

    #[test]
    fn account_never_serializes_credential_hash() {
        let acct = Account {
            username: "student1".to_string(),
            credential_hash: "$argon2id$v=19$abc".to_string(),
            created_at_utc: Utc::now(),
        };
        let v = serde_json::to_value(&acct).unwrap();
        assert!(v.get("credentialHash").is_none());
        assert_eq!(v["username"], "student1");
    }

    #[test]
    fn lesson_progress_flattens_lesson_fields() {
        let lp = LessonProgress {
            lesson: Lesson {
                id: LessonId(3),
                title: "Hooks".to_string(),
                unit_id: UnitId(1),
                order: 2,
                lesson_type: "video".to_string(),
                url: "https://www.youtube.com/embed/abc".to_string(),
            },
            progress_id: ProgressId(9),
            status: LessonStatus::Complete,
        };
        let v = serde_json::to_value(&lp).unwrap();
        assert_eq!(v["id"], 3);
        assert_eq!(v["order"], 2);
        assert_eq!(v["progressId"], 9);
        assert_eq!(v["status"], "complete");
    }
}
