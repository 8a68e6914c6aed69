//! Request and response bodies that are not plain domain types.
//!
//! Domain records (`Course`, `Unit`, `LessonProgress`, ...) are returned
//! as-is from `cwk-schemas`. No business logic lives here.

use cwk_schemas::{CourseId, UnitId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// "not_found" | "conflict" | "invalid_input" | "transient" | "storage"
    /// | "unauthenticated" | "forbidden"
    pub kind: String,
}

// ---------------------------------------------------------------------------
// /v1/accounts
// ---------------------------------------------------------------------------

/// The credential arrives hashed by the authentication layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub username: String,
    pub credential_hash: String,
}

// ---------------------------------------------------------------------------
// /v1/courses, /v1/units, /v1/lessons
// ---------------------------------------------------------------------------

/// The creator is always the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub about: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUnitRequest {
    pub course_id: CourseId,
    pub title: String,
    /// Requested position; clamped to `[1, N + 1]`. Appends when absent.
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    pub unit_id: UnitId,
    pub title: String,
    pub order: Option<i64>,
    pub lesson_type: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// /v1/enrollments, /v1/progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub course_id: CourseId,
}

/// `status` is checked against the known values in the handler so a bad
/// value reports as invalid input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}
