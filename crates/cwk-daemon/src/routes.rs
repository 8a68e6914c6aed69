//! Axum router and all HTTP handlers for cwk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers are thin: resolve the caller, check they may
//! act on the resource, then call into `cwk_catalog`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use cwk_catalog::{self as catalog, CatalogError, Store};
use cwk_schemas::{
    CourseId, CoursePatch, LessonId, LessonPatch, LessonStatus, NewAccount, NewCourse, NewLesson,
    NewUnit, ProgressId, UnitId, UnitPatch,
};

use crate::{
    api_types::{
        CreateAccountRequest, CreateCourseRequest, CreateLessonRequest, CreateUnitRequest,
        EnrollmentResponse, HealthResponse, StatusUpdateRequest,
    },
    auth::Caller,
    error::ApiError,
    state::AppState,
};

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/accounts", post(create_account))
        .route(
            "/v1/accounts/:username",
            get(get_account).delete(delete_account),
        )
        .route("/v1/accounts/:username/created", get(created_courses))
        .route("/v1/accounts/:username/enrolled", get(enrolled_courses))
        .route("/v1/courses", get(list_courses).post(create_course))
        .route(
            "/v1/courses/:id",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/v1/courses/:id/units", get(list_units))
        .route("/v1/units", post(create_unit))
        .route(
            "/v1/units/:id",
            get(get_unit).patch(update_unit).delete(delete_unit),
        )
        .route("/v1/units/:id/lessons", get(list_lessons))
        .route("/v1/lessons", post(create_lesson))
        .route(
            "/v1/lessons/:id",
            get(get_lesson).patch(update_lesson).delete(delete_lesson),
        )
        .route(
            "/v1/enrollments/:course_id",
            post(enroll).delete(unenroll),
        )
        .route("/v1/progress/units/:unit_id", get(unit_progress))
        .route("/v1/progress/:id", patch(set_progress_status))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Ownership checks
// ---------------------------------------------------------------------------

async fn require_course_creator(
    store: &dyn Store,
    caller: &Caller,
    course_id: CourseId,
) -> ApiResult<()> {
    let course = catalog::course(store, course_id).await?;
    caller.require(&course.creator_username, &format!("course {course_id}"))
}

async fn require_unit_creator(store: &dyn Store, caller: &Caller, unit_id: UnitId) -> ApiResult<()> {
    let unit = catalog::unit(store, unit_id).await?;
    require_course_creator(store, caller, unit.course_id).await
}

async fn require_lesson_creator(
    store: &dyn Store,
    caller: &Caller,
    lesson_id: LessonId,
) -> ApiResult<()> {
    let lesson = catalog::lesson(store, lesson_id).await?;
    require_unit_creator(store, caller, lesson.unit_id).await
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// /v1/accounts
// ---------------------------------------------------------------------------

/// Registration: the only mutating route without a caller identity.
pub(crate) async fn create_account(
    State(st): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let account = catalog::create_account(
        st.store.as_ref(),
        NewAccount {
            username: req.username,
            credential_hash: req.credential_hash,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub(crate) async fn get_account(
    State(st): State<Arc<AppState>>,
    _caller: Caller,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog::account(st.store.as_ref(), &username).await?))
}

pub(crate) async fn delete_account(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(username): Path<String>,
) -> ApiResult<StatusCode> {
    caller.require(&username, &format!("account {username}"))?;
    catalog::remove_account(st.store.as_ref(), &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn created_courses(
    State(st): State<Arc<AppState>>,
    _caller: Caller,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        catalog::created_courses(st.store.as_ref(), &username).await?,
    ))
}

/// A learner's enrollments are private to them.
pub(crate) async fn enrolled_courses(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if caller.as_str() != username {
        return Err(ApiError::forbidden(format!(
            "{} may not view enrollments of {username}",
            caller.as_str()
        )));
    }
    Ok(Json(
        catalog::enrolled_courses(st.store.as_ref(), &username).await?,
    ))
}

// ---------------------------------------------------------------------------
// /v1/courses
// ---------------------------------------------------------------------------

pub(crate) async fn list_courses(
    State(st): State<Arc<AppState>>,
    _caller: Caller,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog::list_courses(st.store.as_ref()).await?))
}

pub(crate) async fn create_course(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Json(req): Json<CreateCourseRequest>,
) -> ApiResult<impl IntoResponse> {
    let course = catalog::create_course(
        st.store.as_ref(),
        NewCourse {
            creator_username: caller.0,
            title: req.title,
            about: req.about,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// The course with its units in display order.
pub(crate) async fn get_course(
    State(st): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<CourseId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog::course_detail(st.store.as_ref(), id).await?))
}

pub(crate) async fn update_course(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
    Json(patch): Json<CoursePatch>,
) -> ApiResult<impl IntoResponse> {
    require_course_creator(st.store.as_ref(), &caller, id).await?;
    Ok(Json(
        catalog::update_course(st.store.as_ref(), id, patch).await?,
    ))
}

pub(crate) async fn delete_course(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<CourseId>,
) -> ApiResult<StatusCode> {
    require_course_creator(st.store.as_ref(), &caller, id).await?;
    catalog::remove_course(st.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_units(
    State(st): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<CourseId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog::list_units(st.store.as_ref(), id).await?))
}

// ---------------------------------------------------------------------------
// /v1/units
// ---------------------------------------------------------------------------

pub(crate) async fn create_unit(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Json(req): Json<CreateUnitRequest>,
) -> ApiResult<impl IntoResponse> {
    require_course_creator(st.store.as_ref(), &caller, req.course_id).await?;
    let unit = catalog::create_unit(
        st.store.as_ref(),
        NewUnit {
            course_id: req.course_id,
            title: req.title,
            order: req.order.unwrap_or(i64::MAX),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

/// The unit with its lessons in display order.
pub(crate) async fn get_unit(
    State(st): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<UnitId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog::unit_detail(st.store.as_ref(), id).await?))
}

pub(crate) async fn update_unit(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<UnitId>,
    Json(patch): Json<UnitPatch>,
) -> ApiResult<impl IntoResponse> {
    require_unit_creator(st.store.as_ref(), &caller, id).await?;
    Ok(Json(catalog::update_unit(st.store.as_ref(), id, patch).await?))
}

pub(crate) async fn delete_unit(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<UnitId>,
) -> ApiResult<StatusCode> {
    require_unit_creator(st.store.as_ref(), &caller, id).await?;
    catalog::remove_unit(st.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_lessons(
    State(st): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<UnitId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog::list_lessons(st.store.as_ref(), id).await?))
}

// ---------------------------------------------------------------------------
// /v1/lessons
// ---------------------------------------------------------------------------

pub(crate) async fn create_lesson(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Json(req): Json<CreateLessonRequest>,
) -> ApiResult<impl IntoResponse> {
    require_unit_creator(st.store.as_ref(), &caller, req.unit_id).await?;
    let lesson = catalog::create_lesson(
        st.store.as_ref(),
        NewLesson {
            unit_id: req.unit_id,
            title: req.title,
            order: req.order.unwrap_or(i64::MAX),
            lesson_type: req.lesson_type,
            url: req.url,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

pub(crate) async fn get_lesson(
    State(st): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<LessonId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog::lesson(st.store.as_ref(), id).await?))
}

pub(crate) async fn update_lesson(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<LessonId>,
    Json(patch): Json<LessonPatch>,
) -> ApiResult<impl IntoResponse> {
    require_lesson_creator(st.store.as_ref(), &caller, id).await?;
    Ok(Json(
        catalog::update_lesson(st.store.as_ref(), id, patch).await?,
    ))
}

pub(crate) async fn delete_lesson(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<LessonId>,
) -> ApiResult<StatusCode> {
    require_lesson_creator(st.store.as_ref(), &caller, id).await?;
    catalog::remove_lesson(st.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// /v1/enrollments
// ---------------------------------------------------------------------------

pub(crate) async fn enroll(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(course_id): Path<CourseId>,
) -> ApiResult<impl IntoResponse> {
    let course_id = catalog::enroll(st.store.as_ref(), caller.as_str(), course_id).await?;
    Ok((StatusCode::CREATED, Json(EnrollmentResponse { course_id })))
}

pub(crate) async fn unenroll(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(course_id): Path<CourseId>,
) -> ApiResult<impl IntoResponse> {
    let course_id = catalog::unenroll(st.store.as_ref(), caller.as_str(), course_id).await?;
    Ok(Json(EnrollmentResponse { course_id }))
}

// ---------------------------------------------------------------------------
// /v1/progress
// ---------------------------------------------------------------------------

/// The caller's lessons for one unit, with progress, in display order.
pub(crate) async fn unit_progress(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(unit_id): Path<UnitId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        catalog::unit_progress(st.store.as_ref(), caller.as_str(), unit_id).await?,
    ))
}

/// Only the learner who owns the record may change its status.
pub(crate) async fn set_progress_status(
    State(st): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<ProgressId>,
    Json(req): Json<StatusUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let status = LessonStatus::parse(&req.status)
        .map_err(|e| CatalogError::InvalidInput(e.to_string()))?;
    let record = catalog::progress_record(st.store.as_ref(), id).await?;
    caller.require(&record.learner_username, &format!("progress record {id}"))?;
    Ok(Json(
        catalog::set_lesson_status(st.store.as_ref(), id, status).await?,
    ))
}
