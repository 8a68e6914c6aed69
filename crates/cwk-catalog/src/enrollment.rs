use cwk_progress::{enrollment_rows, reconcile_unit};
use cwk_schemas::{
    CourseId, LessonProgress, LessonStatus, ProgressId, ProgressRecord, StatusUpdate, UnitId,
};
use tracing::{info, warn};

use crate::{CatalogError, RowLock, Store};

/// Enroll `learner` in a course: one `incomplete` row per lesson.
///
/// - NotFound: learner or course missing
/// - Conflict: the learner already holds rows for the course
pub async fn enroll(
    store: &dyn Store,
    learner: &str,
    course_id: CourseId,
) -> Result<CourseId, CatalogError> {
    let mut tx = store.begin().await?;
    if tx.account(learner).await?.is_none() {
        return Err(CatalogError::not_found("account", learner));
    }
    tx.lock_course(course_id, RowLock::Share)
        .await?
        .ok_or_else(|| CatalogError::not_found("course", course_id))?;
    tx.lock_enrollment(learner, course_id).await?;

    if tx.count_progress(learner, course_id).await? > 0 {
        return Err(CatalogError::Conflict(format!(
            "course {course_id} already added for {learner}"
        )));
    }

    let mut catalog = Vec::new();
    for unit in tx.units(course_id).await? {
        let lessons = tx.lessons(unit.id).await?;
        catalog.push((unit, lessons));
    }
    let rows = enrollment_rows(learner, course_id, &catalog);
    if !rows.is_empty() {
        tx.insert_progress(&rows).await?;
    }
    tx.commit().await?;

    info!(learner, course_id = %course_id, lessons = rows.len(), "learner enrolled");
    Ok(course_id)
}

/// Drop every progress row the learner holds for the course.
pub async fn unenroll(
    store: &dyn Store,
    learner: &str,
    course_id: CourseId,
) -> Result<CourseId, CatalogError> {
    let mut tx = store.begin().await?;
    tx.lock_enrollment(learner, course_id).await?;
    let removed = tx.delete_course_progress(learner, course_id).await?;
    if removed == 0 {
        return Err(CatalogError::NotFound(format!(
            "could not find course progress for course {course_id}"
        )));
    }
    tx.commit().await?;

    info!(learner, course_id = %course_id, removed, "learner unenrolled");
    Ok(course_id)
}

/// The learner's view of one unit: every lesson in display order with its
/// progress id and status.
///
/// Reading heals drift between lessons and progress rows: lessons added
/// after enrollment get a fresh `incomplete` row, rows whose lesson was
/// removed are deleted. A second call with no catalog change writes nothing.
pub async fn unit_progress(
    store: &dyn Store,
    learner: &str,
    unit_id: UnitId,
) -> Result<Vec<LessonProgress>, CatalogError> {
    let mut tx = store.begin().await?;
    let unit = tx
        .lock_unit(unit_id, RowLock::Share)
        .await?
        .ok_or_else(|| CatalogError::not_found("unit", unit_id))?;
    tx.lock_enrollment(learner, unit.course_id).await?;

    if tx.count_progress(learner, unit.course_id).await? == 0 {
        return Err(CatalogError::NotFound(format!(
            "no course progress for course {}",
            unit.course_id
        )));
    }

    let lessons = tx.lessons(unit_id).await?;
    let rows = tx.unit_progress(learner, unit_id).await?;
    let plan = reconcile_unit(&lessons, &rows);

    if plan.is_clean() {
        return Ok(plan.assemble(&[])?);
    }

    warn!(
        learner,
        unit_id = %unit_id,
        missing = plan.pending().count(),
        orphaned = plan.orphaned.len(),
        "unit progress out of sync; healing"
    );

    if !plan.orphaned.is_empty() {
        tx.delete_progress(&plan.orphaned).await?;
    }
    let new_rows = plan.new_rows(learner, unit.course_id);
    let created = if new_rows.is_empty() {
        Vec::new()
    } else {
        tx.insert_progress(&new_rows).await?
    };
    let view = plan.assemble(&created)?;
    tx.commit().await?;

    Ok(view)
}

pub async fn progress_record(
    store: &dyn Store,
    id: ProgressId,
) -> Result<ProgressRecord, CatalogError> {
    let mut tx = store.begin().await?;
    tx.progress(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("progress record", id))
}

/// Set one record's status. Whether the caller may touch the record is
/// decided before this is called.
pub async fn set_lesson_status(
    store: &dyn Store,
    id: ProgressId,
    status: LessonStatus,
) -> Result<StatusUpdate, CatalogError> {
    let mut tx = store.begin().await?;
    let row = tx
        .set_progress_status(id, status)
        .await?
        .ok_or_else(|| CatalogError::not_found("progress record", id))?;
    tx.commit().await?;

    info!(progress_id = %id, status = status.as_str(), "lesson status set");
    Ok(StatusUpdate::from(&row))
}
