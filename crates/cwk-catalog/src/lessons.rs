use cwk_schemas::{Lesson, LessonId, LessonPatch, NewLesson, UnitId};
use cwk_sequence::{plan_insert, plan_move, plan_remove};
use tracing::{debug, info};

use crate::{CatalogError, RowLock, Store};

/// Insert a lesson at the requested position, shifting later lessons down.
/// The position is clamped to `[1, N + 1]`.
pub async fn create_lesson(store: &dyn Store, new: NewLesson) -> Result<Lesson, CatalogError> {
    let mut tx = store.begin().await?;
    tx.lock_unit(new.unit_id, RowLock::Update)
        .await?
        .ok_or_else(|| CatalogError::not_found("unit", new.unit_id))?;

    let siblings = tx.lessons(new.unit_id).await?;
    let plan = plan_insert(&siblings, new.order);
    debug!(
        unit_id = %new.unit_id,
        requested = new.order,
        order = plan.order,
        shifted = plan.shifts.len(),
        "lesson insert planned"
    );

    if !plan.shifts.is_empty() {
        tx.renumber_lessons(&plan.shifts).await?;
    }
    let lesson = tx
        .insert_lesson(
            new.unit_id,
            &new.title,
            plan.order,
            &new.lesson_type,
            &new.url,
        )
        .await?;
    tx.commit().await?;

    info!(lesson_id = %lesson.id, unit_id = %lesson.unit_id, order = lesson.order, "lesson created");
    Ok(lesson)
}

pub async fn lesson(store: &dyn Store, id: LessonId) -> Result<Lesson, CatalogError> {
    let mut tx = store.begin().await?;
    tx.lesson(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("lesson", id))
}

/// Lessons of a unit in display order.
pub async fn list_lessons(store: &dyn Store, unit_id: UnitId) -> Result<Vec<Lesson>, CatalogError> {
    let mut tx = store.begin().await?;
    if tx.unit(unit_id).await?.is_none() {
        return Err(CatalogError::not_found("unit", unit_id));
    }
    tx.lessons(unit_id).await
}

/// Rename, re-point and/or move a lesson within its unit.
pub async fn update_lesson(
    store: &dyn Store,
    id: LessonId,
    patch: LessonPatch,
) -> Result<Lesson, CatalogError> {
    if patch.is_empty() {
        return Err(CatalogError::InvalidInput("no fields to update".to_string()));
    }

    let mut tx = store.begin().await?;
    let unit_id = tx
        .lesson(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("lesson", id))?
        .unit_id;
    tx.lock_unit(unit_id, RowLock::Update).await?;

    let siblings = tx.lessons(unit_id).await?;
    let mut lesson = siblings
        .iter()
        .find(|l| l.id == id)
        .cloned()
        .ok_or_else(|| CatalogError::not_found("lesson", id))?;

    if let Some(requested) = patch.order {
        let plan = plan_move(&siblings, id, requested)?;
        debug!(
            lesson_id = %id,
            from = plan.from,
            to = plan.to,
            shifted = plan.shifts.len(),
            "lesson move planned"
        );
        if !plan.shifts.is_empty() {
            tx.renumber_lessons(&plan.shifts).await?;
        }
        lesson.order = plan.to;
    }
    if let Some(title) = patch.title {
        lesson.title = title;
    }
    if let Some(url) = patch.url {
        lesson.url = url;
    }

    tx.update_lesson(&lesson).await?;
    tx.commit().await?;

    info!(lesson_id = %id, order = lesson.order, "lesson updated");
    Ok(lesson)
}

/// Delete a lesson and close the gap. Learners' rows for it are cleaned up
/// the next time their unit progress is read.
pub async fn remove_lesson(store: &dyn Store, id: LessonId) -> Result<(), CatalogError> {
    let mut tx = store.begin().await?;
    let unit_id = tx
        .lesson(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("lesson", id))?
        .unit_id;
    tx.lock_unit(unit_id, RowLock::Update).await?;

    let siblings = tx.lessons(unit_id).await?;
    let plan = plan_remove(&siblings, id)?;

    tx.delete_lesson(id).await?;
    if !plan.shifts.is_empty() {
        tx.renumber_lessons(&plan.shifts).await?;
    }
    tx.commit().await?;

    info!(
        lesson_id = %id,
        unit_id = %unit_id,
        order = plan.removed_order,
        shifted = plan.shifts.len(),
        "lesson removed"
    );
    Ok(())
}
