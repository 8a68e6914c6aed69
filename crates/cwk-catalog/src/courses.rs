use cwk_schemas::{Course, CourseDetail, CourseId, CoursePatch, NewCourse};
use tracing::info;

use crate::{CatalogError, Store};

/// Create a course owned by `new.creator_username`.
pub async fn create_course(store: &dyn Store, new: NewCourse) -> Result<Course, CatalogError> {
    if new.title.trim().is_empty() {
        return Err(CatalogError::InvalidInput("course title is required".to_string()));
    }

    let mut tx = store.begin().await?;
    if tx.account(&new.creator_username).await?.is_none() {
        return Err(CatalogError::not_found("account", &new.creator_username));
    }
    let course = tx.insert_course(&new).await?;
    tx.commit().await?;

    info!(course_id = %course.id, creator = %course.creator_username, "course created");
    Ok(course)
}

pub async fn course(store: &dyn Store, id: CourseId) -> Result<Course, CatalogError> {
    let mut tx = store.begin().await?;
    tx.course(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("course", id))
}

/// The course plus its units in display order.
pub async fn course_detail(store: &dyn Store, id: CourseId) -> Result<CourseDetail, CatalogError> {
    let mut tx = store.begin().await?;
    let course = tx
        .course(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("course", id))?;
    let units = tx.units(id).await?;
    Ok(CourseDetail { course, units })
}

/// All courses ordered by title.
pub async fn list_courses(store: &dyn Store) -> Result<Vec<Course>, CatalogError> {
    let mut tx = store.begin().await?;
    tx.courses().await
}

pub async fn update_course(
    store: &dyn Store,
    id: CourseId,
    patch: CoursePatch,
) -> Result<Course, CatalogError> {
    if patch.is_empty() {
        return Err(CatalogError::InvalidInput("no fields to update".to_string()));
    }

    let mut tx = store.begin().await?;
    let course = tx
        .update_course(id, &patch)
        .await?
        .ok_or_else(|| CatalogError::not_found("course", id))?;
    tx.commit().await?;

    info!(course_id = %id, "course updated");
    Ok(course)
}

/// Delete a course with its units, lessons and every progress row.
pub async fn remove_course(store: &dyn Store, id: CourseId) -> Result<(), CatalogError> {
    let mut tx = store.begin().await?;
    if !tx.delete_course(id).await? {
        return Err(CatalogError::not_found("course", id));
    }
    tx.commit().await?;

    info!(course_id = %id, "course removed");
    Ok(())
}
