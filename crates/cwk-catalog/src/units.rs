use cwk_schemas::{CourseId, NewUnit, Unit, UnitDetail, UnitId, UnitPatch};
use cwk_sequence::{plan_insert, plan_move, plan_remove};
use tracing::{debug, info};

use crate::{CatalogError, RowLock, Store};

/// Insert a unit at the requested position, shifting later units down.
/// The position is clamped to `[1, N + 1]`.
pub async fn create_unit(store: &dyn Store, new: NewUnit) -> Result<Unit, CatalogError> {
    let mut tx = store.begin().await?;
    tx.lock_course(new.course_id, RowLock::Update)
        .await?
        .ok_or_else(|| CatalogError::not_found("course", new.course_id))?;

    let siblings = tx.units(new.course_id).await?;
    let plan = plan_insert(&siblings, new.order);
    debug!(
        course_id = %new.course_id,
        requested = new.order,
        order = plan.order,
        shifted = plan.shifts.len(),
        "unit insert planned"
    );

    if !plan.shifts.is_empty() {
        tx.renumber_units(&plan.shifts).await?;
    }
    let unit = tx.insert_unit(new.course_id, &new.title, plan.order).await?;
    tx.commit().await?;

    info!(unit_id = %unit.id, course_id = %unit.course_id, order = unit.order, "unit created");
    Ok(unit)
}

pub async fn unit(store: &dyn Store, id: UnitId) -> Result<Unit, CatalogError> {
    let mut tx = store.begin().await?;
    tx.unit(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("unit", id))
}

/// The unit plus its lessons in display order.
pub async fn unit_detail(store: &dyn Store, id: UnitId) -> Result<UnitDetail, CatalogError> {
    let mut tx = store.begin().await?;
    let unit = tx
        .unit(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("unit", id))?;
    let lessons = tx.lessons(id).await?;
    Ok(UnitDetail { unit, lessons })
}

/// Units of a course in display order.
pub async fn list_units(store: &dyn Store, course_id: CourseId) -> Result<Vec<Unit>, CatalogError> {
    let mut tx = store.begin().await?;
    if tx.course(course_id).await?.is_none() {
        return Err(CatalogError::not_found("course", course_id));
    }
    tx.units(course_id).await
}

/// Rename and/or move a unit. A move clamps to `[1, N]`; moving onto the
/// current position touches no sibling.
pub async fn update_unit(
    store: &dyn Store,
    id: UnitId,
    patch: UnitPatch,
) -> Result<Unit, CatalogError> {
    if patch.is_empty() {
        return Err(CatalogError::InvalidInput("no fields to update".to_string()));
    }

    let mut tx = store.begin().await?;
    let course_id = tx
        .unit(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("unit", id))?
        .course_id;
    tx.lock_course(course_id, RowLock::Update).await?;

    // Re-read under the lock; the unit may have moved or gone meanwhile.
    let siblings = tx.units(course_id).await?;
    let mut unit = siblings
        .iter()
        .find(|u| u.id == id)
        .cloned()
        .ok_or_else(|| CatalogError::not_found("unit", id))?;

    if let Some(requested) = patch.order {
        let plan = plan_move(&siblings, id, requested)?;
        debug!(
            unit_id = %id,
            from = plan.from,
            to = plan.to,
            shifted = plan.shifts.len(),
            "unit move planned"
        );
        if !plan.shifts.is_empty() {
            tx.renumber_units(&plan.shifts).await?;
        }
        unit.order = plan.to;
    }
    if let Some(title) = patch.title {
        unit.title = title;
    }

    tx.update_unit(&unit).await?;
    tx.commit().await?;

    info!(unit_id = %id, order = unit.order, "unit updated");
    Ok(unit)
}

/// Delete a unit (and its lessons) and close the gap it leaves.
pub async fn remove_unit(store: &dyn Store, id: UnitId) -> Result<(), CatalogError> {
    let mut tx = store.begin().await?;
    let course_id = tx
        .unit(id)
        .await?
        .ok_or_else(|| CatalogError::not_found("unit", id))?
        .course_id;
    tx.lock_course(course_id, RowLock::Update).await?;

    let siblings = tx.units(course_id).await?;
    let plan = plan_remove(&siblings, id)?;

    tx.delete_unit(id).await?;
    if !plan.shifts.is_empty() {
        tx.renumber_units(&plan.shifts).await?;
    }
    tx.commit().await?;

    info!(
        unit_id = %id,
        course_id = %course_id,
        order = plan.removed_order,
        shifted = plan.shifts.len(),
        "unit removed"
    );
    Ok(())
}
