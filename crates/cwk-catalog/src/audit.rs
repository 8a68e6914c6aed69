//! Read-only sweep over every sibling set, checking that orders are dense.

use cwk_schemas::{CourseId, UnitId};
use cwk_sequence::{check_siblings, DensityViolation};
use tracing::{info, warn};

use crate::{CatalogError, Store};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiblingSet {
    Units(CourseId),
    Lessons(UnitId),
}

impl std::fmt::Display for SiblingSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiblingSet::Units(c) => write!(f, "units of course {c}"),
            SiblingSet::Lessons(u) => write!(f, "lessons of unit {u}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderingViolation {
    pub set: SiblingSet,
    pub violation: DensityViolation,
}

impl std::fmt::Display for OrderingViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.set, self.violation)
    }
}

/// Check every course's units and every unit's lessons. Returns the sets
/// whose orders are not exactly `1..=N`; an empty result means clean.
pub async fn audit_ordering(store: &dyn Store) -> Result<Vec<OrderingViolation>, CatalogError> {
    let mut tx = store.begin().await?;
    let mut out = Vec::new();
    let mut sets = 0usize;

    for course in tx.courses().await? {
        let units = tx.units(course.id).await?;
        sets += 1;
        if let Err(violation) = check_siblings(&units) {
            out.push(OrderingViolation {
                set: SiblingSet::Units(course.id),
                violation,
            });
        }
        for unit in &units {
            let lessons = tx.lessons(unit.id).await?;
            sets += 1;
            if let Err(violation) = check_siblings(&lessons) {
                out.push(OrderingViolation {
                    set: SiblingSet::Lessons(unit.id),
                    violation,
                });
            }
        }
    }

    for v in &out {
        warn!(set = %v.set, "{}", v.violation);
    }
    info!(sets, violations = out.len(), "ordering audit finished");
    Ok(out)
}
