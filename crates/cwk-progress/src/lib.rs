//! cwk-progress
//!
//! Learner progress planning:
//! - Reconciliation of a learner's progress rows against a unit's lessons
//! - A lesson with no progress row gets a new `incomplete` row
//! - A progress row whose lesson is gone is discarded
//! - Enrollment materializes one `incomplete` row per lesson
//!
//! Deterministic, pure logic. No IO. The catalog service applies the plans
//! inside a storage transaction.

mod enroll;
mod merge;

pub use enroll::enrollment_rows;
pub use merge::{reconcile, reconcile_unit, MergeEntry, ReconcilePlan, UnmatchedLesson};
