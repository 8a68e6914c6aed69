//! cwk-catalog
//!
//! Stateless catalog and progress operations over an injected [`Store`].
//!
//! Every operation opens one store transaction, reads what it needs, asks
//! the pure planners (`cwk-sequence`, `cwk-progress`) what to write, writes
//! it, and commits. An error anywhere drops the transaction, which rolls
//! everything back.

mod accounts;
mod audit;
mod courses;
mod enrollment;
mod error;
mod lessons;
mod store;
mod units;

pub use accounts::{account, create_account, created_courses, enrolled_courses, remove_account};
pub use audit::{audit_ordering, OrderingViolation, SiblingSet};
pub use courses::{course, course_detail, create_course, list_courses, remove_course, update_course};
pub use enrollment::{enroll, progress_record, set_lesson_status, unenroll, unit_progress};
pub use error::{CatalogError, ErrorKind};
pub use lessons::{create_lesson, lesson, list_lessons, remove_lesson, update_lesson};
pub use store::{RowLock, Store, StoreTx};
pub use units::{create_unit, list_units, remove_unit, unit, unit_detail, update_unit};
