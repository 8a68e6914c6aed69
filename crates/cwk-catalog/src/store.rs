//! Storage contract for the catalog operations.
//!
//! A [`Store`] hands out [`StoreTx`] transactions. Everything an operation
//! reads and writes goes through one transaction; `commit` makes it visible,
//! dropping the transaction without committing discards it.
//!
//! Row locks are the serialization points:
//! - sibling mutations lock the parent row [`RowLock::Update`] (course for
//!   units, unit for lessons);
//! - progress reads/enrollment take [`RowLock::Share`] on the parent plus
//!   [`StoreTx::lock_enrollment`] for the (learner, course) pair.

use async_trait::async_trait;
use cwk_schemas::{
    Account, Course, CourseId, CoursePatch, Lesson, LessonId, LessonStatus, NewAccount, NewCourse,
    NewProgress, ProgressId, ProgressRecord, Unit, UnitId,
};
use cwk_sequence::Renumber;

use crate::CatalogError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowLock {
    /// Exclusive: blocks other `Update` and `Share` lockers.
    Update,
    /// Shared: blocks `Update` lockers only.
    Share,
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, CatalogError>;
}

/// One open storage transaction.
#[async_trait]
pub trait StoreTx: Send {
    async fn commit(self: Box<Self>) -> Result<(), CatalogError>;

    // -- accounts ----------------------------------------------------------

    /// Fails with `Conflict` when the username is taken.
    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account, CatalogError>;
    async fn account(&mut self, username: &str) -> Result<Option<Account>, CatalogError>;
    /// Cascades to the account's courses and progress rows.
    async fn delete_account(&mut self, username: &str) -> Result<bool, CatalogError>;

    // -- courses -----------------------------------------------------------

    async fn insert_course(&mut self, course: &NewCourse) -> Result<Course, CatalogError>;
    async fn course(&mut self, id: CourseId) -> Result<Option<Course>, CatalogError>;
    async fn lock_course(
        &mut self,
        id: CourseId,
        lock: RowLock,
    ) -> Result<Option<Course>, CatalogError>;
    /// All courses ordered by title.
    async fn courses(&mut self) -> Result<Vec<Course>, CatalogError>;
    async fn courses_created_by(&mut self, username: &str) -> Result<Vec<Course>, CatalogError>;
    /// Courses the learner holds at least one progress row for, by title.
    async fn courses_enrolled_by(&mut self, username: &str) -> Result<Vec<Course>, CatalogError>;
    async fn update_course(
        &mut self,
        id: CourseId,
        patch: &CoursePatch,
    ) -> Result<Option<Course>, CatalogError>;
    /// Cascades to units, lessons and progress rows.
    async fn delete_course(&mut self, id: CourseId) -> Result<bool, CatalogError>;

    // -- units -------------------------------------------------------------

    /// Units of a course in display order.
    async fn units(&mut self, course_id: CourseId) -> Result<Vec<Unit>, CatalogError>;
    async fn unit(&mut self, id: UnitId) -> Result<Option<Unit>, CatalogError>;
    async fn lock_unit(&mut self, id: UnitId, lock: RowLock)
        -> Result<Option<Unit>, CatalogError>;
    async fn insert_unit(
        &mut self,
        course_id: CourseId,
        title: &str,
        order: i32,
    ) -> Result<Unit, CatalogError>;
    /// Writes title and order of an existing unit.
    async fn update_unit(&mut self, unit: &Unit) -> Result<(), CatalogError>;
    /// Cascades to the unit's lessons and progress rows.
    async fn delete_unit(&mut self, id: UnitId) -> Result<bool, CatalogError>;
    /// Apply a batch of order changes as one write.
    async fn renumber_units(&mut self, changes: &[Renumber<UnitId>]) -> Result<(), CatalogError>;

    // -- lessons -----------------------------------------------------------

    /// Lessons of a unit in display order.
    async fn lessons(&mut self, unit_id: UnitId) -> Result<Vec<Lesson>, CatalogError>;
    async fn lesson(&mut self, id: LessonId) -> Result<Option<Lesson>, CatalogError>;
    async fn insert_lesson(
        &mut self,
        unit_id: UnitId,
        title: &str,
        order: i32,
        lesson_type: &str,
        url: &str,
    ) -> Result<Lesson, CatalogError>;
    /// Writes title, order and url of an existing lesson.
    async fn update_lesson(&mut self, lesson: &Lesson) -> Result<(), CatalogError>;
    /// Progress rows referencing the lesson are left for reconciliation.
    async fn delete_lesson(&mut self, id: LessonId) -> Result<bool, CatalogError>;
    async fn renumber_lessons(
        &mut self,
        changes: &[Renumber<LessonId>],
    ) -> Result<(), CatalogError>;

    // -- progress ----------------------------------------------------------

    /// Serialize enrollment changes and reconciliation for one learner in
    /// one course until the transaction ends.
    async fn lock_enrollment(
        &mut self,
        learner: &str,
        course_id: CourseId,
    ) -> Result<(), CatalogError>;
    async fn count_progress(
        &mut self,
        learner: &str,
        course_id: CourseId,
    ) -> Result<u64, CatalogError>;
    /// The learner's rows for one unit, ordered by referenced lesson id.
    async fn unit_progress(
        &mut self,
        learner: &str,
        unit_id: UnitId,
    ) -> Result<Vec<ProgressRecord>, CatalogError>;
    async fn insert_progress(
        &mut self,
        rows: &[NewProgress],
    ) -> Result<Vec<ProgressRecord>, CatalogError>;
    async fn delete_progress(&mut self, ids: &[ProgressId]) -> Result<u64, CatalogError>;
    async fn delete_course_progress(
        &mut self,
        learner: &str,
        course_id: CourseId,
    ) -> Result<u64, CatalogError>;
    async fn progress(&mut self, id: ProgressId) -> Result<Option<ProgressRecord>, CatalogError>;
    async fn set_progress_status(
        &mut self,
        id: ProgressId,
        status: LessonStatus,
    ) -> Result<Option<ProgressRecord>, CatalogError>;
}
