use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use cwk_catalog::{CatalogError, RowLock, Store, StoreTx};
use cwk_schemas::{
    Account, Course, CourseId, CoursePatch, Lesson, LessonId, LessonStatus, NewAccount, NewCourse,
    NewProgress, ProgressId, ProgressRecord, Unit, UnitId,
};
use cwk_sequence::Renumber;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Every table of the store. Fields are public so tests can inspect state
/// or plant drift directly.
#[derive(Clone, Debug, Default)]
pub struct MemState {
    pub accounts: BTreeMap<String, Account>,
    pub courses: BTreeMap<CourseId, Course>,
    pub units: BTreeMap<UnitId, Unit>,
    pub lessons: BTreeMap<LessonId, Lesson>,
    pub progress: BTreeMap<ProgressId, ProgressRecord>,
    next_id: i64,
}

impl MemState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn units_of(&self, course_id: CourseId) -> Vec<Unit> {
        let mut v: Vec<Unit> = self
            .units
            .values()
            .filter(|u| u.course_id == course_id)
            .cloned()
            .collect();
        v.sort_by_key(|u| (u.order, u.id));
        v
    }

    fn lessons_of(&self, unit_id: UnitId) -> Vec<Lesson> {
        let mut v: Vec<Lesson> = self
            .lessons
            .values()
            .filter(|l| l.unit_id == unit_id)
            .cloned()
            .collect();
        v.sort_by_key(|l| (l.order, l.id));
        v
    }

    fn sorted_by_title(mut v: Vec<Course>) -> Vec<Course> {
        v.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        v
    }

    fn remove_unit_cascade(&mut self, id: UnitId) {
        self.units.remove(&id);
        self.lessons.retain(|_, l| l.unit_id != id);
        self.progress.retain(|_, p| p.unit_id != id);
    }

    fn remove_course_cascade(&mut self, id: CourseId) {
        self.courses.remove(&id);
        let units: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.course_id == id)
            .map(|u| u.id)
            .collect();
        for u in units {
            self.remove_unit_cascade(u);
        }
        self.progress.retain(|_, p| p.course_id != id);
    }

    /// The deferred `(parent, order)` uniqueness checks, run at commit.
    fn check_unique_orders(&self) -> Result<(), CatalogError> {
        let mut seen = BTreeSet::new();
        for u in self.units.values() {
            if !seen.insert((u.course_id.0, u.order)) {
                return Err(CatalogError::storage(format!(
                    "duplicate unit order {} in course {}",
                    u.order, u.course_id
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for l in self.lessons.values() {
            if !seen.insert((l.unit_id.0, l.order)) {
                return Err(CatalogError::storage(format!(
                    "duplicate lesson order {} in unit {}",
                    l.order, l.unit_id
                )));
            }
        }
        Ok(())
    }
}

/// In-memory store. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemStore {
    state: Arc<Mutex<MemState>>,
    fail_next_commit: Arc<AtomicBool>,
    write_commits: Arc<AtomicU64>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the committed state.
    pub async fn snapshot(&self) -> MemState {
        self.state.lock().await.clone()
    }

    /// Mutate committed state directly, bypassing every rule.
    pub async fn tamper<F: FnOnce(&mut MemState)>(&self, f: F) {
        let mut guard = self.state.lock().await;
        f(&mut guard);
    }

    /// Make the next commit fail with a transient error, discarding its writes.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of committed transactions that wrote anything.
    pub fn write_commits(&self) -> u64 {
        self.write_commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for MemStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, CatalogError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemTx {
            guard,
            work,
            wrote: false,
            fail_commit: self.fail_next_commit.clone(),
            write_commits: self.write_commits.clone(),
        }))
    }
}

/// Holds the store mutex for its whole life; writes land in `work` and are
/// swapped in on commit.
struct MemTx {
    guard: OwnedMutexGuard<MemState>,
    work: MemState,
    wrote: bool,
    fail_commit: Arc<AtomicBool>,
    write_commits: Arc<AtomicU64>,
}

impl MemTx {
    fn touch(&mut self) -> &mut MemState {
        self.wrote = true;
        &mut self.work
    }
}

#[async_trait]
impl StoreTx for MemTx {
    async fn commit(self: Box<Self>) -> Result<(), CatalogError> {
        let mut this = *self;
        if this.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(CatalogError::transient("injected commit failure"));
        }
        if !this.wrote {
            return Ok(());
        }
        this.work.check_unique_orders()?;
        *this.guard = this.work;
        this.write_commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    // -- accounts ----------------------------------------------------------

    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account, CatalogError> {
        if self.work.accounts.contains_key(&account.username) {
            return Err(CatalogError::Conflict(format!(
                "username {} is taken",
                account.username
            )));
        }
        let row = Account {
            username: account.username.clone(),
            credential_hash: account.credential_hash.clone(),
            created_at_utc: Utc::now(),
        };
        self.touch()
            .accounts
            .insert(row.username.clone(), row.clone());
        Ok(row)
    }

    async fn account(&mut self, username: &str) -> Result<Option<Account>, CatalogError> {
        Ok(self.work.accounts.get(username).cloned())
    }

    async fn delete_account(&mut self, username: &str) -> Result<bool, CatalogError> {
        if !self.work.accounts.contains_key(username) {
            return Ok(false);
        }
        let st = self.touch();
        st.accounts.remove(username);
        let owned: Vec<CourseId> = st
            .courses
            .values()
            .filter(|c| c.creator_username == username)
            .map(|c| c.id)
            .collect();
        for c in owned {
            st.remove_course_cascade(c);
        }
        st.progress.retain(|_, p| p.learner_username != username);
        Ok(true)
    }

    // -- courses -----------------------------------------------------------

    async fn insert_course(&mut self, course: &NewCourse) -> Result<Course, CatalogError> {
        if !self.work.accounts.contains_key(&course.creator_username) {
            return Err(CatalogError::storage(format!(
                "foreign key: account {} missing",
                course.creator_username
            )));
        }
        let st = self.touch();
        let row = Course {
            id: CourseId(st.next_id()),
            title: course.title.clone(),
            creator_username: course.creator_username.clone(),
            about: course.about.clone(),
            created_at_utc: Utc::now(),
        };
        st.courses.insert(row.id, row.clone());
        Ok(row)
    }

    async fn course(&mut self, id: CourseId) -> Result<Option<Course>, CatalogError> {
        Ok(self.work.courses.get(&id).cloned())
    }

    async fn lock_course(
        &mut self,
        id: CourseId,
        _lock: RowLock,
    ) -> Result<Option<Course>, CatalogError> {
        Ok(self.work.courses.get(&id).cloned())
    }

    async fn courses(&mut self) -> Result<Vec<Course>, CatalogError> {
        Ok(MemState::sorted_by_title(
            self.work.courses.values().cloned().collect(),
        ))
    }

    async fn courses_created_by(&mut self, username: &str) -> Result<Vec<Course>, CatalogError> {
        Ok(MemState::sorted_by_title(
            self.work
                .courses
                .values()
                .filter(|c| c.creator_username == username)
                .cloned()
                .collect(),
        ))
    }

    async fn courses_enrolled_by(&mut self, username: &str) -> Result<Vec<Course>, CatalogError> {
        let ids: BTreeSet<CourseId> = self
            .work
            .progress
            .values()
            .filter(|p| p.learner_username == username)
            .map(|p| p.course_id)
            .collect();
        Ok(MemState::sorted_by_title(
            ids.iter()
                .filter_map(|id| self.work.courses.get(id).cloned())
                .collect(),
        ))
    }

    async fn update_course(
        &mut self,
        id: CourseId,
        patch: &CoursePatch,
    ) -> Result<Option<Course>, CatalogError> {
        if !self.work.courses.contains_key(&id) {
            return Ok(None);
        }
        let st = self.touch();
        let Some(course) = st.courses.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            course.title = title.clone();
        }
        if let Some(about) = &patch.about {
            course.about = about.clone();
        }
        Ok(Some(course.clone()))
    }

    async fn delete_course(&mut self, id: CourseId) -> Result<bool, CatalogError> {
        if !self.work.courses.contains_key(&id) {
            return Ok(false);
        }
        self.touch().remove_course_cascade(id);
        Ok(true)
    }

    // -- units -------------------------------------------------------------

    async fn units(&mut self, course_id: CourseId) -> Result<Vec<Unit>, CatalogError> {
        Ok(self.work.units_of(course_id))
    }

    async fn unit(&mut self, id: UnitId) -> Result<Option<Unit>, CatalogError> {
        Ok(self.work.units.get(&id).cloned())
    }

    async fn lock_unit(
        &mut self,
        id: UnitId,
        _lock: RowLock,
    ) -> Result<Option<Unit>, CatalogError> {
        Ok(self.work.units.get(&id).cloned())
    }

    async fn insert_unit(
        &mut self,
        course_id: CourseId,
        title: &str,
        order: i32,
    ) -> Result<Unit, CatalogError> {
        if !self.work.courses.contains_key(&course_id) {
            return Err(CatalogError::storage(format!(
                "foreign key: course {course_id} missing"
            )));
        }
        let st = self.touch();
        let row = Unit {
            id: UnitId(st.next_id()),
            title: title.to_string(),
            course_id,
            order,
        };
        st.units.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_unit(&mut self, unit: &Unit) -> Result<(), CatalogError> {
        let st = self.touch();
        if let Some(row) = st.units.get_mut(&unit.id) {
            row.title = unit.title.clone();
            row.order = unit.order;
        }
        Ok(())
    }

    async fn delete_unit(&mut self, id: UnitId) -> Result<bool, CatalogError> {
        if !self.work.units.contains_key(&id) {
            return Ok(false);
        }
        self.touch().remove_unit_cascade(id);
        Ok(true)
    }

    async fn renumber_units(&mut self, changes: &[Renumber<UnitId>]) -> Result<(), CatalogError> {
        let st = self.touch();
        for c in changes {
            if let Some(row) = st.units.get_mut(&c.id) {
                row.order = c.order;
            }
        }
        Ok(())
    }

    // -- lessons -----------------------------------------------------------

    async fn lessons(&mut self, unit_id: UnitId) -> Result<Vec<Lesson>, CatalogError> {
        Ok(self.work.lessons_of(unit_id))
    }

    async fn lesson(&mut self, id: LessonId) -> Result<Option<Lesson>, CatalogError> {
        Ok(self.work.lessons.get(&id).cloned())
    }

    async fn insert_lesson(
        &mut self,
        unit_id: UnitId,
        title: &str,
        order: i32,
        lesson_type: &str,
        url: &str,
    ) -> Result<Lesson, CatalogError> {
        if !self.work.units.contains_key(&unit_id) {
            return Err(CatalogError::storage(format!(
                "foreign key: unit {unit_id} missing"
            )));
        }
        let st = self.touch();
        let row = Lesson {
            id: LessonId(st.next_id()),
            title: title.to_string(),
            unit_id,
            order,
            lesson_type: lesson_type.to_string(),
            url: url.to_string(),
        };
        st.lessons.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_lesson(&mut self, lesson: &Lesson) -> Result<(), CatalogError> {
        let st = self.touch();
        if let Some(row) = st.lessons.get_mut(&lesson.id) {
            row.title = lesson.title.clone();
            row.order = lesson.order;
            row.url = lesson.url.clone();
        }
        Ok(())
    }

    async fn delete_lesson(&mut self, id: LessonId) -> Result<bool, CatalogError> {
        if !self.work.lessons.contains_key(&id) {
            return Ok(false);
        }
        self.touch().lessons.remove(&id);
        Ok(true)
    }

    async fn renumber_lessons(
        &mut self,
        changes: &[Renumber<LessonId>],
    ) -> Result<(), CatalogError> {
        let st = self.touch();
        for c in changes {
            if let Some(row) = st.lessons.get_mut(&c.id) {
                row.order = c.order;
            }
        }
        Ok(())
    }

    // -- progress ----------------------------------------------------------

    async fn lock_enrollment(
        &mut self,
        _learner: &str,
        _course_id: CourseId,
    ) -> Result<(), CatalogError> {
        // The store mutex already serializes every transaction.
        Ok(())
    }

    async fn count_progress(
        &mut self,
        learner: &str,
        course_id: CourseId,
    ) -> Result<u64, CatalogError> {
        Ok(self
            .work
            .progress
            .values()
            .filter(|p| p.learner_username == learner && p.course_id == course_id)
            .count() as u64)
    }

    async fn unit_progress(
        &mut self,
        learner: &str,
        unit_id: UnitId,
    ) -> Result<Vec<ProgressRecord>, CatalogError> {
        let mut v: Vec<ProgressRecord> = self
            .work
            .progress
            .values()
            .filter(|p| p.learner_username == learner && p.unit_id == unit_id)
            .cloned()
            .collect();
        v.sort_by_key(|p| (p.lesson_id, p.id));
        Ok(v)
    }

    async fn insert_progress(
        &mut self,
        rows: &[NewProgress],
    ) -> Result<Vec<ProgressRecord>, CatalogError> {
        let st = self.touch();
        let mut out = Vec::with_capacity(rows.len());
        for n in rows {
            let taken = st
                .progress
                .values()
                .any(|p| p.learner_username == n.learner_username && p.lesson_id == n.lesson_id);
            if taken {
                return Err(CatalogError::Conflict(format!(
                    "progress for lesson {} already exists for {}",
                    n.lesson_id, n.learner_username
                )));
            }
            let row = ProgressRecord {
                id: ProgressId(st.next_id()),
                learner_username: n.learner_username.clone(),
                course_id: n.course_id,
                unit_id: n.unit_id,
                lesson_id: n.lesson_id,
                status: n.status,
                updated_at_utc: Utc::now(),
            };
            st.progress.insert(row.id, row.clone());
            out.push(row);
        }
        Ok(out)
    }

    async fn delete_progress(&mut self, ids: &[ProgressId]) -> Result<u64, CatalogError> {
        let st = self.touch();
        let removed = ids
            .iter()
            .filter(|id| st.progress.remove(*id).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn delete_course_progress(
        &mut self,
        learner: &str,
        course_id: CourseId,
    ) -> Result<u64, CatalogError> {
        let st = self.touch();
        let before = st.progress.len();
        st.progress
            .retain(|_, p| !(p.learner_username == learner && p.course_id == course_id));
        Ok((before - st.progress.len()) as u64)
    }

    async fn progress(&mut self, id: ProgressId) -> Result<Option<ProgressRecord>, CatalogError> {
        Ok(self.work.progress.get(&id).cloned())
    }

    async fn set_progress_status(
        &mut self,
        id: ProgressId,
        status: LessonStatus,
    ) -> Result<Option<ProgressRecord>, CatalogError> {
        if !self.work.progress.contains_key(&id) {
            return Ok(None);
        }
        let st = self.touch();
        let Some(row) = st.progress.get_mut(&id) else {
            return Ok(None);
        };
        row.status = status;
        row.updated_at_utc = Utc::now();
        Ok(Some(row.clone()))
    }
}
