use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cwk_catalog::{CatalogError, RowLock, Store, StoreTx};
use cwk_schemas::{
    Account, Course, CourseId, CoursePatch, Lesson, LessonId, LessonStatus, NewAccount, NewCourse,
    NewProgress, ProgressId, ProgressRecord, Unit, UnitId,
};
use cwk_sequence::Renumber;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;

use crate::error::db_err;

const COURSE_COLS: &str = "course_id, title, creator_username, about, created_at_utc";
const UNIT_COLS: &str = "unit_id, course_id, title, unit_order";
const LESSON_COLS: &str = "lesson_id, unit_id, title, lesson_order, lesson_type, url";
const PROGRESS_COLS: &str =
    "progress_id, learner_username, course_id, unit_id, lesson_id, status, updated_at_utc";

/// Postgres-backed [`Store`]. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: Duration::from_secs(3),
        }
    }

    /// How long a transaction waits on a row or advisory lock before failing
    /// transiently.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, CatalogError> {
        let mut tx = self.pool.begin().await.map_err(db_err("begin"))?;
        sqlx::query("select set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(db_err("set lock_timeout"))?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn decode<T>(what: &str, r: Result<T, sqlx::Error>) -> Result<T, CatalogError> {
    r.map_err(db_err(what))
}

fn account_from_row(row: &PgRow) -> Result<Account, CatalogError> {
    Ok(Account {
        username: decode("account.username", row.try_get("username"))?,
        credential_hash: decode("account.credential_hash", row.try_get("credential_hash"))?,
        created_at_utc: decode::<DateTime<Utc>>(
            "account.created_at_utc",
            row.try_get("created_at_utc"),
        )?,
    })
}

fn course_from_row(row: &PgRow) -> Result<Course, CatalogError> {
    Ok(Course {
        id: CourseId(decode("course.course_id", row.try_get("course_id"))?),
        title: decode("course.title", row.try_get("title"))?,
        creator_username: decode("course.creator_username", row.try_get("creator_username"))?,
        about: decode("course.about", row.try_get("about"))?,
        created_at_utc: decode("course.created_at_utc", row.try_get("created_at_utc"))?,
    })
}

fn unit_from_row(row: &PgRow) -> Result<Unit, CatalogError> {
    Ok(Unit {
        id: UnitId(decode("unit.unit_id", row.try_get("unit_id"))?),
        title: decode("unit.title", row.try_get("title"))?,
        course_id: CourseId(decode("unit.course_id", row.try_get("course_id"))?),
        order: decode("unit.unit_order", row.try_get("unit_order"))?,
    })
}

fn lesson_from_row(row: &PgRow) -> Result<Lesson, CatalogError> {
    Ok(Lesson {
        id: LessonId(decode("lesson.lesson_id", row.try_get("lesson_id"))?),
        title: decode("lesson.title", row.try_get("title"))?,
        unit_id: UnitId(decode("lesson.unit_id", row.try_get("unit_id"))?),
        order: decode("lesson.lesson_order", row.try_get("lesson_order"))?,
        lesson_type: decode("lesson.lesson_type", row.try_get("lesson_type"))?,
        url: decode("lesson.url", row.try_get("url"))?,
    })
}

fn progress_from_row(row: &PgRow) -> Result<ProgressRecord, CatalogError> {
    let status: String = decode("progress.status", row.try_get("status"))?;
    Ok(ProgressRecord {
        id: ProgressId(decode("progress.progress_id", row.try_get("progress_id"))?),
        learner_username: decode("progress.learner_username", row.try_get("learner_username"))?,
        course_id: CourseId(decode("progress.course_id", row.try_get("course_id"))?),
        unit_id: UnitId(decode("progress.unit_id", row.try_get("unit_id"))?),
        lesson_id: LessonId(decode("progress.lesson_id", row.try_get("lesson_id"))?),
        status: LessonStatus::parse(&status).map_err(|e| CatalogError::storage(e.to_string()))?,
        updated_at_utc: decode("progress.updated_at_utc", row.try_get("updated_at_utc"))?,
    })
}

fn collect<T>(
    rows: Vec<PgRow>,
    f: fn(&PgRow) -> Result<T, CatalogError>,
) -> Result<Vec<T>, CatalogError> {
    rows.iter().map(f).collect()
}

fn lock_clause(lock: RowLock) -> &'static str {
    match lock {
        RowLock::Update => "for update",
        RowLock::Share => "for share",
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self: Box<Self>) -> Result<(), CatalogError> {
        // Deferred order constraints are checked here.
        self.tx.commit().await.map_err(db_err("commit"))
    }

    // -- accounts ----------------------------------------------------------

    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account, CatalogError> {
        let row = sqlx::query(
            r#"
            insert into accounts (username, credential_hash)
            values ($1, $2)
            returning username, credential_hash, created_at_utc
            "#,
        )
        .bind(&account.username)
        .bind(&account.credential_hash)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match crate::error::classify("insert account", e) {
            CatalogError::Conflict(_) => {
                CatalogError::Conflict(format!("username {} is taken", account.username))
            }
            other => other,
        })?;
        account_from_row(&row)
    }

    async fn account(&mut self, username: &str) -> Result<Option<Account>, CatalogError> {
        let row = sqlx::query(
            "select username, credential_hash, created_at_utc from accounts where username = $1",
        )
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err("select account"))?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn delete_account(&mut self, username: &str) -> Result<bool, CatalogError> {
        let res = sqlx::query("delete from accounts where username = $1")
            .bind(username)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("delete account"))?;
        Ok(res.rows_affected() == 1)
    }

    // -- courses -----------------------------------------------------------

    async fn insert_course(&mut self, course: &NewCourse) -> Result<Course, CatalogError> {
        let row = sqlx::query(&format!(
            "insert into courses (title, creator_username, about) values ($1, $2, $3) \
             returning {COURSE_COLS}"
        ))
        .bind(&course.title)
        .bind(&course.creator_username)
        .bind(&course.about)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err("insert course"))?;
        course_from_row(&row)
    }

    async fn course(&mut self, id: CourseId) -> Result<Option<Course>, CatalogError> {
        let row = sqlx::query(&format!(
            "select {COURSE_COLS} from courses where course_id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err("select course"))?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn lock_course(
        &mut self,
        id: CourseId,
        lock: RowLock,
    ) -> Result<Option<Course>, CatalogError> {
        let row = sqlx::query(&format!(
            "select {COURSE_COLS} from courses where course_id = $1 {}",
            lock_clause(lock)
        ))
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err("lock course"))?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn courses(&mut self) -> Result<Vec<Course>, CatalogError> {
        let rows = sqlx::query(&format!(
            "select {COURSE_COLS} from courses order by title, course_id"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err("select courses"))?;
        collect(rows, course_from_row)
    }

    async fn courses_created_by(&mut self, username: &str) -> Result<Vec<Course>, CatalogError> {
        let rows = sqlx::query(&format!(
            "select {COURSE_COLS} from courses where creator_username = $1 \
             order by title, course_id"
        ))
        .bind(username)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err("select created courses"))?;
        collect(rows, course_from_row)
    }

    async fn courses_enrolled_by(&mut self, username: &str) -> Result<Vec<Course>, CatalogError> {
        let rows = sqlx::query(&format!(
            r#"
            select {COURSE_COLS} from courses c
            where exists (
                select 1 from progress p
                where p.course_id = c.course_id and p.learner_username = $1
            )
            order by title, course_id
            "#
        ))
        .bind(username)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err("select enrolled courses"))?;
        collect(rows, course_from_row)
    }

    async fn update_course(
        &mut self,
        id: CourseId,
        patch: &CoursePatch,
    ) -> Result<Option<Course>, CatalogError> {
        let row = sqlx::query(&format!(
            "update courses set title = coalesce($2, title), about = coalesce($3, about) \
             where course_id = $1 returning {COURSE_COLS}"
        ))
        .bind(id.0)
        .bind(patch.title.as_deref())
        .bind(patch.about.as_deref())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err("update course"))?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn delete_course(&mut self, id: CourseId) -> Result<bool, CatalogError> {
        let res = sqlx::query("delete from courses where course_id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("delete course"))?;
        Ok(res.rows_affected() == 1)
    }

    // -- units -------------------------------------------------------------

    async fn units(&mut self, course_id: CourseId) -> Result<Vec<Unit>, CatalogError> {
        let rows = sqlx::query(&format!(
            "select {UNIT_COLS} from units where course_id = $1 order by unit_order, unit_id"
        ))
        .bind(course_id.0)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err("select units"))?;
        collect(rows, unit_from_row)
    }

    async fn unit(&mut self, id: UnitId) -> Result<Option<Unit>, CatalogError> {
        let row = sqlx::query(&format!("select {UNIT_COLS} from units where unit_id = $1"))
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err("select unit"))?;
        row.as_ref().map(unit_from_row).transpose()
    }

    async fn lock_unit(
        &mut self,
        id: UnitId,
        lock: RowLock,
    ) -> Result<Option<Unit>, CatalogError> {
        let row = sqlx::query(&format!(
            "select {UNIT_COLS} from units where unit_id = $1 {}",
            lock_clause(lock)
        ))
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err("lock unit"))?;
        row.as_ref().map(unit_from_row).transpose()
    }

    async fn insert_unit(
        &mut self,
        course_id: CourseId,
        title: &str,
        order: i32,
    ) -> Result<Unit, CatalogError> {
        let row = sqlx::query(&format!(
            "insert into units (course_id, title, unit_order) values ($1, $2, $3) \
             returning {UNIT_COLS}"
        ))
        .bind(course_id.0)
        .bind(title)
        .bind(order)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err("insert unit"))?;
        unit_from_row(&row)
    }

    async fn update_unit(&mut self, unit: &Unit) -> Result<(), CatalogError> {
        sqlx::query("update units set title = $2, unit_order = $3 where unit_id = $1")
            .bind(unit.id.0)
            .bind(&unit.title)
            .bind(unit.order)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("update unit"))?;
        Ok(())
    }

    async fn delete_unit(&mut self, id: UnitId) -> Result<bool, CatalogError> {
        let res = sqlx::query("delete from units where unit_id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("delete unit"))?;
        Ok(res.rows_affected() == 1)
    }

    async fn renumber_units(&mut self, changes: &[Renumber<UnitId>]) -> Result<(), CatalogError> {
        let ids: Vec<i64> = changes.iter().map(|c| c.id.0).collect();
        let orders: Vec<i32> = changes.iter().map(|c| c.order).collect();
        let res = sqlx::query(
            r#"
            update units u
            set unit_order = v.new_order
            from unnest($1::bigint[], $2::integer[]) as v(unit_id, new_order)
            where u.unit_id = v.unit_id
            "#,
        )
        .bind(&ids)
        .bind(&orders)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("renumber units"))?;
        debug!(rows = res.rows_affected(), "units renumbered");
        Ok(())
    }

    // -- lessons -----------------------------------------------------------

    async fn lessons(&mut self, unit_id: UnitId) -> Result<Vec<Lesson>, CatalogError> {
        let rows = sqlx::query(&format!(
            "select {LESSON_COLS} from lessons where unit_id = $1 \
             order by lesson_order, lesson_id"
        ))
        .bind(unit_id.0)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err("select lessons"))?;
        collect(rows, lesson_from_row)
    }

    async fn lesson(&mut self, id: LessonId) -> Result<Option<Lesson>, CatalogError> {
        let row = sqlx::query(&format!(
            "select {LESSON_COLS} from lessons where lesson_id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err("select lesson"))?;
        row.as_ref().map(lesson_from_row).transpose()
    }

    async fn insert_lesson(
        &mut self,
        unit_id: UnitId,
        title: &str,
        order: i32,
        lesson_type: &str,
        url: &str,
    ) -> Result<Lesson, CatalogError> {
        let row = sqlx::query(&format!(
            "insert into lessons (unit_id, title, lesson_order, lesson_type, url) \
             values ($1, $2, $3, $4, $5) returning {LESSON_COLS}"
        ))
        .bind(unit_id.0)
        .bind(title)
        .bind(order)
        .bind(lesson_type)
        .bind(url)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err("insert lesson"))?;
        lesson_from_row(&row)
    }

    async fn update_lesson(&mut self, lesson: &Lesson) -> Result<(), CatalogError> {
        sqlx::query(
            "update lessons set title = $2, lesson_order = $3, url = $4 where lesson_id = $1",
        )
        .bind(lesson.id.0)
        .bind(&lesson.title)
        .bind(lesson.order)
        .bind(&lesson.url)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("update lesson"))?;
        Ok(())
    }

    async fn delete_lesson(&mut self, id: LessonId) -> Result<bool, CatalogError> {
        let res = sqlx::query("delete from lessons where lesson_id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("delete lesson"))?;
        Ok(res.rows_affected() == 1)
    }

    async fn renumber_lessons(
        &mut self,
        changes: &[Renumber<LessonId>],
    ) -> Result<(), CatalogError> {
        let ids: Vec<i64> = changes.iter().map(|c| c.id.0).collect();
        let orders: Vec<i32> = changes.iter().map(|c| c.order).collect();
        let res = sqlx::query(
            r#"
            update lessons l
            set lesson_order = v.new_order
            from unnest($1::bigint[], $2::integer[]) as v(lesson_id, new_order)
            where l.lesson_id = v.lesson_id
            "#,
        )
        .bind(&ids)
        .bind(&orders)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err("renumber lessons"))?;
        debug!(rows = res.rows_affected(), "lessons renumbered");
        Ok(())
    }

    // -- progress ----------------------------------------------------------

    async fn lock_enrollment(
        &mut self,
        learner: &str,
        course_id: CourseId,
    ) -> Result<(), CatalogError> {
        sqlx::query("select pg_advisory_xact_lock(hashtextextended($1, $2))")
            .bind(learner)
            .bind(course_id.0)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("lock enrollment"))?;
        Ok(())
    }

    async fn count_progress(
        &mut self,
        learner: &str,
        course_id: CourseId,
    ) -> Result<u64, CatalogError> {
        let (n,): (i64,) = sqlx::query_as::<_, (i64,)>(
            "select count(*)::bigint from progress where learner_username = $1 and course_id = $2",
        )
        .bind(learner)
        .bind(course_id.0)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_err("count progress"))?;
        Ok(n.max(0) as u64)
    }

    async fn unit_progress(
        &mut self,
        learner: &str,
        unit_id: UnitId,
    ) -> Result<Vec<ProgressRecord>, CatalogError> {
        let rows = sqlx::query(&format!(
            "select {PROGRESS_COLS} from progress \
             where learner_username = $1 and unit_id = $2 \
             order by lesson_id, progress_id"
        ))
        .bind(learner)
        .bind(unit_id.0)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err("select unit progress"))?;
        collect(rows, progress_from_row)
    }

    async fn insert_progress(
        &mut self,
        rows: &[NewProgress],
    ) -> Result<Vec<ProgressRecord>, CatalogError> {
        let learners: Vec<&str> = rows.iter().map(|r| r.learner_username.as_str()).collect();
        let courses: Vec<i64> = rows.iter().map(|r| r.course_id.0).collect();
        let units: Vec<i64> = rows.iter().map(|r| r.unit_id.0).collect();
        let lessons: Vec<i64> = rows.iter().map(|r| r.lesson_id.0).collect();
        let statuses: Vec<&str> = rows.iter().map(|r| r.status.as_str()).collect();

        let out = sqlx::query(&format!(
            r#"
            insert into progress (learner_username, course_id, unit_id, lesson_id, status)
            select * from unnest($1::text[], $2::bigint[], $3::bigint[], $4::bigint[], $5::text[])
            returning {PROGRESS_COLS}
            "#
        ))
        .bind(&learners)
        .bind(&courses)
        .bind(&units)
        .bind(&lessons)
        .bind(&statuses)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_err("insert progress"))?;
        collect(out, progress_from_row)
    }

    async fn delete_progress(&mut self, ids: &[ProgressId]) -> Result<u64, CatalogError> {
        let ids: Vec<i64> = ids.iter().map(|id| id.0).collect();
        let res = sqlx::query("delete from progress where progress_id = any($1)")
            .bind(&ids)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err("delete progress"))?;
        Ok(res.rows_affected())
    }

    async fn delete_course_progress(
        &mut self,
        learner: &str,
        course_id: CourseId,
    ) -> Result<u64, CatalogError> {
        let res =
            sqlx::query("delete from progress where learner_username = $1 and course_id = $2")
                .bind(learner)
                .bind(course_id.0)
                .execute(&mut *self.tx)
                .await
                .map_err(db_err("delete course progress"))?;
        Ok(res.rows_affected())
    }

    async fn progress(&mut self, id: ProgressId) -> Result<Option<ProgressRecord>, CatalogError> {
        let row = sqlx::query(&format!(
            "select {PROGRESS_COLS} from progress where progress_id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err("select progress"))?;
        row.as_ref().map(progress_from_row).transpose()
    }

    async fn set_progress_status(
        &mut self,
        id: ProgressId,
        status: LessonStatus,
    ) -> Result<Option<ProgressRecord>, CatalogError> {
        let row = sqlx::query(&format!(
            "update progress set status = $2, updated_at_utc = now() \
             where progress_id = $1 returning {PROGRESS_COLS}"
        ))
        .bind(id.0)
        .bind(status.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err("update progress status"))?;
        row.as_ref().map(progress_from_row).transpose()
    }
}
