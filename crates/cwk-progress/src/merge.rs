use cwk_schemas::{
    CourseId, Lesson, LessonId, LessonProgress, LessonStatus, NewProgress, ProgressId,
    ProgressRecord,
};

/// One lesson's slot in the merged output, in lesson-id order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeEntry {
    /// Lesson and progress row agree.
    Matched(LessonProgress),
    /// Lesson has no progress row yet; one must be created.
    Pending(Lesson),
}

/// What it takes to bring a learner's rows for one unit in line with the
/// unit's lessons.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Emitted entries in ascending lesson id.
    pub entries: Vec<MergeEntry>,
    /// Progress rows referencing lessons that no longer exist.
    pub orphaned: Vec<ProgressId>,
}

/// A pending lesson for which the store returned no created row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnmatchedLesson(pub LessonId);

impl std::fmt::Display for UnmatchedLesson {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no progress row was created for lesson {}", self.0)
    }
}

impl std::error::Error for UnmatchedLesson {}

impl ReconcilePlan {
    /// True when applying the plan would write nothing.
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty() && self.pending().next().is_none()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Lesson> {
        self.entries.iter().filter_map(|e| match e {
            MergeEntry::Pending(l) => Some(l),
            MergeEntry::Matched(_) => None,
        })
    }

    pub fn matched_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, MergeEntry::Matched(_)))
            .count()
    }

    /// Rows to insert for every pending lesson.
    pub fn new_rows(&self, learner: &str, course_id: CourseId) -> Vec<NewProgress> {
        self.pending()
            .map(|l| NewProgress {
                learner_username: learner.to_string(),
                course_id,
                unit_id: l.unit_id,
                lesson_id: l.id,
                status: LessonStatus::Incomplete,
            })
            .collect()
    }

    /// Fill the pending entries from `created` and return the learner's view
    /// in display order. The sort is stable, so lessons sharing an order
    /// value keep their id order.
    pub fn assemble(
        self,
        created: &[ProgressRecord],
    ) -> Result<Vec<LessonProgress>, UnmatchedLesson> {
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            match entry {
                MergeEntry::Matched(lp) => out.push(lp),
                MergeEntry::Pending(lesson) => {
                    let row = created
                        .iter()
                        .find(|p| p.lesson_id == lesson.id)
                        .ok_or(UnmatchedLesson(lesson.id))?;
                    out.push(LessonProgress {
                        progress_id: row.id,
                        status: row.status,
                        lesson,
                    });
                }
            }
        }
        out.sort_by_key(|lp| lp.lesson.order);
        Ok(out)
    }
}

/// Two-pointer merge of `lessons` and `progress`.
///
/// Both inputs MUST be in ascending lesson id (`progress` by the lesson it
/// references). Progress rows left over once the lessons run out reference
/// lessons that are gone and are orphaned as well.
pub fn reconcile<'a, L, P>(lessons: L, progress: P) -> ReconcilePlan
where
    L: IntoIterator<Item = &'a Lesson>,
    P: IntoIterator<Item = &'a ProgressRecord>,
{
    let mut plan = ReconcilePlan::default();
    let mut rows = progress.into_iter().peekable();

    for lesson in lessons {
        loop {
            match rows.peek() {
                Some(row) if row.lesson_id < lesson.id => {
                    plan.orphaned.push(row.id);
                    rows.next();
                }
                Some(row) if row.lesson_id == lesson.id => {
                    plan.entries.push(MergeEntry::Matched(LessonProgress {
                        lesson: lesson.clone(),
                        progress_id: row.id,
                        status: row.status,
                    }));
                    rows.next();
                    break;
                }
                _ => {
                    plan.entries.push(MergeEntry::Pending(lesson.clone()));
                    break;
                }
            }
        }
    }

    plan.orphaned.extend(rows.map(|row| row.id));
    plan
}

/// [`reconcile`] for inputs in arbitrary order (e.g. lessons as listed in
/// display order). Sorts copies by id first.
pub fn reconcile_unit(lessons: &[Lesson], progress: &[ProgressRecord]) -> ReconcilePlan {
    let mut by_id: Vec<&Lesson> = lessons.iter().collect();
    by_id.sort_by_key(|l| l.id);

    let mut rows: Vec<&ProgressRecord> = progress.iter().collect();
    rows.sort_by_key(|p| (p.lesson_id, p.id));

    reconcile(by_id, rows)
}
