use cwk_schemas::{CourseId, Lesson, LessonStatus, NewProgress, Unit};

/// One `incomplete` row per lesson of every unit, units and lessons in
/// display order.
pub fn enrollment_rows(
    learner: &str,
    course_id: CourseId,
    units: &[(Unit, Vec<Lesson>)],
) -> Vec<NewProgress> {
    units
        .iter()
        .flat_map(|(unit, lessons)| {
            lessons.iter().map(move |lesson| NewProgress {
                learner_username: learner.to_string(),
                course_id,
                unit_id: unit.id,
                lesson_id: lesson.id,
                status: LessonStatus::Incomplete,
            })
        })
        .collect()
}
