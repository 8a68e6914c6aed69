use cwk_catalog::{create_account, create_course, create_lesson, create_unit, CatalogError, Store};
use cwk_schemas::{Account, Course, Lesson, NewAccount, NewCourse, NewLesson, NewUnit, Unit};

/// A course built by [`seed_course`], units and lessons in display order.
#[derive(Clone, Debug)]
pub struct SeededCourse {
    pub course: Course,
    pub units: Vec<(Unit, Vec<Lesson>)>,
}

impl SeededCourse {
    pub fn unit(&self, idx: usize) -> &Unit {
        &self.units[idx].0
    }

    pub fn lessons(&self, idx: usize) -> &[Lesson] {
        &self.units[idx].1
    }
}

pub async fn seed_account(store: &dyn Store, username: &str) -> Result<Account, CatalogError> {
    create_account(
        store,
        NewAccount {
            username: username.to_string(),
            credential_hash: format!("test-hash-{username}"),
        },
    )
    .await
}

/// Create a course through the catalog operations, appending each unit and
/// lesson at the end of its sibling set.
pub async fn seed_course(
    store: &dyn Store,
    creator: &str,
    title: &str,
    outline: &[(&str, &[&str])],
) -> Result<SeededCourse, CatalogError> {
    let course = create_course(
        store,
        NewCourse {
            creator_username: creator.to_string(),
            title: title.to_string(),
            about: format!("About {title}"),
        },
    )
    .await?;

    let mut units = Vec::with_capacity(outline.len());
    for (i, (unit_title, lesson_titles)) in outline.iter().enumerate() {
        let unit = create_unit(
            store,
            NewUnit {
                course_id: course.id,
                title: unit_title.to_string(),
                order: i as i64 + 1,
            },
        )
        .await?;
        let mut lessons = Vec::with_capacity(lesson_titles.len());
        for (j, lesson_title) in lesson_titles.iter().enumerate() {
            let lesson = create_lesson(
                store,
                NewLesson {
                    unit_id: unit.id,
                    title: lesson_title.to_string(),
                    order: j as i64 + 1,
                    lesson_type: "video".to_string(),
                    url: format!("https://www.youtube.com/embed/{}", lesson_title.replace(' ', "-")),
                },
            )
            .await?;
            lessons.push(lesson);
        }
        units.push((unit, lessons));
    }

    Ok(SeededCourse { course, units })
}
