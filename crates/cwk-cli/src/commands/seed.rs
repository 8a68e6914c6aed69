//! `cwk seed demo`: a small catalog for local development.

use anyhow::{bail, Result};
use cwk_catalog::{CatalogError, Store};
use cwk_schemas::{CourseId, NewAccount, NewCourse, NewLesson, NewUnit};
use tracing::info;

struct DemoCourse {
    key: &'static str,
    creator: &'static str,
    title: &'static str,
    about: &'static str,
    units: &'static [(&'static str, &'static [(&'static str, &'static str)])],
}

const ACCOUNTS: &[&str] = &["Mosh", "BroCode", "student1", "student2", "student3"];

const COURSES: &[DemoCourse] = &[
    DemoCourse {
        key: "fed",
        creator: "Mosh",
        title: "Front End Devlopement",
        about: "learn the basics of front end developement",
        units: &[
            (
                "React",
                &[
                    ("React JS - React Tutorial for Beginners", "Ke90Tje7VS0"),
                    ("What is React (React js) & Why is it so Popular?", "N3AkSS5hXMA"),
                    (
                        "React vs Angular vs Vue: What to Learn to Get a Front-end Job",
                        "pEbIhUySqbk",
                    ),
                ],
            ),
            (
                "Other Topics",
                &[
                    (
                        "JavaScript Tutorial for Beginners: Learn JavaScript in 1 Hour",
                        "W6NZfCO5SIk",
                    ),
                    ("What is a REST API?", "SLwpqD8n3d0"),
                    ("Git Tutorial for Beginners: Learn Git in 1 Hour", "8JJ101D3knE"),
                ],
            ),
        ],
    },
    DemoCourse {
        key: "bed",
        creator: "Mosh",
        title: "Back end Developement",
        about: "learn the basics of back end developement",
        units: &[
            (
                "Node",
                &[
                    ("What is Node js?", "uVwtVBpw7RQ"),
                    ("Node.js Tutorial for Beginners: Learn Node in 1 Hour", "TlB_eWDSMt4"),
                    ("How to build a REST API with Node js & Express", "pKd0Rpw7O48"),
                ],
            ),
            (
                "Python",
                &[
                    ("What is Python? Why Python is So Popular?", "Y8Tko2YC5hA"),
                    ("Python Tutorial - Python Full Course for Beginners", "_uQrJ0TkZlc"),
                ],
            ),
        ],
    },
    DemoCourse {
        key: "mysql",
        creator: "BroCode",
        title: "MySQL for beginners",
        about: "learn mySQL for free",
        units: &[
            (
                "MySQL Basics",
                &[
                    ("MySQL tutorial for beginners (intro + installation)", "oPV2sjMG53U"),
                    ("MySQL: How to create a DATABASE", "9LQ9rGoGfYQ"),
                    ("MySQL: How to create a TABLE", "XfrgCK6BX5w"),
                ],
            ),
            (
                "MySQL Constraints",
                &[
                    ("MySQL: UNIQUE constraint", "Of_-2pBeL0g"),
                    ("MySQL: NOT NULL constraint", "unzHhq82mKU"),
                    ("MySQL: PRIMARY KEYS are easy", "620DzFVz41o"),
                ],
            ),
            (
                "Other things to know in MySQL",
                &[
                    ("MySQL: JOINS are easy (INNER, LEFT, RIGHT)", "G3lJAxg1cy8"),
                    ("MySQL: GROUP BY", "FztbYXeOEQ4"),
                ],
            ),
        ],
    },
    DemoCourse {
        key: "dsa",
        creator: "BroCode",
        title: "Data Structures and Algorithms",
        about: "learn about how to organize your data",
        units: &[
            (
                "Data Structures",
                &[
                    ("What are data structures and algorithms?", "xX5iOYCJmBI"),
                    ("Learn Stack data structures in 10 minutes", "KInG04mAjO0"),
                    ("Learn Linked Lists in 13 minutes", "N6dOwBde7-M"),
                ],
            ),
            (
                "Search",
                &[
                    ("Learn Linear Search in 3 minutes", "246V51AWwZM"),
                    ("Learn Binary Search in 10 minutes", "xrMppTpoqdw"),
                ],
            ),
            (
                "Sorts",
                &[
                    ("Learn Bubble Sort in 7 minutes", "Dv4qLJcxus8"),
                    ("Learn Merge Sort in 13 minutes", "3j0SWDX4AtU"),
                    ("Learn Quick Sort in 13 minutes", "Vtckgz38QHs"),
                ],
            ),
        ],
    },
];

const ENROLLMENTS: &[(&str, &[&str])] = &[
    ("student1", &["fed", "bed"]),
    ("student2", &["fed", "mysql"]),
    ("student3", &["fed", "bed", "dsa"]),
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub accounts: usize,
    pub courses: usize,
    pub units: usize,
    pub lessons: usize,
    pub enrollments: usize,
}

impl std::fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "seeded accounts={} courses={} units={} lessons={} enrollments={}",
            self.accounts, self.courses, self.units, self.lessons, self.enrollments
        )
    }
}

/// Load the demo catalog through the normal catalog operations. Refuses to
/// run twice: a second seed would duplicate every course.
///
/// Demo accounts get an unusable credential; log in through the real
/// registration flow instead.
pub async fn demo(store: &dyn Store) -> Result<SeedSummary> {
    match cwk_catalog::account(store, ACCOUNTS[0]).await {
        Ok(_) => bail!("SEED_REFUSED: demo account {} already exists", ACCOUNTS[0]),
        Err(CatalogError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let mut summary = SeedSummary::default();

    for username in ACCOUNTS {
        cwk_catalog::create_account(
            store,
            NewAccount {
                username: (*username).to_string(),
                credential_hash: format!("!demo:{username}"),
            },
        )
        .await?;
        summary.accounts += 1;
    }

    let mut ids: Vec<(&str, CourseId)> = Vec::new();
    for demo in COURSES {
        let course = cwk_catalog::create_course(
            store,
            NewCourse {
                creator_username: demo.creator.to_string(),
                title: demo.title.to_string(),
                about: demo.about.to_string(),
            },
        )
        .await?;
        summary.courses += 1;

        for (u, (unit_title, lessons)) in demo.units.iter().enumerate() {
            let unit = cwk_catalog::create_unit(
                store,
                NewUnit {
                    course_id: course.id,
                    title: unit_title.to_string(),
                    order: u as i64 + 1,
                },
            )
            .await?;
            summary.units += 1;

            for (l, (lesson_title, video)) in lessons.iter().enumerate() {
                cwk_catalog::create_lesson(
                    store,
                    NewLesson {
                        unit_id: unit.id,
                        title: lesson_title.to_string(),
                        order: l as i64 + 1,
                        lesson_type: "video".to_string(),
                        url: format!("https://www.youtube.com/embed/{video}"),
                    },
                )
                .await?;
                summary.lessons += 1;
            }
        }
        ids.push((demo.key, course.id));
    }

    for (learner, keys) in ENROLLMENTS {
        for key in *keys {
            let Some((_, course_id)) = ids.iter().find(|(k, _)| k == key) else {
                bail!("demo enrollment names unknown course {key}");
            };
            cwk_catalog::enroll(store, learner, *course_id).await?;
            summary.enrollments += 1;
        }
    }

    info!(
        courses = summary.courses,
        lessons = summary.lessons,
        enrollments = summary.enrollments,
        "demo data seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cwk_testkit::MemStore;

    #[tokio::test]
    async fn demo_seed_builds_dense_catalog_with_enrollments() {
        let store = MemStore::new();
        let summary = demo(&store).await.unwrap();

        assert_eq!(summary.accounts, 5);
        assert_eq!(summary.courses, 4);
        assert_eq!(summary.units, 10);
        assert_eq!(summary.enrollments, 7);

        let violations = cwk_catalog::audit_ordering(&store).await.unwrap();
        assert!(violations.is_empty(), "{violations:?}");

        let enrolled = cwk_catalog::enrolled_courses(&store, "student3").await.unwrap();
        assert_eq!(enrolled.len(), 3);

        let mosh = cwk_catalog::created_courses(&store, "Mosh").await.unwrap();
        let titles: Vec<&str> = mosh.iter().map(|c| c.title.as_str()).collect();
        assert!(titles.contains(&"Front End Devlopement"));
        assert!(titles.contains(&"Back end Developement"));
    }

    #[tokio::test]
    async fn demo_seed_refuses_second_run() {
        let store = MemStore::new();
        demo(&store).await.unwrap();
        let before = store.write_commits();

        let err = demo(&store).await.unwrap_err();
        assert!(err.to_string().contains("SEED_REFUSED"), "{err}");
        assert_eq!(store.write_commits(), before);
    }

    #[tokio::test]
    async fn seeded_progress_starts_incomplete() {
        let store = MemStore::new();
        demo(&store).await.unwrap();

        let snap = store.snapshot().await;
        let student1: Vec<_> = snap
            .progress
            .values()
            .filter(|p| p.learner_username == "student1")
            .collect();
        // fed has 6 lessons, bed has 5
        assert_eq!(student1.len(), 11);
        assert!(student1
            .iter()
            .all(|p| p.status == cwk_schemas::LessonStatus::Incomplete));
    }
}
