//! In-process scenario tests for cwk-daemon HTTP endpoints.
//!
//! These tests build the Axum router over a `MemStore` **without** binding a
//! TCP socket and drive it via `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use cwk_daemon::{auth::CALLER_HEADER, routes, state};
use cwk_testkit::MemStore;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    state: Arc<state::AppState>,
    store: MemStore,
}

impl Harness {
    fn new() -> Self {
        let store = MemStore::new();
        let state = Arc::new(state::AppState::new(Arc::new(store.clone())));
        Self { state, store }
    }

    /// Send one request; `caller` becomes the identity header when given.
    async fn call(
        &self,
        method: &str,
        uri: &str,
        caller: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(user) = caller {
            req = req.header(CALLER_HEADER, user);
        }
        let req = match body {
            Some(v) => req
                .header("content-type", "application/json")
                .body(axum::body::Body::from(v.to_string()))
                .unwrap(),
            None => req.body(axum::body::Body::empty()).unwrap(),
        };

        let resp = routes::build_router(Arc::clone(&self.state))
            .oneshot(req)
            .await
            .expect("oneshot failed");
        let status = resp.status();
        let bytes: bytes::Bytes = resp
            .into_body()
            .collect()
            .await
            .expect("body collect failed")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is not valid JSON")
        };
        (status, json)
    }

    async fn register(&self, username: &str) {
        let (status, _) = self
            .call(
                "POST",
                "/v1/accounts",
                None,
                Some(json!({"username": username, "credentialHash": "h"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    /// Course with one unit holding lessons A, B, C; returns (course, unit).
    async fn course_with_lessons(&self, creator: &str) -> (i64, i64) {
        let (_, course) = self
            .call(
                "POST",
                "/v1/courses",
                Some(creator),
                Some(json!({"title": "React", "about": "Hooks and more"})),
            )
            .await;
        let course_id = course["id"].as_i64().unwrap();
        let (_, unit) = self
            .call(
                "POST",
                "/v1/units",
                Some(creator),
                Some(json!({"courseId": course_id, "title": "Basics"})),
            )
            .await;
        let unit_id = unit["id"].as_i64().unwrap();
        for title in ["A", "B", "C"] {
            let (status, _) = self
                .call(
                    "POST",
                    "/v1/lessons",
                    Some(creator),
                    Some(json!({
                        "unitId": unit_id,
                        "title": title,
                        "lessonType": "video",
                        "url": format!("https://www.youtube.com/embed/{title}"),
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        (course_id, unit_id)
    }
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let h = Harness::new();
    let (status, json) = h.call("GET", "/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "cwk-daemon");
}

// ---------------------------------------------------------------------------
// Identity and ownership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_identity_is_401() {
    let h = Harness::new();
    let (status, json) = h.call("GET", "/v1/courses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["kind"], "unauthenticated");
}

#[tokio::test]
async fn only_the_creator_may_mutate_a_course() {
    let h = Harness::new();
    h.register("Mosh").await;
    h.register("student1").await;
    let (course_id, unit_id) = h.course_with_lessons("Mosh").await;

    let (status, json) = h
        .call(
            "PATCH",
            &format!("/v1/courses/{course_id}"),
            Some("student1"),
            Some(json!({"title": "Hijacked"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["kind"], "forbidden");

    let (status, _) = h
        .call(
            "POST",
            "/v1/lessons",
            Some("student1"),
            Some(json!({"unitId": unit_id, "title": "X", "lessonType": "video", "url": "u"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = h
        .call(
            "PATCH",
            &format!("/v1/courses/{course_id}"),
            Some("Mosh"),
            Some(json!({"title": "React 18"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "React 18");
}

// ---------------------------------------------------------------------------
// Ordering through the API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lesson_insert_and_move_keep_display_order() {
    let h = Harness::new();
    h.register("Mosh").await;
    let (_, unit_id) = h.course_with_lessons("Mosh").await;

    let (status, nl) = h
        .call(
            "POST",
            "/v1/lessons",
            Some("Mosh"),
            Some(json!({
                "unitId": unit_id,
                "title": "NL",
                "order": 2,
                "lessonType": "video",
                "url": "https://www.youtube.com/embed/NL",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(nl["order"], 2);

    let nl_id = nl["id"].as_i64().unwrap();
    let (status, moved) = h
        .call(
            "PATCH",
            &format!("/v1/lessons/{nl_id}"),
            Some("Mosh"),
            Some(json!({"order": 100})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["order"], 4);

    let (_, lessons) = h
        .call("GET", &format!("/v1/units/{unit_id}/lessons"), Some("Mosh"), None)
        .await;
    let titles: Vec<&str> = lessons
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["A", "B", "C", "NL"]);
}

// ---------------------------------------------------------------------------
// Enrollment and progress
// ---------------------------------------------------------------------------

#[tokio::test]
async fn enroll_progress_and_status_flow() {
    let h = Harness::new();
    h.register("Mosh").await;
    h.register("student1").await;
    h.register("student2").await;
    let (course_id, unit_id) = h.course_with_lessons("Mosh").await;

    let (status, json) = h
        .call("POST", &format!("/v1/enrollments/{course_id}"), Some("student1"), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["courseId"], course_id);

    let (status, json) = h
        .call("POST", &format!("/v1/enrollments/{course_id}"), Some("student1"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "conflict");

    let (status, view) = h
        .call("GET", &format!("/v1/progress/units/{unit_id}"), Some("student1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = view.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["title"], "A");
    assert_eq!(rows[0]["status"], "incomplete");
    let progress_id = rows[0]["progressId"].as_i64().unwrap();

    // Someone else's record.
    let (status, _) = h
        .call(
            "PATCH",
            &format!("/v1/progress/{progress_id}"),
            Some("student2"),
            Some(json!({"status": "complete"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = h
        .call(
            "PATCH",
            &format!("/v1/progress/{progress_id}"),
            Some("student1"),
            Some(json!({"status": "done"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_input");

    let (status, json) = h
        .call(
            "PATCH",
            &format!("/v1/progress/{progress_id}"),
            Some("student1"),
            Some(json!({"status": "complete"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], progress_id);
    assert_eq!(json["status"], "complete");
    assert!(json["lessonId"].is_i64());

    let (status, _) = h
        .call("GET", &format!("/v1/progress/units/{unit_id}"), Some("student2"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, enrolled) = h
        .call("GET", "/v1/accounts/student1/enrolled", Some("student1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(enrolled.as_array().unwrap().len(), 1);

    let (status, _) = h
        .call("GET", "/v1/accounts/student1/enrolled", Some("student2"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = h
        .call("DELETE", &format!("/v1/enrollments/{course_id}"), Some("student1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(h.store.snapshot().await.progress.is_empty());
}

#[tokio::test]
async fn missing_records_are_404_and_store_failures_are_503() {
    let h = Harness::new();
    h.register("Mosh").await;

    let (status, json) = h.call("GET", "/v1/courses/999", Some("Mosh"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");

    h.store.fail_next_commit();
    let (status, json) = h
        .call(
            "POST",
            "/v1/courses",
            Some("Mosh"),
            Some(json!({"title": "Lost"})),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["kind"], "transient");
}

#[tokio::test]
async fn course_detail_and_delete() {
    let h = Harness::new();
    h.register("Mosh").await;
    let (course_id, _) = h.course_with_lessons("Mosh").await;

    let (status, detail) = h
        .call("GET", &format!("/v1/courses/{course_id}"), Some("Mosh"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["creatorUsername"], "Mosh");
    assert_eq!(detail["units"][0]["order"], 1);

    let (status, _) = h
        .call("DELETE", &format!("/v1/courses/{course_id}"), Some("Mosh"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let snap = h.store.snapshot().await;
    assert!(snap.courses.is_empty());
    assert!(snap.lessons.is_empty());
}
