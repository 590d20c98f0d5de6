mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{titles, Harness};
use serde_json::json;
use uuid::Uuid;

use campus_portal::models::Role;
use campus_portal::store::PortalStore;

#[tokio::test]
async fn student_sees_public_and_own_department_newest_first() {
    let h = Harness::new();
    let teacher = h.user(Role::Teacher, None).await;
    let student = h.user(Role::Student, Some("Data Science")).await;
    let now = Utc::now();
    h.notice(&teacher, "A", Some(&[]), now - Duration::hours(3)).await;
    h.notice(&teacher, "B", Some(&["Computer Science"]), now - Duration::hours(2)).await;
    h.notice(&teacher, "C", Some(&["Data Science"]), now - Duration::hours(1)).await;

    let reply = h
        .send("GET", "/api/notices?category=All", Some(&h.cookie(&student)), None)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(titles(&reply.body["notices"]), ["C", "A"]);
}

#[tokio::test]
async fn legacy_notices_without_departments_are_public() {
    let h = Harness::new();
    let teacher = h.user(Role::Teacher, None).await;
    let physics = h.user(Role::Student, Some("Physics")).await;
    let undeclared = h.user(Role::Student, None).await;
    let now = Utc::now();
    h.notice(&teacher, "legacy", None, now - Duration::hours(2)).await;
    h.notice(&teacher, "maths only", Some(&["Maths"]), now - Duration::hours(1)).await;

    for student in [&physics, &undeclared] {
        let reply = h
            .send("GET", "/api/notices", Some(&h.cookie(student)), None)
            .await;
        assert_eq!(titles(&reply.body["notices"]), ["legacy"]);
    }
}

#[tokio::test]
async fn anonymous_and_staff_see_everything() {
    let h = Harness::new();
    let teacher = h.user(Role::Teacher, Some("Maths")).await;
    let admin = h.user(Role::Admin, None).await;
    let now = Utc::now();
    h.notice(&teacher, "A", Some(&[]), now - Duration::hours(3)).await;
    h.notice(&teacher, "B", Some(&["Computer Science"]), now - Duration::hours(2)).await;
    h.notice(&teacher, "C", Some(&["Data Science"]), now - Duration::hours(1)).await;

    let anonymous = h.send("GET", "/api/notices", None, None).await;
    assert_eq!(titles(&anonymous.body["notices"]), ["C", "B", "A"]);

    for staff in [&teacher, &admin] {
        let reply = h
            .send("GET", "/api/notices", Some(&h.cookie(staff)), None)
            .await;
        assert_eq!(titles(&reply.body["notices"]), ["C", "B", "A"]);
    }
}

#[tokio::test]
async fn list_populates_author_name_and_role_only() {
    let h = Harness::new();
    let teacher = h.user(Role::Teacher, None).await;
    h.notice(&teacher, "A", Some(&[]), Utc::now()).await;

    let reply = h.send("GET", "/api/notices", None, None).await;
    let author = &reply.body["notices"][0]["author"];
    assert_eq!(author["_id"], teacher.id.to_string());
    assert_eq!(author["name"], teacher.name.as_str());
    assert_eq!(author["role"], "teacher");
    assert_eq!(author.as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn category_filter_composes_with_department() {
    let h = Harness::new();
    let teacher = h.user(Role::Teacher, None).await;
    let student = h.user(Role::Student, Some("Data Science")).await;
    let cookie = h.cookie(&teacher);

    for (title, category, targets) in [
        ("exam ds", "Exam", json!(["Data Science"])),
        ("exam cs", "Exam", json!(["Computer Science"])),
        ("urgent", "Urgent", json!([])),
    ] {
        let reply = h
            .send(
                "POST",
                "/api/notices",
                Some(&cookie),
                Some(json!({
                    "title": title,
                    "content": "...",
                    "category": category,
                    "targetDepartments": targets,
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
    }

    let reply = h
        .send("GET", "/api/notices?category=Exam", Some(&h.cookie(&student)), None)
        .await;
    assert_eq!(titles(&reply.body["notices"]), ["exam ds"]);

    let reply = h
        .send("GET", "/api/notices?category=Exam", None, None)
        .await;
    assert_eq!(reply.body["notices"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn students_and_anonymous_cannot_post_notices() {
    let h = Harness::new();
    let student = h.user(Role::Student, None).await;
    let body = json!({ "title": "Party", "content": "Tonight" });

    for cookie in [None, Some(h.cookie(&student))] {
        let reply = h
            .send("POST", "/api/notices", cookie.as_deref(), Some(body.clone()))
            .await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert_eq!(reply.body, json!({ "error": "Unauthorized" }));
    }
    assert!(h
        .store
        .list_notices(&Default::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn teacher_posts_notice_with_defaults() {
    let h = Harness::new();
    let teacher = h.user(Role::Teacher, None).await;

    let reply = h
        .send(
            "POST",
            "/api/notices",
            Some(&h.cookie(&teacher)),
            Some(json!({ "title": "Library hours", "content": "Open late" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    let notice = &reply.body["notice"];
    assert_eq!(notice["category"], "General");
    assert_eq!(notice["targetDepartments"], json!([]));
    assert_eq!(notice["author"]["_id"], teacher.id.to_string());

    let reply = h
        .send(
            "POST",
            "/api/notices",
            Some(&h.cookie(&teacher)),
            Some(json!({ "title": "x", "content": "y", "category": "Gossip" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn read_by_id_is_open_and_reports_missing() {
    let h = Harness::new();
    let teacher = h.user(Role::Teacher, None).await;
    let notice = h.notice(&teacher, "A", Some(&["Physics"]), Utc::now()).await;

    let reply = h
        .send("GET", &format!("/api/notices/{}", notice.id), None, None)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["notice"]["title"], "A");

    let reply = h
        .send("GET", &format!("/api/notices/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "Notice not found");

    let reply = h.send("GET", "/api/notices/not-an-id", None, None).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn any_staff_member_may_delete_any_notice() {
    let h = Harness::new();
    let author = h.user(Role::Teacher, None).await;
    let colleague = h.user(Role::Teacher, None).await;
    let student = h.user(Role::Student, None).await;
    let notice = h.notice(&author, "A", Some(&[]), Utc::now()).await;
    let uri = format!("/api/notices/{}", notice.id);

    let reply = h.send("DELETE", &uri, Some(&h.cookie(&student)), None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = h.send("DELETE", &uri, Some(&h.cookie(&colleague)), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "success": true }));

    let reply = h.send("DELETE", &uri, Some(&h.cookie(&colleague)), None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "Notice not found");
}

#[tokio::test]
async fn comments_need_a_session_and_an_existing_notice() {
    let h = Harness::new();
    let teacher = h.user(Role::Teacher, None).await;
    let student = h.user(Role::Student, None).await;
    let notice = h.notice(&teacher, "A", Some(&[]), Utc::now()).await;
    let uri = format!("/api/notices/{}/comments", notice.id);
    let body = json!({ "content": "Is attendance mandatory?" });

    let reply = h.send("POST", &uri, None, Some(body.clone())).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = h
        .send("POST", &uri, Some(&h.cookie(&student)), Some(body.clone()))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["comment"]["noticeId"], notice.id.to_string());

    let missing = format!("/api/notices/{}/comments", Uuid::new_v4());
    let reply = h
        .send("POST", &missing, Some(&h.cookie(&student)), Some(body))
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = h.send("GET", &uri, None, None).await;
    let comments = reply.body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["author"]["role"], "student");
}

#[tokio::test]
async fn unknown_paths_use_the_error_envelope() {
    let h = Harness::new();
    let reply = h.send("GET", "/api/nowhere", None, None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "Invalid path: /api/nowhere");
}
