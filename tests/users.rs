mod common;

use axum::http::StatusCode;
use common::Harness;
use serde_json::json;
use uuid::Uuid;

use campus_portal::models::Role;
use campus_portal::store::PortalStore;

#[tokio::test]
async fn only_admins_list_users_and_never_see_hashes() {
    let h = Harness::new();
    let admin = h.user(Role::Admin, None).await;
    let teacher = h.user(Role::Teacher, None).await;
    h.user(Role::Student, Some("Physics")).await;

    for cookie in [None, Some(h.cookie(&teacher))] {
        let reply = h.send("GET", "/api/users", cookie.as_deref(), None).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
        assert_eq!(reply.body["error"], "Unauthorized");
    }

    let reply = h.send("GET", "/api/users", Some(&h.cookie(&admin)), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let users = reply.body["users"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    for user in users {
        assert!(user.get("password").is_none());
        assert!(user.get("passwordHash").is_none());
        assert!(user.get("password_hash").is_none());
    }
}

#[tokio::test]
async fn out_of_enum_role_is_rejected_without_writing() {
    let h = Harness::new();
    let admin = h.user(Role::Admin, None).await;
    let student = h.user(Role::Student, None).await;

    let reply = h
        .send(
            "PATCH",
            &format!("/api/users/{}", student.id),
            Some(&h.cookie(&admin)),
            Some(json!({ "role": "superadmin" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body, json!({ "error": "Invalid role" }));

    let stored = h.store.find_user(student.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::Student);
}

#[tokio::test]
async fn admin_promotes_a_student() {
    let h = Harness::new();
    let admin = h.user(Role::Admin, None).await;
    let student = h.user(Role::Student, None).await;
    let uri = format!("/api/users/{}", student.id);

    let reply = h
        .send(
            "PATCH",
            &uri,
            Some(&h.cookie(&student)),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = h
        .send(
            "PATCH",
            &uri,
            Some(&h.cookie(&admin)),
            Some(json!({ "role": "teacher" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["user"]["role"], "teacher");
    assert_eq!(
        h.store.find_user(student.id).await.unwrap().unwrap().role,
        Role::Teacher
    );

    let reply = h
        .send(
            "PATCH",
            &format!("/api/users/{}", Uuid::new_v4()),
            Some(&h.cookie(&admin)),
            Some(json!({ "role": "teacher" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "User not found");
}

#[tokio::test]
async fn delete_user_is_admin_only_and_reports_missing() {
    let h = Harness::new();
    let admin = h.user(Role::Admin, None).await;
    let teacher = h.user(Role::Teacher, None).await;
    let uri = format!("/api/users/{}", teacher.id);

    let reply = h.send("DELETE", &uri, Some(&h.cookie(&teacher)), None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = h.send("DELETE", &uri, Some(&h.cookie(&admin)), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "success": true }));
    assert!(h.store.find_user(teacher.id).await.unwrap().is_none());

    let reply = h.send("DELETE", &uri, Some(&h.cookie(&admin)), None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "User not found");
}

#[tokio::test]
async fn admin_may_delete_their_own_account() {
    let h = Harness::new();
    let admin = h.user(Role::Admin, None).await;
    let reply = h
        .send(
            "DELETE",
            &format!("/api/users/{}", admin.id),
            Some(&h.cookie(&admin)),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_creates_staff_accounts() {
    let h = Harness::new();
    let admin = h.user(Role::Admin, None).await;
    let cookie = h.cookie(&admin);

    let reply = h
        .send(
            "POST",
            "/api/users",
            Some(&cookie),
            Some(json!({
                "name": "Prof. Hopper",
                "email": "hopper@campus.edu",
                "password": "cobol",
                "role": "teacher",
                "department": "Computer Science",
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["user"]["role"], "teacher");

    let reply = h
        .send(
            "POST",
            "/api/users",
            Some(&cookie),
            Some(json!({
                "name": "Prof. Hopper",
                "email": "hopper@campus.edu",
                "password": "cobol",
                "role": "teacher",
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = h
        .send(
            "POST",
            "/api/users",
            Some(&cookie),
            Some(json!({
                "name": "Root",
                "email": "root@campus.edu",
                "password": "pw",
                "role": "root",
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "Invalid role");
}
