#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use campus_portal::app::{router, AppState};
use campus_portal::auth::{Session, TokenCodec};
use campus_portal::models::{Assignment, Notice, NoticeCategory, Role, User};
use campus_portal::store::memory::InMemoryStore;
use campus_portal::store::PortalStore;

pub const SECRET: &str = "test-secret";

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct Harness {
    pub app: Router,
    pub store: Arc<InMemoryStore>,
    tokens: TokenCodec,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = Arc::new(AppState::new(
            store.clone(),
            TokenCodec::new(SECRET),
            false,
        ));
        Self {
            app: router(state),
            store,
            tokens: TokenCodec::new(SECRET),
        }
    }

    /// Inserts an account directly. Its password hash is not usable for login.
    pub async fn user(&self, role: Role, department: Option<&str>) -> User {
        let id = Uuid::new_v4();
        self.store
            .create_user(User {
                id,
                name: format!("{} {}", role, &id.to_string()[..8]),
                email: format!("{}@campus.edu", id),
                password_hash: "not-a-phc-string".into(),
                role,
                student_id: None,
                department: department.map(str::to_string),
                year: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    pub fn cookie(&self, user: &User) -> String {
        format!("token={}", self.tokens.sign(&Session::from(user)).unwrap())
    }

    pub async fn notice(
        &self,
        author: &User,
        title: &str,
        targets: Option<&[&str]>,
        created_at: DateTime<Utc>,
    ) -> Notice {
        self.store
            .create_notice(Notice {
                id: Uuid::new_v4(),
                title: title.into(),
                content: format!("{} body", title),
                category: NoticeCategory::General,
                attachments: vec![],
                target_departments: targets
                    .map(|t| t.iter().map(|d| d.to_string()).collect()),
                author: author.id,
                scheduled_for: None,
                created_at,
            })
            .await
            .unwrap()
    }

    pub async fn assignment(&self, author: &User, title: &str, due_in_days: i64) -> Assignment {
        self.store
            .create_assignment(Assignment {
                id: Uuid::new_v4(),
                title: title.into(),
                subject: "Algorithms".into(),
                description: None,
                due_date: Utc::now() + Duration::days(due_in_days),
                attachments: vec![],
                author: author.id,
                submissions: vec![],
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header("cookie", cookie);
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply {
            status,
            headers,
            body,
        }
    }
}

pub fn titles(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap().to_string())
        .collect()
}
