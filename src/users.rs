use std::str::FromStr;

use axum::extract::Path;
use axum::Extension;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{require, Action};
use crate::app::{CurrentSession, JsonBody, SharedState};
use crate::auth::{hash_password, UserEnvelope};
use crate::err::{Error, Success};
use crate::models::{Role, User, UserView};
use crate::{proceeds, Payload};

#[derive(Debug, Clone, Serialize)]
pub struct UsersEnvelope {
    pub users: Vec<UserView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatchRole {
    pub role: String,
}

/// Account created by an administrator, who picks the role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year: Option<String>,
}

fn parse_role(raw: &str) -> Result<Role, Error> {
    Role::from_str(raw).map_err(|_| Error::invalid("Invalid role"))
}

pub async fn list_users(
    CurrentSession(session): CurrentSession,
    Extension(state): Extension<SharedState>,
) -> Payload<UsersEnvelope> {
    require(session.as_ref(), Action::ListUsers)?;
    let users = state.store.list_users().await?;
    proceeds(UsersEnvelope {
        users: users.iter().map(UserView::from).collect(),
    })
}

pub async fn create_user(
    CurrentSession(session): CurrentSession,
    Extension(state): Extension<SharedState>,
    JsonBody(body): JsonBody<CreateUser>,
) -> Payload<UserEnvelope> {
    let session = require(session.as_ref(), Action::CreateUser)?;
    let role = match body.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::default(),
    };
    if body.password.is_empty() {
        return Err(Error::invalid("Provided password was empty!"));
    }

    let user = state
        .store
        .create_user(User {
            id: Uuid::new_v4(),
            name: body.name,
            email: body.email,
            password_hash: hash_password(&body.password)?,
            role,
            student_id: body.student_id,
            department: body.department,
            year: body.year,
            created_at: Utc::now(),
        })
        .await?;
    log::info!("{} created {} account {}", session.email, user.role, user.id);
    proceeds(UserEnvelope::of(&user))
}

pub async fn delete_user(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Extension(state): Extension<SharedState>,
) -> Payload<Success> {
    let session = require(session.as_ref(), Action::DeleteUser)?;
    let id = Uuid::from_str(&id)?;
    if id == session.id {
        log::warn!("{} is deleting their own account", session.email);
    }
    state.store.delete_user(id).await?;
    log::info!("User {} deleted by {}", id, session.email);
    proceeds(Success::new())
}

pub async fn patch_user_role(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Extension(state): Extension<SharedState>,
    JsonBody(body): JsonBody<PatchRole>,
) -> Payload<UserEnvelope> {
    let session = require(session.as_ref(), Action::PatchUser)?;
    let role = parse_role(&body.role)?;
    let id = Uuid::from_str(&id)?;

    let user = state.store.update_user_role(id, role).await?;
    log::info!("{} set role of {} to {}", session.email, user.id, role);
    proceeds(UserEnvelope::of(&user))
}
