use std::str::FromStr;

use axum::extract::Path;
use axum::Extension;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::access::{require, Action};
use crate::app::{CurrentSession, JsonBody, SharedState};
use crate::err::{Error, Success};
use crate::models::{distinct_ids, Assignment, AuthorView, Submission};
use crate::{breaks, proceeds, Payload};

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub attachments: Vec<String>,
    #[serialize_always]
    pub author: Option<AuthorView>,
    pub submissions: Vec<Submission>,
    pub created_at: DateTime<Utc>,
}

impl AssignmentView {
    fn of(assignment: Assignment, author: Option<AuthorView>) -> Self {
        Self {
            id: assignment.id,
            title: assignment.title,
            subject: assignment.subject,
            description: assignment.description,
            due_date: assignment.due_date,
            attachments: assignment.attachments,
            author,
            submissions: assignment.submissions,
            created_at: assignment.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentsEnvelope {
    pub assignments: Vec<AssignmentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentEnvelope {
    pub assignment: AssignmentView,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignment {
    pub title: String,
    pub subject: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAssignment {
    pub file_url: String,
}

pub async fn list_assignments(
    Extension(state): Extension<SharedState>,
) -> Payload<AssignmentsEnvelope> {
    let assignments = state.store.list_assignments().await?;
    let authors = state
        .store
        .authors(&distinct_ids(assignments.iter().map(|a| a.author)))
        .await?;
    proceeds(AssignmentsEnvelope {
        assignments: assignments
            .into_iter()
            .map(|assignment| {
                let author = authors.get(&assignment.author).cloned();
                AssignmentView::of(assignment, author)
            })
            .collect(),
    })
}

pub async fn read_assignment(
    Path(id): Path<String>,
    Extension(state): Extension<SharedState>,
) -> Payload<AssignmentEnvelope> {
    let id = Uuid::from_str(&id)?;
    let assignment = match state.store.find_assignment(id).await? {
        Some(assignment) => assignment,
        None => return breaks(Error::not_found("Assignment")),
    };
    let author = state.store.author(assignment.author).await?;
    proceeds(AssignmentEnvelope {
        assignment: AssignmentView::of(assignment, author),
    })
}

pub async fn create_assignment(
    CurrentSession(session): CurrentSession,
    Extension(state): Extension<SharedState>,
    JsonBody(body): JsonBody<CreateAssignment>,
) -> Payload<AssignmentEnvelope> {
    let session = require(session.as_ref(), Action::CreateAssignment)?;
    let assignment = state
        .store
        .create_assignment(Assignment {
            id: Uuid::new_v4(),
            title: body.title,
            subject: body.subject,
            description: body.description,
            due_date: body.due_date,
            attachments: body.attachments,
            author: session.id,
            submissions: Vec::new(),
            created_at: Utc::now(),
        })
        .await?;
    log::info!("Assignment {} set by {}", assignment.id, session.email);

    proceeds(AssignmentEnvelope {
        assignment: AssignmentView::of(assignment, Some(session.author())),
    })
}

/// `scheme://rest` with no whitespace. Reachability and content are not checked.
fn is_url_shaped(url: &str) -> bool {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && !rest.is_empty()
                && !rest.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Read-modify-write of the whole submission list. Two concurrent submits on
/// the same assignment race, and the later save wins.
pub async fn submit_assignment(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Extension(state): Extension<SharedState>,
    JsonBody(body): JsonBody<SubmitAssignment>,
) -> Payload<Success> {
    let session = require(session.as_ref(), Action::SubmitAssignment)?;
    if !is_url_shaped(&body.file_url) {
        return Err(Error::invalid("`fileUrl` must be a link such as https://..."));
    }
    let id = Uuid::from_str(&id)?;

    let mut assignment = match state.store.find_assignment(id).await? {
        Some(assignment) => assignment,
        None => return breaks(Error::not_found("Assignment")),
    };
    let replaced = assignment.upsert_submission(session.id, body.file_url, Utc::now());
    state.store.save_assignment(&assignment).await?;
    log::info!(
        "{} {} assignment {}",
        session.email,
        if replaced { "resubmitted" } else { "submitted" },
        assignment.id
    );

    proceeds(Success::new())
}
