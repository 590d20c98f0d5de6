use std::str::FromStr;

use axum::extract::Path;
use axum::Extension;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{require, Action};
use crate::app::{CurrentSession, JsonBody, SharedState};
use crate::err::Error;
use crate::models::{distinct_ids, AuthorView, Comment};
use crate::{proceeds, Payload};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub content: String,
    pub author: Option<AuthorView>,
    pub notice_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    fn of(comment: Comment, author: Option<AuthorView>) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            author,
            notice_id: comment.notice,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentsEnvelope {
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentEnvelope {
    pub comment: CommentView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub content: String,
}

pub async fn list_comments(
    Path(id): Path<String>,
    Extension(state): Extension<SharedState>,
) -> Payload<CommentsEnvelope> {
    let notice = Uuid::from_str(&id)?;
    let comments = state.store.list_comments(notice).await?;
    let authors = state
        .store
        .authors(&distinct_ids(comments.iter().map(|c| c.author)))
        .await?;
    proceeds(CommentsEnvelope {
        comments: comments
            .into_iter()
            .map(|comment| {
                let author = authors.get(&comment.author).cloned();
                CommentView::of(comment, author)
            })
            .collect(),
    })
}

pub async fn create_comment(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Extension(state): Extension<SharedState>,
    JsonBody(body): JsonBody<CreateComment>,
) -> Payload<CommentEnvelope> {
    let session = require(session.as_ref(), Action::CreateComment)?;
    if body.content.trim().is_empty() {
        return Err(Error::invalid("`content` must not be empty"));
    }
    let notice = Uuid::from_str(&id)?;
    if state.store.find_notice(notice).await?.is_none() {
        return Err(Error::not_found("Notice"));
    }

    let comment = state
        .store
        .create_comment(Comment {
            id: Uuid::new_v4(),
            content: body.content,
            author: session.id,
            notice,
            created_at: Utc::now(),
        })
        .await?;
    log::debug!("{} commented on notice {}", session.email, notice);

    proceeds(CommentEnvelope {
        comment: CommentView::of(comment, Some(session.author())),
    })
}
