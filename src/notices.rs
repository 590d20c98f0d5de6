use std::str::FromStr;

use axum::extract::{Path, Query};
use axum::Extension;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::access::{require, Action, NoticeFilter};
use crate::app::{CurrentSession, JsonBody, SharedState};
use crate::err::{Error, Success};
use crate::models::{distinct_ids, AuthorView, Notice, NoticeCategory};
use crate::{breaks, proceeds, Payload};

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: NoticeCategory,
    pub attachments: Vec<String>,
    pub target_departments: Option<Vec<String>>,
    #[serialize_always]
    pub author: Option<AuthorView>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NoticeView {
    fn of(notice: Notice, author: Option<AuthorView>) -> Self {
        Self {
            id: notice.id,
            title: notice.title,
            content: notice.content,
            category: notice.category,
            attachments: notice.attachments,
            target_departments: notice.target_departments,
            author,
            scheduled_for: notice.scheduled_for,
            created_at: notice.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NoticesEnvelope {
    pub notices: Vec<NoticeView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoticeEnvelope {
    pub notice: NoticeView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoticeQuery {
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotice {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub target_departments: Vec<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

pub async fn list_notices(
    CurrentSession(session): CurrentSession,
    Query(query): Query<NoticeQuery>,
    Extension(state): Extension<SharedState>,
) -> Payload<NoticesEnvelope> {
    let filter = NoticeFilter::for_caller(session.as_ref(), query.category.as_deref());
    let notices = state.store.list_notices(&filter).await?;
    let authors = state
        .store
        .authors(&distinct_ids(notices.iter().map(|n| n.author)))
        .await?;
    proceeds(NoticesEnvelope {
        notices: notices
            .into_iter()
            .map(|notice| {
                let author = authors.get(&notice.author).cloned();
                NoticeView::of(notice, author)
            })
            .collect(),
    })
}

pub async fn read_notice(
    Path(id): Path<String>,
    Extension(state): Extension<SharedState>,
) -> Payload<NoticeEnvelope> {
    let id = Uuid::from_str(&id)?;
    let notice = match state.store.find_notice(id).await? {
        Some(notice) => notice,
        None => return breaks(Error::not_found("Notice")),
    };
    let author = state.store.author(notice.author).await?;
    proceeds(NoticeEnvelope {
        notice: NoticeView::of(notice, author),
    })
}

pub async fn create_notice(
    CurrentSession(session): CurrentSession,
    Extension(state): Extension<SharedState>,
    JsonBody(body): JsonBody<CreateNotice>,
) -> Payload<NoticeEnvelope> {
    let session = require(session.as_ref(), Action::CreateNotice)?;
    let category = match body.category.as_deref() {
        None => NoticeCategory::default(),
        Some(raw) => {
            NoticeCategory::from_str(raw).map_err(|_| Error::invalid("Invalid category"))?
        }
    };

    let notice = state
        .store
        .create_notice(Notice {
            id: Uuid::new_v4(),
            title: body.title,
            content: body.content,
            category,
            attachments: body.attachments,
            target_departments: Some(body.target_departments),
            author: session.id,
            scheduled_for: body.scheduled_for,
            created_at: Utc::now(),
        })
        .await?;
    log::info!("Notice {} posted by {}", notice.id, session.email);

    proceeds(NoticeEnvelope {
        notice: NoticeView::of(notice, Some(session.author())),
    })
}

pub async fn delete_notice(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Extension(state): Extension<SharedState>,
) -> Payload<Success> {
    let session = require(session.as_ref(), Action::DeleteNotice)?;
    let id = Uuid::from_str(&id)?;
    state.store.delete_notice(id).await?;
    log::info!("Notice {} deleted by {}", id, session.email);
    proceeds(Success::new())
}
