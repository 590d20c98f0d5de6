use axum::Extension;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{require, Action};
use crate::app::{CurrentSession, JsonBody, SharedState};
use crate::models::Event;
use crate::{proceeds, Payload};

#[derive(Debug, Clone, Serialize)]
pub struct EventsEnvelope {
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub event: Event,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    /// Free-form, unlike notice categories.
    pub category: Option<String>,
}

pub async fn list_events(Extension(state): Extension<SharedState>) -> Payload<EventsEnvelope> {
    let events = state.store.list_events().await?;
    proceeds(EventsEnvelope { events })
}

pub async fn create_event(
    CurrentSession(session): CurrentSession,
    Extension(state): Extension<SharedState>,
    JsonBody(body): JsonBody<CreateEvent>,
) -> Payload<EventEnvelope> {
    let session = require(session.as_ref(), Action::CreateEvent)?;
    let event = state
        .store
        .create_event(Event {
            id: Uuid::new_v4(),
            title: body.title,
            date: body.date,
            description: body.description,
            category: body.category.unwrap_or_else(|| "General".to_string()),
            created_at: Utc::now(),
        })
        .await?;
    log::info!("Event {} scheduled by {}", event.id, session.email);
    proceeds(EventEnvelope { event })
}
