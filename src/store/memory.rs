//! In-process store for tests and for running without a database.
//! Nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PortalStore, StoreError, StoreResult};
use crate::access::NoticeFilter;
use crate::models::{Assignment, AuthorView, Comment, Event, Notice, Role, User};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    notices: HashMap<Uuid, Notice>,
    assignments: HashMap<Uuid, Assignment>,
    events: HashMap<Uuid, Event>,
    comments: Vec<Comment>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PortalStore for InMemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("User already exists".into()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.inner.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        user.role = role;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        match self.inner.write().await.users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound("User")),
        }
    }

    async fn authors(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, AuthorView>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.users.get(id))
            .map(|user| (user.id, AuthorView::from(user)))
            .collect())
    }

    async fn list_notices(&self, filter: &NoticeFilter) -> StoreResult<Vec<Notice>> {
        let inner = self.inner.read().await;
        let mut notices: Vec<Notice> = inner
            .notices
            .values()
            .filter(|notice| filter.admits(notice))
            .cloned()
            .collect();
        notices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notices)
    }

    async fn find_notice(&self, id: Uuid) -> StoreResult<Option<Notice>> {
        Ok(self.inner.read().await.notices.get(&id).cloned())
    }

    async fn create_notice(&self, notice: Notice) -> StoreResult<Notice> {
        let mut inner = self.inner.write().await;
        inner.notices.insert(notice.id, notice.clone());
        Ok(notice)
    }

    async fn delete_notice(&self, id: Uuid) -> StoreResult<()> {
        match self.inner.write().await.notices.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound("Notice")),
        }
    }

    async fn list_assignments(&self) -> StoreResult<Vec<Assignment>> {
        let mut assignments: Vec<Assignment> = self
            .inner
            .read()
            .await
            .assignments
            .values()
            .cloned()
            .collect();
        assignments.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        Ok(assignments)
    }

    async fn find_assignment(&self, id: Uuid) -> StoreResult<Option<Assignment>> {
        Ok(self.inner.read().await.assignments.get(&id).cloned())
    }

    async fn create_assignment(&self, assignment: Assignment) -> StoreResult<Assignment> {
        let mut inner = self.inner.write().await;
        inner.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn save_assignment(&self, assignment: &Assignment) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .assignments
            .get_mut(&assignment.id)
            .ok_or(StoreError::NotFound("Assignment"))?;
        stored.submissions = assignment.submissions.clone();
        Ok(())
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self.inner.read().await.events.values().cloned().collect();
        events.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(events)
    }

    async fn create_event(&self, event: Event) -> StoreResult<Event> {
        let mut inner = self.inner.write().await;
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn list_comments(&self, notice: Uuid) -> StoreResult<Vec<Comment>> {
        let inner = self.inner.read().await;
        let mut comments: Vec<Comment> = inner
            .comments
            .iter()
            .filter(|c| c.notice == notice)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn create_comment(&self, comment: Comment) -> StoreResult<Comment> {
        self.inner.write().await.comments.push(comment.clone());
        Ok(comment)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
