use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::access::NoticeFilter;
use crate::models::{Assignment, AuthorView, Comment, Event, Notice, Role, User};

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Carries the entity name, e.g. `"Notice"`.
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document storage behind the portal. Each call is independent; there are
/// no transactions spanning calls.
#[async_trait]
pub trait PortalStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: User) -> StoreResult<User>;
    /// Newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_user_role(&self, id: Uuid, role: Role) -> StoreResult<User>;
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;
    /// `{_id, name, role}` projections for the given ids. Unknown ids are absent.
    async fn authors(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, AuthorView>>;

    async fn author(&self, id: Uuid) -> StoreResult<Option<AuthorView>> {
        Ok(self.authors(&[id]).await?.remove(&id))
    }

    /// Notices admitted by `filter`, newest first.
    async fn list_notices(&self, filter: &NoticeFilter) -> StoreResult<Vec<Notice>>;
    async fn find_notice(&self, id: Uuid) -> StoreResult<Option<Notice>>;
    async fn create_notice(&self, notice: Notice) -> StoreResult<Notice>;
    async fn delete_notice(&self, id: Uuid) -> StoreResult<()>;

    /// Ordered by due date, earliest first.
    async fn list_assignments(&self) -> StoreResult<Vec<Assignment>>;
    async fn find_assignment(&self, id: Uuid) -> StoreResult<Option<Assignment>>;
    async fn create_assignment(&self, assignment: Assignment) -> StoreResult<Assignment>;
    /// Overwrites the stored submissions with `assignment.submissions`.
    /// Last write wins; there is no version check.
    async fn save_assignment(&self, assignment: &Assignment) -> StoreResult<()>;

    /// Ordered by date, earliest first.
    async fn list_events(&self) -> StoreResult<Vec<Event>>;
    async fn create_event(&self, event: Event) -> StoreResult<Event>;

    /// Oldest first.
    async fn list_comments(&self, notice: Uuid) -> StoreResult<Vec<Comment>>;
    async fn create_comment(&self, comment: Comment) -> StoreResult<Comment>;

    fn backend_name(&self) -> &'static str;
}
