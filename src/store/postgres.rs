//! Postgres-backed store.
//!
//! Tables are created on startup when missing. Notice departments live in a
//! nullable `TEXT[]` where NULL marks rows written before the column was
//! populated; submissions are a JSONB array written back whole on every save.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{PortalStore, StoreError, StoreResult};
use crate::access::NoticeFilter;
use crate::models::{
    Assignment, AuthorView, Comment, Event, Notice, NoticeCategory, Role, Submission, User,
};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        uuid UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'student',
        student_id TEXT,
        department TEXT,
        year TEXT,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS notices (
        uuid UUID PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT 'General',
        attachments TEXT[] NOT NULL DEFAULT '{}',
        target_departments TEXT[],
        author UUID NOT NULL,
        scheduled_for TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS assignments (
        uuid UUID PRIMARY KEY,
        title TEXT NOT NULL,
        subject TEXT NOT NULL,
        description TEXT,
        due_date TIMESTAMPTZ NOT NULL,
        attachments TEXT[] NOT NULL DEFAULT '{}',
        author UUID NOT NULL,
        submissions JSONB NOT NULL DEFAULT '[]',
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS events (
        uuid UUID PRIMARY KEY,
        title TEXT NOT NULL,
        date TIMESTAMPTZ NOT NULL,
        description TEXT,
        category TEXT NOT NULL DEFAULT 'General',
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS comments (
        uuid UUID PRIMARY KEY,
        content TEXT NOT NULL,
        author UUID NOT NULL,
        notice UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
];

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn unexpected(err: sqlx::Error) -> StoreError {
    StoreError::Unexpected(err.into())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

#[derive(sqlx::FromRow)]
struct DbUser {
    uuid: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    student_id: Option<String>,
    department: Option<String>,
    year: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = StoreError;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.uuid,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: Role::from_str(&row.role)?,
            student_id: row.student_id,
            department: row.department,
            year: row.year,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DbAuthor {
    uuid: Uuid,
    name: String,
    role: String,
}

#[derive(sqlx::FromRow)]
struct DbNotice {
    uuid: Uuid,
    title: String,
    content: String,
    category: String,
    attachments: Vec<String>,
    target_departments: Option<Vec<String>>,
    author: Uuid,
    scheduled_for: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DbNotice> for Notice {
    type Error = StoreError;

    fn try_from(row: DbNotice) -> Result<Self, Self::Error> {
        Ok(Notice {
            id: row.uuid,
            title: row.title,
            content: row.content,
            category: NoticeCategory::from_str(&row.category)?,
            attachments: row.attachments,
            target_departments: row.target_departments,
            author: row.author,
            scheduled_for: row.scheduled_for,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DbAssignment {
    uuid: Uuid,
    title: String,
    subject: String,
    description: Option<String>,
    due_date: DateTime<Utc>,
    attachments: Vec<String>,
    author: Uuid,
    submissions: Json<Vec<Submission>>,
    created_at: DateTime<Utc>,
}

impl From<DbAssignment> for Assignment {
    fn from(row: DbAssignment) -> Self {
        Assignment {
            id: row.uuid,
            title: row.title,
            subject: row.subject,
            description: row.description,
            due_date: row.due_date,
            attachments: row.attachments,
            author: row.author,
            submissions: row.submissions.0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DbEvent {
    uuid: Uuid,
    title: String,
    date: DateTime<Utc>,
    description: Option<String>,
    category: String,
    created_at: DateTime<Utc>,
}

impl From<DbEvent> for Event {
    fn from(row: DbEvent) -> Self {
        Event {
            id: row.uuid,
            title: row.title,
            date: row.date,
            description: row.description,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DbComment {
    uuid: Uuid,
    content: String,
    author: Uuid,
    notice: Uuid,
    created_at: DateTime<Utc>,
}

impl From<DbComment> for Comment {
    fn from(row: DbComment) -> Self {
        Comment {
            id: row.uuid,
            content: row.content,
            author: row.author,
            notice: row.notice,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PortalStore for PostgresStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE uuid = $1 LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE email = $1 LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let res = sqlx::query(
            "INSERT INTO users (uuid, name, email, password_hash, role, student_id, department, year, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.student_id)
        .bind(&user.department)
        .bind(&user.year)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;
        match res {
            Ok(_) => Ok(user),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::Conflict("User already exists".into()))
            }
            Err(err) => Err(unexpected(err)),
        }
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, DbUser>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn update_user_role(&self, id: Uuid, role: Role) -> StoreResult<User> {
        let row = sqlx::query_as::<_, DbUser>(
            "UPDATE users SET role = $2 WHERE uuid = $1 RETURNING *",
        )
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        match row {
            Some(row) => User::try_from(row),
            None => Err(StoreError::NotFound("User")),
        }
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let res = sqlx::query("DELETE FROM users WHERE uuid = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if res.rows_affected() < 1 {
            return Err(StoreError::NotFound("User"));
        }
        Ok(())
    }

    async fn authors(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, AuthorView>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, DbAuthor>(
            "SELECT uuid, name, role FROM users WHERE uuid = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        rows.into_iter()
            .map(|row| -> StoreResult<(Uuid, AuthorView)> {
                let author = AuthorView {
                    id: row.uuid,
                    name: row.name,
                    role: Role::from_str(&row.role)?,
                };
                Ok((author.id, author))
            })
            .collect()
    }

    async fn list_notices(&self, filter: &NoticeFilter) -> StoreResult<Vec<Notice>> {
        let (scoped, department) = match &filter.audience {
            Some(audience) => (true, audience.department.as_deref()),
            None => (false, None),
        };
        let rows = sqlx::query_as::<_, DbNotice>(
            "SELECT * FROM notices \
             WHERE ($1::TEXT IS NULL OR category = $1) \
               AND (NOT $2 \
                    OR target_departments IS NULL \
                    OR cardinality(target_departments) = 0 \
                    OR ($3::TEXT IS NOT NULL AND $3 = ANY(target_departments))) \
             ORDER BY created_at DESC",
        )
        .bind(filter.category.as_deref())
        .bind(scoped)
        .bind(department)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        rows.into_iter().map(Notice::try_from).collect()
    }

    async fn find_notice(&self, id: Uuid) -> StoreResult<Option<Notice>> {
        let row = sqlx::query_as::<_, DbNotice>("SELECT * FROM notices WHERE uuid = $1 LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        row.map(Notice::try_from).transpose()
    }

    async fn create_notice(&self, notice: Notice) -> StoreResult<Notice> {
        sqlx::query(
            "INSERT INTO notices (uuid, title, content, category, attachments, target_departments, author, scheduled_for, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(notice.id)
        .bind(&notice.title)
        .bind(&notice.content)
        .bind(notice.category.as_str())
        .bind(&notice.attachments)
        .bind(&notice.target_departments)
        .bind(notice.author)
        .bind(notice.scheduled_for)
        .bind(notice.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(notice)
    }

    async fn delete_notice(&self, id: Uuid) -> StoreResult<()> {
        let res = sqlx::query("DELETE FROM notices WHERE uuid = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if res.rows_affected() < 1 {
            return Err(StoreError::NotFound("Notice"));
        }
        Ok(())
    }

    async fn list_assignments(&self) -> StoreResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, DbAssignment>(
            "SELECT * FROM assignments ORDER BY due_date ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    async fn find_assignment(&self, id: Uuid) -> StoreResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, DbAssignment>(
            "SELECT * FROM assignments WHERE uuid = $1 LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(Assignment::from))
    }

    async fn create_assignment(&self, assignment: Assignment) -> StoreResult<Assignment> {
        sqlx::query(
            "INSERT INTO assignments (uuid, title, subject, description, due_date, attachments, author, submissions, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(assignment.id)
        .bind(&assignment.title)
        .bind(&assignment.subject)
        .bind(&assignment.description)
        .bind(assignment.due_date)
        .bind(&assignment.attachments)
        .bind(assignment.author)
        .bind(Json(&assignment.submissions))
        .bind(assignment.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(assignment)
    }

    async fn save_assignment(&self, assignment: &Assignment) -> StoreResult<()> {
        let res = sqlx::query("UPDATE assignments SET submissions = $2 WHERE uuid = $1")
            .bind(assignment.id)
            .bind(Json(&assignment.submissions))
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if res.rows_affected() < 1 {
            return Err(StoreError::NotFound("Assignment"));
        }
        Ok(())
    }

    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, DbEvent>("SELECT * FROM events ORDER BY date ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn create_event(&self, event: Event) -> StoreResult<Event> {
        sqlx::query(
            "INSERT INTO events (uuid, title, date, description, category, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(event.date)
        .bind(&event.description)
        .bind(&event.category)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(event)
    }

    async fn list_comments(&self, notice: Uuid) -> StoreResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, DbComment>(
            "SELECT * FROM comments WHERE notice = $1 ORDER BY created_at ASC",
        )
        .bind(notice)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn create_comment(&self, comment: Comment) -> StoreResult<Comment> {
        sqlx::query(
            "INSERT INTO comments (uuid, content, author, notice, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id)
        .bind(&comment.content)
        .bind(comment.author)
        .bind(comment.notice)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(comment)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
