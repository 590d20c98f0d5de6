use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    #[default]
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => anyhow::bail!("unknown role `{}`", other),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
pub enum NoticeCategory {
    Urgent,
    Academic,
    Exam,
    Event,
    #[default]
    General,
}

impl NoticeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeCategory::Urgent => "Urgent",
            NoticeCategory::Academic => "Academic",
            NoticeCategory::Exam => "Exam",
            NoticeCategory::Event => "Event",
            NoticeCategory::General => "General",
        }
    }
}

impl FromStr for NoticeCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Urgent" => Ok(NoticeCategory::Urgent),
            "Academic" => Ok(NoticeCategory::Academic),
            "Exam" => Ok(NoticeCategory::Exam),
            "Event" => Ok(NoticeCategory::Event),
            "General" => Ok(NoticeCategory::General),
            other => anyhow::bail!("unknown notice category `{}`", other),
        }
    }
}

/// Stored account. Never serialized directly, see [`UserView`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Account as returned to clients; the password hash has no field here.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            student_id: user.student_id.clone(),
            department: user.department.clone(),
            year: user.year.clone(),
            created_at: user.created_at,
        }
    }
}

/// Populated author reference: `{_id, name, role}` and nothing else.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct AuthorView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

impl From<&User> for AuthorView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Unique ids in first-seen order, for batch author lookups.
pub fn distinct_ids(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: NoticeCategory,
    pub attachments: Vec<String>,
    /// `None` for records written before departments were tracked.
    pub target_departments: Option<Vec<String>>,
    pub author: Uuid,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub student: Uuid,
    pub file_url: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub attachments: Vec<String>,
    pub author: Uuid,
    pub submissions: Vec<Submission>,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// Records `student`'s submission, keeping at most one per student.
    ///
    /// A resubmission overwrites the existing entry in place, so its position
    /// in the list is stable. Returns `true` when an entry was replaced.
    pub fn upsert_submission(
        &mut self,
        student: Uuid,
        file_url: String,
        submitted_at: DateTime<Utc>,
    ) -> bool {
        if let Some(existing) = self
            .submissions
            .iter_mut()
            .find(|sub| sub.student == student)
        {
            existing.file_url = file_url;
            existing.submitted_at = submitted_at;
            true
        } else {
            self.submissions.push(Submission {
                student,
                file_url,
                submitted_at,
            });
            false
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author: Uuid,
    pub notice: Uuid,
    pub created_at: DateTime<Utc>,
}
