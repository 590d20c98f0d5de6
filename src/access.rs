//! Role gates and notice visibility.
//!
//! Every mutating handler asks [`require`] for the caller's session before it
//! touches the store. Anonymous callers and callers with the wrong role get the
//! same 403; only the login endpoint answers 401.
//!
//! Notice visibility is expressed as a [`NoticeFilter`] handed to the store, so
//! the same predicate drives the SQL `WHERE` clause and the in-memory scan.

use crate::auth::Session;
use crate::err::Error;
use crate::models::{Notice, Role};

/// Sentinel category meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Action {
    ListNotices,
    ReadNotice,
    CreateNotice,
    DeleteNotice,
    ListComments,
    CreateComment,
    ListAssignments,
    ReadAssignment,
    CreateAssignment,
    SubmitAssignment,
    ListEvents,
    CreateEvent,
    ListUsers,
    CreateUser,
    DeleteUser,
    PatchUser,
}

impl Action {
    fn denial(&self) -> &'static str {
        match self {
            Action::SubmitAssignment => "Only students can submit assignments",
            _ => "Unauthorized",
        }
    }
}

pub fn permits(session: Option<&Session>, action: Action) -> bool {
    use Action::*;

    match action {
        ListNotices | ReadNotice | ListComments | ListAssignments | ReadAssignment
        | ListEvents => true,
        CreateComment => session.is_some(),
        // Any staff member may delete any notice, not only their own.
        CreateNotice | DeleteNotice | CreateAssignment | CreateEvent => {
            matches!(session, Some(s) if s.role != Role::Student)
        }
        SubmitAssignment => matches!(session, Some(s) if s.role == Role::Student),
        ListUsers | CreateUser | DeleteUser | PatchUser => {
            matches!(session, Some(s) if s.role == Role::Admin)
        }
    }
}

/// Returns the caller's session when `action` is allowed for it.
pub fn require(session: Option<&Session>, action: Action) -> Result<&Session, Error> {
    match session {
        Some(session) if permits(Some(session), action) => Ok(session),
        _ => {
            log::debug!(
                "Denied {:?} to {}",
                action,
                session.map(|s| s.email.as_str()).unwrap_or("anonymous")
            );
            Err(Error::forbidden(action.denial()))
        }
    }
}

/// Store-level selection for the notice list.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct NoticeFilter {
    /// Exact category to match; `None` matches every category.
    pub category: Option<String>,
    /// Set for student callers. Other callers see every department.
    pub audience: Option<Audience>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Audience {
    /// The student's department; `None` restricts them to public notices.
    pub department: Option<String>,
}

impl NoticeFilter {
    pub fn for_caller(session: Option<&Session>, category: Option<&str>) -> Self {
        let category = category
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
            .map(str::to_string);
        let audience = match session {
            Some(s) if s.role == Role::Student => Some(Audience {
                department: s.department.clone().filter(|d| !d.is_empty()),
            }),
            _ => None,
        };
        Self { category, audience }
    }

    pub fn admits(&self, notice: &Notice) -> bool {
        if let Some(category) = &self.category {
            if notice.category.as_str() != category {
                return false;
            }
        }
        match &self.audience {
            None => true,
            Some(audience) => match notice.target_departments.as_deref() {
                None | Some([]) => true,
                Some(targets) => match &audience.department {
                    Some(department) => targets.iter().any(|t| t == department),
                    None => false,
                },
            },
        }
    }
}
