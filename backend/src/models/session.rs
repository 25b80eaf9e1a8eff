//! Authenticated request context.

use uuid::Uuid;

use super::role::Role;
use super::ticket::{NoteAuthor, Ticket};

/// Identity and effective role of the caller, decoded from the bearer token
/// and passed explicitly to every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Session {
    /// Customers see their own tickets; staff see all of them.
    pub fn can_view(&self, ticket: &Ticket) -> bool {
        self.role.is_staff() || ticket.is_owned_by(self.user_id)
    }

    pub fn author(&self) -> NoteAuthor {
        NoteAuthor {
            id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}
