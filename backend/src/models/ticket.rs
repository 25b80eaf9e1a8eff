//! Ticket and note models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use super::role::Role;

/// Ticket lifecycle status
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    sqlx::Type,
    ToSchema,
)]
#[sqlx(type_name = "ticket_status")]
pub enum TicketStatus {
    Active,
    Pending,
    Review,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Active,
        TicketStatus::Pending,
        TicketStatus::Review,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Active => "Active",
            TicketStatus::Pending => "Pending",
            TicketStatus::Review => "Review",
            TicketStatus::Closed => "Closed",
        }
    }

    /// Position in the staff triage listing: open work first, then tickets
    /// awaiting final disposition, then closed ones.
    pub fn triage_rank(&self) -> u8 {
        match self {
            TicketStatus::Active | TicketStatus::Pending => 0,
            TicketStatus::Review => 1,
            TicketStatus::Closed => 2,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author snapshot stored with each note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NoteAuthor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Append-only annotation on a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub text: String,
    pub added_by: NoteAuthor,
    /// Author's effective role when the note was posted
    pub note_type: Role,
    pub added_at: DateTime<Utc>,
}

/// Ticket entity with its embedded notes and owning customer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    #[serde(rename = "ticketId")]
    pub ticket_number: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    #[sqlx(json)]
    pub notes: Vec<Note>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.customer_id == user_id
    }
}

/// Fields needed to persist a new ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub customer_id: Uuid,
}

/// Human-readable ticket number from a store sequence value.
pub fn format_ticket_number(seq: i64) -> String {
    format!("TKT-{:06}", seq)
}
