//! Roles and the per-role rule tables.
//!
//! Status permissions and dashboard buckets are plain data keyed by role so
//! they can be checked without touching storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use super::ticket::TicketStatus;

/// Fixed helpdesk roles
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Agent,
    Admin,
}

const ADMIN_STATUSES: &[TicketStatus] = &[
    TicketStatus::Active,
    TicketStatus::Pending,
    TicketStatus::Closed,
];

const AGENT_STATUSES: &[TicketStatus] = &[
    TicketStatus::Active,
    TicketStatus::Pending,
    TicketStatus::Review,
];

const CUSTOMER_STATUSES: &[TicketStatus] = &[];

const CUSTOMER_DASHBOARD: &[TicketStatus] = &[
    TicketStatus::Active,
    TicketStatus::Pending,
    TicketStatus::Closed,
];

impl Role {
    pub const ALL: [Role; 3] = [Role::Customer, Role::Agent, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }

    /// Statuses this role may assign through the status-update operation.
    pub fn allowed_statuses(&self) -> &'static [TicketStatus] {
        match self {
            Role::Admin => ADMIN_STATUSES,
            Role::Agent => AGENT_STATUSES,
            Role::Customer => CUSTOMER_STATUSES,
        }
    }

    pub fn may_set_status(&self, status: TicketStatus) -> bool {
        self.allowed_statuses().contains(&status)
    }

    /// Agents and admins see every ticket; customers only their own.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Agent | Role::Admin)
    }

    /// Status keys reported on this role's dashboard.
    pub fn dashboard_statuses(&self) -> &'static [TicketStatus] {
        match self {
            Role::Customer => CUSTOMER_DASHBOARD,
            Role::Agent => AGENT_STATUSES,
            Role::Admin => ADMIN_STATUSES,
        }
    }

    /// Dashboard key a ticket in `status` is counted under.
    ///
    /// Statuses outside the role's key set fold into a neighbouring bucket so
    /// the counts always add up to the number of visible tickets.
    pub fn dashboard_bucket(&self, status: TicketStatus) -> TicketStatus {
        match (self, status) {
            (Role::Customer | Role::Admin, TicketStatus::Review) => TicketStatus::Pending,
            (Role::Agent, TicketStatus::Closed) => TicketStatus::Review,
            (_, status) => status,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "agent" => Ok(Role::Agent),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}
