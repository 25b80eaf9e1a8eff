//! Dashboard statistics.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::role::Role;
use crate::models::session::Session;
use crate::models::ticket::TicketStatus;
use crate::storage::{TicketStore, UserStore};

/// Role-scoped ticket counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub role: Role,
    /// Count per status key of the caller's dashboard
    #[schema(value_type = Object)]
    pub tickets: BTreeMap<TicketStatus, i64>,
    /// Number of visible tickets; always the sum of `tickets`
    pub total_tickets: i64,
    /// Registered accounts, admins only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_users: Option<i64>,
}

/// Dashboard service
pub struct DashboardService {
    users: Arc<dyn UserStore>,
    tickets: Arc<dyn TicketStore>,
}

impl DashboardService {
    pub fn new(users: Arc<dyn UserStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self { users, tickets }
    }

    /// Compute the caller's dashboard. Nothing is cached.
    pub async fn stats(&self, session: &Session) -> Result<DashboardStats> {
        let scope = match session.role {
            Role::Customer => Some(session.user_id),
            Role::Agent | Role::Admin => None,
        };
        let counts = self.tickets.count_by_status(scope).await?;

        let total_users = match session.role {
            Role::Admin => Some(self.users.count_users().await?),
            _ => None,
        };

        Ok(bucket_counts(session.role, counts, total_users))
    }
}

/// Fold raw per-status counts into the role's dashboard keys.
fn bucket_counts(
    role: Role,
    counts: Vec<(TicketStatus, i64)>,
    total_users: Option<i64>,
) -> DashboardStats {
    let mut tickets: BTreeMap<TicketStatus, i64> = role
        .dashboard_statuses()
        .iter()
        .map(|&status| (status, 0))
        .collect();

    let mut total_tickets = 0;
    for (status, count) in counts {
        *tickets.entry(role.dashboard_bucket(status)).or_insert(0) += count;
        total_tickets += count;
    }

    DashboardStats {
        role,
        tickets,
        total_tickets,
        total_users,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ticket::NewTicket;
    use crate::models::user::NewUser;
    use crate::storage::MemoryStore;
    use uuid::Uuid;

    fn keys(stats: &DashboardStats) -> Vec<TicketStatus> {
        stats.tickets.keys().copied().collect()
    }

    #[test]
    fn test_empty_counts_have_every_key() {
        for role in Role::ALL {
            let stats = bucket_counts(role, Vec::new(), None);
            assert_eq!(keys(&stats), role.dashboard_statuses().to_vec());
            assert!(stats.tickets.values().all(|&n| n == 0));
            assert_eq!(stats.total_tickets, 0);
        }
    }

    #[test]
    fn test_folded_counts_sum_to_total() {
        let raw = vec![
            (TicketStatus::Active, 3),
            (TicketStatus::Pending, 2),
            (TicketStatus::Review, 5),
            (TicketStatus::Closed, 7),
        ];
        for role in Role::ALL {
            let stats = bucket_counts(role, raw.clone(), None);
            assert_eq!(keys(&stats), role.dashboard_statuses().to_vec());
            assert_eq!(stats.tickets.values().sum::<i64>(), 17);
            assert_eq!(stats.total_tickets, 17);
        }

        let agent = bucket_counts(Role::Agent, raw.clone(), None);
        assert_eq!(agent.tickets[&TicketStatus::Review], 12);
        let admin = bucket_counts(Role::Admin, raw, None);
        assert_eq!(admin.tickets[&TicketStatus::Pending], 7);
        assert_eq!(admin.tickets[&TicketStatus::Closed], 7);
    }

    #[test]
    fn test_serialized_shape() {
        let stats = bucket_counts(Role::Admin, vec![(TicketStatus::Active, 1)], Some(4));
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["role"], "admin");
        assert_eq!(value["tickets"]["Active"], 1);
        assert_eq!(value["tickets"]["Closed"], 0);
        assert_eq!(value["totalUsers"], 4);

        let stats = bucket_counts(Role::Agent, Vec::new(), None);
        let value = serde_json::to_value(&stats).unwrap();
        assert!(value.get("totalUsers").is_none());
        assert_eq!(value["tickets"]["Review"], 0);
    }

    #[tokio::test]
    async fn test_stats_scoped_by_role() {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for name in ["cara", "dan"] {
            let user = store
                .create_user(NewUser {
                    name: name.into(),
                    email: format!("{name}@example.com"),
                    password_hash: "hash".into(),
                    role: Role::Customer,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        for (owner, title) in [(ids[0], "a"), (ids[0], "b"), (ids[1], "c")] {
            store
                .create_ticket(NewTicket {
                    title: title.into(),
                    description: "d".into(),
                    customer_id: owner,
                })
                .await
                .unwrap();
        }

        let service = DashboardService::new(store.clone(), store);
        let session = |user_id: Uuid, role: Role| Session {
            user_id,
            name: "x".into(),
            email: "x@example.com".into(),
            role,
        };

        let cara = service.stats(&session(ids[0], Role::Customer)).await.unwrap();
        assert_eq!(cara.tickets[&TicketStatus::Active], 2);
        assert_eq!(cara.total_users, None);

        let agent = service.stats(&session(Uuid::new_v4(), Role::Agent)).await.unwrap();
        assert_eq!(agent.total_tickets, 3);
        assert_eq!(agent.total_users, None);

        let admin = service.stats(&session(Uuid::new_v4(), Role::Admin)).await.unwrap();
        assert_eq!(admin.tickets[&TicketStatus::Active], 3);
        assert_eq!(admin.total_users, Some(2));
    }
}
