//! In-memory store backend.
//!
//! Keeps users and tickets in process-local maps. Each operation takes the
//! relevant write lock once, so a status change or note append is atomic with
//! respect to other requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TicketStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::ticket::{format_ticket_number, NewTicket, Note, Ticket, TicketStatus};
use crate::models::user::{NewUser, User};

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    tickets: RwLock<HashMap<Uuid, Ticket>>,
    ticket_seq: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateEmail);
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.users.read().await.len() as i64)
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
        let customer = self
            .find_user(ticket.customer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

        let seq = self.ticket_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let created = Ticket {
            id: Uuid::new_v4(),
            ticket_number: format_ticket_number(seq),
            title: ticket.title,
            description: ticket.description,
            status: TicketStatus::Active,
            customer_id: customer.id,
            customer_name: customer.name,
            customer_email: customer.email,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.tickets
            .write()
            .await
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
        Ok(self.tickets.read().await.get(&id).cloned())
    }

    async fn list_tickets_for_customer(&self, customer_id: Uuid) -> Result<Vec<Ticket>> {
        let tickets = self.tickets.read().await;
        let mut owned: Vec<Ticket> = tickets
            .values()
            .filter(|t| t.customer_id == customer_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let tickets = self.tickets.read().await;
        let mut all: Vec<Ticket> = tickets.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    async fn update_status(&self, id: Uuid, status: TicketStatus) -> Result<Option<Ticket>> {
        let mut tickets = self.tickets.write().await;
        Ok(tickets.get_mut(&id).map(|ticket| {
            ticket.status = status;
            ticket.updated_at = Utc::now();
            ticket.clone()
        }))
    }

    async fn append_note(&self, id: Uuid, note: &Note) -> Result<bool> {
        let mut tickets = self.tickets.write().await;
        match tickets.get_mut(&id) {
            Some(ticket) => {
                ticket.notes.push(note.clone());
                ticket.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<bool> {
        Ok(self.tickets.write().await.remove(&id).is_some())
    }

    async fn count_by_status(&self, customer_id: Option<Uuid>) -> Result<Vec<(TicketStatus, i64)>> {
        let tickets = self.tickets.read().await;
        let mut counts: HashMap<TicketStatus, i64> = HashMap::new();
        for ticket in tickets
            .values()
            .filter(|t| customer_id.map_or(true, |id| t.customer_id == id))
        {
            *counts.entry(ticket.status).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }
}
