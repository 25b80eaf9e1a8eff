//! Persistence backends for users and tickets.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::error::{AppError, Result};
use crate::models::ticket::{NewTicket, Note, Ticket, TicketStatus};
use crate::models::user::{NewUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Account storage
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account; fails with `DuplicateEmail` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Look up an account by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn count_users(&self) -> Result<i64>;
}

/// Ticket storage.
///
/// Each mutating call is a single atomic write to one ticket.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Insert a new `Active` ticket with a fresh ticket number.
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket>;

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>>;

    /// Tickets owned by a customer, newest first.
    async fn list_tickets_for_customer(&self, customer_id: Uuid) -> Result<Vec<Ticket>>;

    /// Every ticket, most recently updated first.
    async fn list_tickets(&self) -> Result<Vec<Ticket>>;

    /// Overwrite the status and refresh `updated_at`. `None` if the ticket is gone.
    async fn update_status(&self, id: Uuid, status: TicketStatus) -> Result<Option<Ticket>>;

    /// Append a note and refresh `updated_at`. `false` if the ticket is gone.
    async fn append_note(&self, id: Uuid, note: &Note) -> Result<bool>;

    /// Remove a ticket. `false` if it did not exist.
    async fn delete_ticket(&self, id: Uuid) -> Result<bool>;

    /// Ticket counts grouped by status, optionally restricted to one customer.
    /// Statuses with no tickets may be omitted.
    async fn count_by_status(&self, customer_id: Option<Uuid>) -> Result<Vec<(TicketStatus, i64)>>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Store handles shared by the API layer.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tickets: Arc<dyn TicketStore>,
}

impl Stores {
    /// In-process store, used for development and tests.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            tickets: store,
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            tickets: store,
        }
    }
}

/// Open the configured backend, running migrations for postgres.
pub async fn connect(config: &Config) -> Result<Stores> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Stores::in_memory())
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| AppError::Config("DATABASE_URL not set".into()))?;
            let store = PgStore::connect(url, config.database_max_connections).await?;
            tracing::info!("Connected to database");
            store.migrate().await?;
            tracing::info!("Database migrations complete");
            Ok(Stores::postgres(store))
        }
    }
}
