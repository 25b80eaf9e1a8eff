//! PostgreSQL store backend.
//!
//! Notes live in a JSONB array on the ticket row so that an append is a single
//! `UPDATE` of one record.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;

use super::{TicketStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::ticket::{format_ticket_number, NewTicket, Note, Ticket, TicketStatus};
use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

const TICKET_COLUMNS: &str = "t.id, t.ticket_number, t.title, t.description, t.status, \
     t.customer_id, u.name AS customer_name, u.email AS customer_email, \
     t.notes, t.created_at, t.updated_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a connection pool and wrap it
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    AppError::DuplicateEmail
                } else {
                    AppError::Database(e)
                }
            })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
        let seq: i64 = sqlx::query_scalar("SELECT nextval('ticket_number_seq')")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "WITH t AS ( \
                 INSERT INTO tickets \
                     (id, ticket_number, title, description, status, customer_id, notes, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, '[]'::jsonb, $7, $7) \
                 RETURNING * \
             ) \
             SELECT {TICKET_COLUMNS} FROM t JOIN users u ON u.id = t.customer_id"
        );

        let created = sqlx::query_as::<_, Ticket>(&sql)
            .bind(Uuid::new_v4())
            .bind(format_ticket_number(seq))
            .bind(&ticket.title)
            .bind(&ticket.description)
            .bind(TicketStatus::Active)
            .bind(ticket.customer_id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets t JOIN users u ON u.id = t.customer_id \
             WHERE t.id = $1"
        );
        let ticket = sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ticket)
    }

    async fn list_tickets_for_customer(&self, customer_id: Uuid) -> Result<Vec<Ticket>> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets t JOIN users u ON u.id = t.customer_id \
             WHERE t.customer_id = $1 ORDER BY t.created_at DESC"
        );
        let tickets = sqlx::query_as::<_, Ticket>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tickets)
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let sql = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets t JOIN users u ON u.id = t.customer_id \
             ORDER BY t.updated_at DESC"
        );
        let tickets = sqlx::query_as::<_, Ticket>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(tickets)
    }

    async fn update_status(&self, id: Uuid, status: TicketStatus) -> Result<Option<Ticket>> {
        let sql = format!(
            "WITH t AS ( \
                 UPDATE tickets SET status = $2, updated_at = $3 WHERE id = $1 RETURNING * \
             ) \
             SELECT {TICKET_COLUMNS} FROM t JOIN users u ON u.id = t.customer_id"
        );
        let ticket = sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        Ok(ticket)
    }

    async fn append_note(&self, id: Uuid, note: &Note) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE tickets SET notes = notes || $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(Json(vec![note.clone()]))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self, customer_id: Option<Uuid>) -> Result<Vec<(TicketStatus, i64)>> {
        let counts = sqlx::query_as::<_, (TicketStatus, i64)>(
            "SELECT status, COUNT(*) FROM tickets \
             WHERE ($1::uuid IS NULL OR customer_id = $1) \
             GROUP BY status",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
