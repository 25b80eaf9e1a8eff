//! Ticket service.
//!
//! Creation, listing, status changes, notes and deletion, each checked
//! against the caller's session before touching the store.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::session::Session;
use crate::models::ticket::{NewTicket, Note, Ticket, TicketStatus};
use crate::storage::TicketStore;

/// Request to open a ticket
#[derive(Debug)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
}

/// Ticket service
pub struct TicketService {
    tickets: Arc<dyn TicketStore>,
}

impl TicketService {
    /// Create a new ticket service
    pub fn new(tickets: Arc<dyn TicketStore>) -> Self {
        Self { tickets }
    }

    /// Open a ticket on behalf of the calling customer
    pub async fn create(&self, session: &Session, req: CreateTicketRequest) -> Result<Ticket> {
        if session.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only customers can submit tickets".to_string(),
            ));
        }

        let title = req.title.trim();
        let description = req.description.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        if description.is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }

        let ticket = self
            .tickets
            .create_ticket(NewTicket {
                title: title.to_string(),
                description: description.to_string(),
                customer_id: session.user_id,
            })
            .await?;

        tracing::info!(
            ticket_id = %ticket.id,
            ticket_number = %ticket.ticket_number,
            customer_id = %session.user_id,
            "Ticket created"
        );
        Ok(ticket)
    }

    /// Tickets owned by the caller, newest first
    pub async fn list_my(&self, session: &Session) -> Result<Vec<Ticket>> {
        self.tickets.list_tickets_for_customer(session.user_id).await
    }

    /// Every ticket in triage order. Staff only.
    pub async fn list_all(&self, session: &Session) -> Result<Vec<Ticket>> {
        if !session.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only agents and admins can list all tickets".to_string(),
            ));
        }

        let mut tickets = self.tickets.list_tickets().await?;
        sort_for_triage(&mut tickets);
        Ok(tickets)
    }

    /// Fetch one ticket the caller may see
    pub async fn get(&self, session: &Session, id: Uuid) -> Result<Ticket> {
        let ticket = self.find_visible(session, id).await?;
        Ok(ticket)
    }

    /// Overwrite a ticket's status.
    ///
    /// The role rule is checked before the lookup, so a forbidden status is
    /// reported even for an unknown ticket.
    pub async fn set_status(
        &self,
        session: &Session,
        id: Uuid,
        status: TicketStatus,
    ) -> Result<Ticket> {
        if !session.role.may_set_status(status) {
            tracing::warn!(
                ticket_id = %id,
                role = %session.role,
                status = %status,
                "Status change rejected"
            );
            return Err(AppError::ForbiddenTransition {
                role: session.role.to_string(),
                status: status.to_string(),
            });
        }

        let ticket = self
            .tickets
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

        tracing::info!(
            ticket_id = %ticket.id,
            status = %status,
            role = %session.role,
            user_id = %session.user_id,
            "Ticket status changed"
        );
        Ok(ticket)
    }

    /// Append a note authored by the caller
    pub async fn add_note(&self, session: &Session, id: Uuid, text: &str) -> Result<Note> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidNote);
        }

        self.find_visible(session, id).await?;

        let note = Note {
            text: text.to_string(),
            added_by: session.author(),
            note_type: session.role,
            added_at: Utc::now(),
        };

        // The ticket may have been deleted since the visibility check.
        if !self.tickets.append_note(id, &note).await? {
            return Err(AppError::NotFound("Ticket not found".to_string()));
        }

        tracing::info!(
            ticket_id = %id,
            note_type = %note.note_type,
            user_id = %session.user_id,
            "Note added"
        );
        Ok(note)
    }

    /// Delete a ticket. Only its owning customer may do this.
    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<()> {
        let ticket = self
            .tickets
            .find_ticket(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

        if !ticket.is_owned_by(session.user_id) {
            return Err(AppError::Forbidden(
                "Only the ticket owner can delete it".to_string(),
            ));
        }

        if !self.tickets.delete_ticket(id).await? {
            return Err(AppError::NotFound("Ticket not found".to_string()));
        }

        tracing::info!(ticket_id = %id, user_id = %session.user_id, "Ticket deleted");
        Ok(())
    }

    async fn find_visible(&self, session: &Session, id: Uuid) -> Result<Ticket> {
        let ticket = self
            .tickets
            .find_ticket(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

        if !session.can_view(&ticket) {
            return Err(AppError::Forbidden(
                "You do not have access to this ticket".to_string(),
            ));
        }
        Ok(ticket)
    }
}

/// Open tickets first by most recent update, then Review, then Closed.
pub fn sort_for_triage(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| {
        a.status
            .triage_rank()
            .cmp(&b.status.triage_rank())
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;
    use crate::models::user::NewUser;
    use crate::storage::{MemoryStore, UserStore};

    struct Fixture {
        service: TicketService,
        cara: Session,
        dan: Session,
        agent: Session,
        admin: Session,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let mut sessions = Vec::new();
        for (name, role) in [
            ("cara", Role::Customer),
            ("dan", Role::Customer),
            ("alex", Role::Agent),
            ("ada", Role::Admin),
        ] {
            let user = store
                .create_user(NewUser {
                    name: name.into(),
                    email: format!("{name}@example.com"),
                    password_hash: "hash".into(),
                    role: Role::Customer,
                })
                .await
                .unwrap();
            sessions.push(Session {
                user_id: user.id,
                name: user.name,
                email: user.email,
                role,
            });
        }
        let mut sessions = sessions.into_iter();
        Fixture {
            service: TicketService::new(store),
            cara: sessions.next().unwrap(),
            dan: sessions.next().unwrap(),
            agent: sessions.next().unwrap(),
            admin: sessions.next().unwrap(),
        }
    }

    fn request(title: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            title: title.into(),
            description: "It does not work".into(),
        }
    }

    #[tokio::test]
    async fn test_create_trims_and_starts_active() {
        let f = fixture().await;
        let ticket = f
            .service
            .create(&f.cara, request("  Printer broken  "))
            .await
            .unwrap();
        assert_eq!(ticket.title, "Printer broken");
        assert_eq!(ticket.status, TicketStatus::Active);
        assert!(ticket.notes.is_empty());
        assert_eq!(ticket.customer_id, f.cara.user_id);
        assert_eq!(ticket.customer_email, "cara@example.com");
    }

    #[tokio::test]
    async fn test_create_rejects_staff_and_blank_fields() {
        let f = fixture().await;
        for staff in [&f.agent, &f.admin] {
            let err = f.service.create(staff, request("x")).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }

        let err = f.service.create(&f.cara, request("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = f
            .service
            .create(
                &f.cara,
                CreateTicketRequest {
                    title: "Title".into(),
                    description: "\n\t".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_set_status_follows_role_table() {
        let f = fixture().await;
        let ticket = f.service.create(&f.cara, request("a")).await.unwrap();

        for session in [&f.cara, &f.agent, &f.admin] {
            for status in TicketStatus::ALL {
                let result = f.service.set_status(session, ticket.id, status).await;
                if session.role.may_set_status(status) {
                    assert_eq!(result.unwrap().status, status);
                } else {
                    assert!(matches!(
                        result,
                        Err(AppError::ForbiddenTransition { .. })
                    ));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_set_status_checks_rule_before_lookup() {
        let f = fixture().await;
        let missing = Uuid::new_v4();

        let err = f
            .service
            .set_status(&f.admin, missing, TicketStatus::Review)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ForbiddenTransition { .. }));

        let err = f
            .service
            .set_status(&f.admin, missing, TicketStatus::Closed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_set_status_refreshes_updated_at() {
        let f = fixture().await;
        let ticket = f.service.create(&f.cara, request("a")).await.unwrap();
        let updated = f
            .service
            .set_status(&f.agent, ticket.id, TicketStatus::Review)
            .await
            .unwrap();
        assert!(updated.updated_at >= ticket.updated_at);

        // Any current status may be overwritten.
        let reopened = f
            .service
            .set_status(&f.admin, ticket.id, TicketStatus::Active)
            .await
            .unwrap();
        assert_eq!(reopened.status, TicketStatus::Active);
    }

    #[tokio::test]
    async fn test_add_note_tags_effective_role() {
        let f = fixture().await;
        let ticket = f.service.create(&f.cara, request("a")).await.unwrap();

        for (session, expected) in [
            (&f.cara, Role::Customer),
            (&f.agent, Role::Agent),
            (&f.admin, Role::Admin),
        ] {
            let note = f
                .service
                .add_note(session, ticket.id, "  looking into it ")
                .await
                .unwrap();
            assert_eq!(note.note_type, expected);
            assert_eq!(note.text, "looking into it");
            assert_eq!(note.added_by.id, session.user_id);
            assert_eq!(note.added_by.email, session.email);
        }

        let stored = f.service.get(&f.admin, ticket.id).await.unwrap();
        let types: Vec<Role> = stored.notes.iter().map(|n| n.note_type).collect();
        assert_eq!(types, vec![Role::Customer, Role::Agent, Role::Admin]);
        assert!(stored.updated_at >= ticket.updated_at);
    }

    #[tokio::test]
    async fn test_add_note_error_order() {
        let f = fixture().await;
        let ticket = f.service.create(&f.cara, request("a")).await.unwrap();

        let err = f
            .service
            .add_note(&f.cara, Uuid::new_v4(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidNote));

        let err = f
            .service
            .add_note(&f.cara, Uuid::new_v4(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = f
            .service
            .add_note(&f.dan, ticket.id, "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let stored = f.service.get(&f.cara, ticket.id).await.unwrap();
        assert!(stored.notes.is_empty());
    }

    #[tokio::test]
    async fn test_visibility() {
        let f = fixture().await;
        let cara_ticket = f.service.create(&f.cara, request("cara")).await.unwrap();
        f.service.create(&f.dan, request("dan")).await.unwrap();

        let mine = f.service.list_my(&f.cara).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, cara_ticket.id);

        let err = f.service.list_all(&f.cara).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(f.service.list_all(&f.agent).await.unwrap().len(), 2);

        let err = f.service.get(&f.dan, cara_ticket.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(f.service.get(&f.agent, cara_ticket.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_owner_only() {
        let f = fixture().await;
        let ticket = f.service.create(&f.cara, request("a")).await.unwrap();

        for other in [&f.dan, &f.agent, &f.admin] {
            let err = f.service.delete(other, ticket.id).await.unwrap_err();
            assert!(matches!(err, AppError::Forbidden(_)));
        }

        f.service.delete(&f.cara, ticket.id).await.unwrap();
        let err = f.service.delete(&f.cara, ticket.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(f.service.list_my(&f.cara).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_triage_order() {
        let f = fixture().await;
        let closed = f.service.create(&f.cara, request("closed")).await.unwrap();
        let review = f.service.create(&f.cara, request("review")).await.unwrap();
        let older = f.service.create(&f.cara, request("older")).await.unwrap();
        let newer = f.service.create(&f.dan, request("newer")).await.unwrap();

        f.service
            .set_status(&f.admin, closed.id, TicketStatus::Closed)
            .await
            .unwrap();
        f.service
            .set_status(&f.agent, review.id, TicketStatus::Review)
            .await
            .unwrap();
        f.service
            .set_status(&f.agent, older.id, TicketStatus::Pending)
            .await
            .unwrap();
        f.service
            .add_note(&f.agent, newer.id, "on it")
            .await
            .unwrap();

        let all = f.service.list_all(&f.admin).await.unwrap();
        let order: Vec<Uuid> = all.iter().map(|t| t.id).collect();
        assert_eq!(order, vec![newer.id, older.id, review.id, closed.id]);
    }
}
