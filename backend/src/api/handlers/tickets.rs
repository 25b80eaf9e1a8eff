//! Ticket handlers.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::openapi::ErrorResponse;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::role::Role;
use crate::models::session::Session;
use crate::models::ticket::{Note, NoteAuthor, Ticket, TicketStatus};
use crate::services::ticket_service::CreateTicketRequest;

/// Ticket routes (token required)
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_ticket))
        .route("/my", get(list_my_tickets))
        .route("/all", get(list_all_tickets))
        .route("/:id", get(get_ticket).delete(delete_ticket))
        .route("/:id/status", patch(update_status))
        .route("/:id/notes", post(add_note))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketBody {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusBody {
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddNoteBody {
    /// Missing text is treated like blank text
    #[serde(default)]
    pub text: String,
}

/// Submit a new ticket (customers only)
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/tickets",
    tag = "tickets",
    request_body = CreateTicketBody,
    responses(
        (status = 201, description = "Ticket created", body = Ticket),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Caller is not a customer", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_ticket(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    ApiJson(body): ApiJson<CreateTicketBody>,
) -> Result<(StatusCode, Json<Ticket>)> {
    let ticket = state
        .tickets
        .create(
            &session,
            CreateTicketRequest {
                title: body.title,
                description: body.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Tickets owned by the caller, newest first
#[utoipa::path(
    get,
    path = "/my",
    context_path = "/api/tickets",
    tag = "tickets",
    responses(
        (status = 200, description = "Caller's tickets", body = Vec<Ticket>),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_tickets(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.list_my(&session).await?))
}

/// Every ticket in triage order (agents and admins)
#[utoipa::path(
    get,
    path = "/all",
    context_path = "/api/tickets",
    tag = "tickets",
    responses(
        (status = 200, description = "All tickets", body = Vec<Ticket>),
        (status = 403, description = "Caller is a customer", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_all_tickets(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.list_all(&session).await?))
}

/// Fetch one ticket
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/tickets",
    tag = "tickets",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket", body = Ticket),
        (status = 403, description = "Not visible to caller", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_ticket(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Ticket>> {
    Ok(Json(state.tickets.get(&session, id).await?))
}

/// Set a ticket's status within the caller's role allow-list
#[utoipa::path(
    patch,
    path = "/{id}/status",
    context_path = "/api/tickets",
    tag = "tickets",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = UpdateStatusBody,
    responses(
        (status = 200, description = "Updated ticket", body = Ticket),
        (status = 403, description = "Status not allowed for role", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_status(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateStatusBody>,
) -> Result<Json<Ticket>> {
    Ok(Json(
        state.tickets.set_status(&session, id, body.status).await?,
    ))
}

/// Append a note tagged with the caller's role
#[utoipa::path(
    post,
    path = "/{id}/notes",
    context_path = "/api/tickets",
    tag = "tickets",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    request_body = AddNoteBody,
    responses(
        (status = 201, description = "Note added", body = Note),
        (status = 400, description = "Empty note", body = ErrorResponse),
        (status = 403, description = "Not visible to caller", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_note(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<AddNoteBody>,
) -> Result<(StatusCode, Json<Note>)> {
    let note = state.tickets.add_note(&session, id, &body.text).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Delete a ticket (owning customer only)
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/tickets",
    tag = "tickets",
    params(("id" = Uuid, Path, description = "Ticket ID")),
    responses(
        (status = 204, description = "Ticket deleted"),
        (status = 403, description = "Caller does not own the ticket", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_ticket(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode> {
    state.tickets.delete(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_ticket,
        list_my_tickets,
        list_all_tickets,
        get_ticket,
        update_status,
        add_note,
        delete_ticket,
    ),
    components(schemas(
        CreateTicketBody,
        UpdateStatusBody,
        AddNoteBody,
        Ticket,
        TicketStatus,
        Note,
        NoteAuthor,
        Role,
    ))
)]
pub struct TicketsApiDoc;
