//! API module - HTTP handlers and middleware.

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::services::auth_service::AuthService;
use crate::services::dashboard_service::DashboardService;
use crate::services::ticket_service::TicketService;
use crate::storage::Stores;

/// Application state shared across handlers
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub auth: Arc<AuthService>,
    pub tickets: TicketService,
    pub dashboard: DashboardService,
}

impl AppState {
    /// Wire services over the given stores.
    pub fn new(config: Config, stores: Stores) -> Self {
        let config = Arc::new(config);
        Self {
            auth: Arc::new(AuthService::new(stores.users.clone(), config.clone())),
            tickets: TicketService::new(stores.tickets.clone()),
            dashboard: DashboardService::new(stores.users.clone(), stores.tickets.clone()),
            config,
            stores,
        }
    }
}

pub type SharedState = Arc<AppState>;
