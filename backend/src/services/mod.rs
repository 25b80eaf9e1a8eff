//! Business logic services.

pub mod auth_service;
pub mod dashboard_service;
pub mod ticket_service;
