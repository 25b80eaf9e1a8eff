//! Helpdesk - Backend Library
//!
//! Multi-role support ticketing API: customers submit tickets, agents and
//! admins triage and annotate them, and every role gets a dashboard.

#[macro_use]
mod macros;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
