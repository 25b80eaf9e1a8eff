//! Test fixtures and data factories for API tests
//!
//! Provides reusable test data for:
//! - Accounts and the access codes used to log in as staff
//! - Ticket payloads

#![allow(dead_code)]

use serde_json::{json, Value};

pub const AGENT_CODE: &str = "agent-secret";
pub const ADMIN_CODE: &str = "admin-secret";

/// Test account credentials
pub struct TestUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl TestUser {
    pub fn customer() -> Self {
        Self::with_name("cara")
    }

    pub fn other_customer() -> Self {
        Self::with_name("dan")
    }

    pub fn staff() -> Self {
        Self::with_name("sam")
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            email: format!("{}@test.local", name),
            password: "password123".to_string(),
        }
    }

    pub fn register_body(&self) -> Value {
        json!({
            "name": self.name,
            "email": self.email,
            "password": self.password,
        })
    }

    pub fn login_body(&self, role: &str, access_code: Option<&str>) -> Value {
        json!({
            "email": self.email,
            "password": self.password,
            "selectedRole": role,
            "accessCode": access_code,
        })
    }
}

/// Ticket submission body
pub fn ticket_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{} since this morning", title),
    })
}
