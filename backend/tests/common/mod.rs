//! Common test utilities for API integration tests
//!
//! This module provides shared infrastructure for testing:
//! - Test application over the in-memory store
//! - Request helpers driving the router with `oneshot`
//! - Authentication helpers for each role

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use helpdesk_backend::api::{routes::create_router, AppState};
use helpdesk_backend::config::Config;
use helpdesk_backend::storage::Stores;

use fixtures::{TestUser, ADMIN_CODE, AGENT_CODE};

/// Response captured from the router
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// Router plus helpers, backed by a fresh in-memory store
pub struct TestApp {
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_overrides(&[])
    }

    /// Build an app with extra config values layered over the test defaults.
    pub fn with_overrides(overrides: &[(&str, &str)]) -> Self {
        let config = Config::from_lookup(|key| {
            if let Some((_, value)) = overrides.iter().find(|(k, _)| *k == key) {
                return Some(value.to_string());
            }
            match key {
                "STORE_BACKEND" => Some("memory".into()),
                "JWT_SECRET" => Some("integration-test-secret".into()),
                "AGENT_ACCESS_CODE" => Some(AGENT_CODE.into()),
                "ADMIN_ACCESS_CODE" => Some(ADMIN_CODE.into()),
                "BCRYPT_COST" => Some("4".into()),
                "LOGIN_RATE_LIMIT" => Some("1000".into()),
                _ => None,
            }
        })
        .expect("test config");

        let state = Arc::new(AppState::new(config, Stores::in_memory()));
        Self {
            router: create_router(state),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// POST an arbitrary JSON-typed body, which need not be valid JSON.
    pub async fn post_raw(&self, uri: &str, token: Option<&str>, body: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Register `user`, asserting success.
    pub async fn register(&self, user: &TestUser) -> Value {
        let response = self
            .post("/api/auth/register", None, user.register_body())
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }

    /// Log in with the given role, asserting success, and return the token.
    pub async fn login(&self, user: &TestUser, role: &str) -> String {
        let code = match role {
            "agent" => Some(AGENT_CODE),
            "admin" => Some(ADMIN_CODE),
            _ => None,
        };
        let response = self
            .post("/api/auth/login", None, user.login_body(role, code))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    /// Register and log in with the given role.
    pub async fn session(&self, user: &TestUser, role: &str) -> String {
        self.register(user).await;
        self.login(user, role).await
    }

    /// Submit a ticket as `token`, asserting success.
    pub async fn create_ticket(&self, token: &str, title: &str) -> Value {
        let response = self
            .post("/api/tickets", Some(token), fixtures::ticket_body(title))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }
}
