//! Authentication service.
//!
//! Registers accounts, checks credentials and the elevated-role access codes,
//! and issues and validates the stateless JWT that carries the session role.

use std::sync::{Arc, OnceLock};

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::role::Role;
use crate::models::session::Session;
use crate::models::user::{normalize_email, NewUser, User};
use crate::storage::UserStore;

const MIN_PASSWORD_LEN: usize = 6;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    pub name: String,
    pub email: String,
    /// Effective role for this session
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Signed token handed to the client
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Login input
#[derive(Debug)]
pub struct LoginCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub selected_role: Role,
    pub access_code: Option<&'a str>,
}

/// Successful login
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub role: Role,
    pub token: IssuedToken,
}

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserStore>,
    config: Arc<Config>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Verified against on unknown emails so both paths pay for bcrypt
    dummy_hash: OnceLock<String>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(users: Arc<dyn UserStore>, config: Arc<Config>) -> Self {
        let secret = config.jwt_secret.clone();
        Self {
            users,
            config,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            dummy_hash: OnceLock::new(),
        }
    }

    /// Create a customer account
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let name = name.trim();
        let email = normalize_email(email);

        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        if !is_plausible_email(&email) {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let password_hash = self.hash_password(password)?;
        let user = self
            .users
            .create_user(NewUser {
                name: name.to_string(),
                email,
                password_hash,
                role: Role::Customer,
            })
            .await?;

        tracing::info!(user_id = %user.id, "Account registered");
        Ok(user)
    }

    /// Authenticate and issue a token for the selected role.
    ///
    /// The access code for an elevated role is checked before the password so
    /// a wrong code is always reported as such.
    pub async fn login(&self, credentials: LoginCredentials<'_>) -> Result<LoginOutcome> {
        let role = credentials.selected_role;
        if let Err(e) = self.verify_access_code(role, credentials.access_code) {
            tracing::warn!(role = %role, "Login rejected: bad access code");
            return Err(e);
        }

        let email = normalize_email(credentials.email);
        let user = match self.users.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                let _ = Self::verify_password(credentials.password, self.dummy_hash()?);
                tracing::warn!(role = %role, "Login rejected: unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !Self::verify_password(credentials.password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, role = %role, "Login rejected: bad password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issue_token(&user, role)?;
        tracing::info!(user_id = %user.id, role = %role, "Login succeeded");

        Ok(LoginOutcome { user, role, token })
    }

    /// Check the shared secret gating an elevated role.
    ///
    /// Customers need no code. An elevated role with no configured code
    /// cannot be selected at all.
    pub fn verify_access_code(&self, role: Role, supplied: Option<&str>) -> Result<()> {
        let expected = match role {
            Role::Customer => return Ok(()),
            Role::Agent => self.config.agent_access_code.as_deref(),
            Role::Admin => self.config.admin_access_code.as_deref(),
        };

        match (expected, supplied) {
            (Some(expected), Some(supplied)) if constant_time_eq(expected, supplied) => Ok(()),
            _ => Err(AppError::InvalidAccessCode),
        }
    }

    /// Sign a token embedding the user and the session's effective role
    pub fn issue_token(&self, user: &User, role: Role) -> Result<IssuedToken> {
        let hours = self.config.jwt_expiration_hours;
        let lifetime = Duration::try_hours(hours)
            .filter(|d| *d > Duration::zero())
            .ok_or_else(|| AppError::Internal(format!("Bad token lifetime: {} hours", hours)))?;
        let expires_in = u64::try_from(lifetime.num_seconds())
            .map_err(|_| AppError::Internal(format!("Bad token lifetime: {} hours", hours)))?;

        let now = Utc::now();
        let exp = now
            .checked_add_signed(lifetime)
            .ok_or_else(|| AppError::Internal(format!("Bad token lifetime: {} hours", hours)))?;

        let claims = Claims {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_in,
        })
    }

    /// Validate a bearer token and return the session it describes
    pub fn validate_token(&self, token: &str) -> Result<Session> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;
        Ok(data.claims.into())
    }

    /// Load the account behind a session
    pub async fn current_user(&self, session: &Session) -> Result<User> {
        self.users
            .find_user(session.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))
    }

    /// Hash a password with the configured cost
    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, self.config.bcrypt_cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    fn dummy_hash(&self) -> Result<&str> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash.as_str());
        }
        let hashed = self.hash_password("helpdesk-unknown-account")?;
        Ok(self.dummy_hash.get_or_init(|| hashed).as_str())
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}
