// src/auth.rs
use crate::fixtures::{ADMIN_EMAIL, ADMIN_PASSWORD, DEMO_EMAIL, DEMO_PASSWORD};
use crate::models::Role;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

// Tests hash with the cheapest cost bcrypt accepts.
const HASH_COST: u32 = if cfg!(test) { 4 } else { bcrypt::DEFAULT_COST };

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session lifetime of {0:?} overflows the token expiry")]
    ExpiryOverflow(Duration),

    #[error("failed to sign session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    name: String,
    role: Role,
    exp: usize,
}

/// The user attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Stable id for an account, derived from its lowercased email so that the
/// same account keeps its portfolio rows and tokens across restarts.
pub fn user_id_for(email: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, email.trim().to_lowercase().as_bytes()).to_string()
}

struct Account {
    user: SessionUser,
    password_hash: String,
}

/// Accounts allowed to sign in with a password.
pub struct UserDirectory {
    accounts: Vec<Account>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self {
            accounts: Vec::new(),
        }
    }

    pub fn with_demo_accounts() -> Result<Self, bcrypt::BcryptError> {
        let mut directory = Self::new();
        directory.add(DEMO_EMAIL, "Demo User", Role::User, DEMO_PASSWORD)?;
        directory.add(ADMIN_EMAIL, "M4Capital Admin", Role::Admin, ADMIN_PASSWORD)?;
        Ok(directory)
    }

    pub fn add(
        &mut self,
        email: &str,
        name: &str,
        role: Role,
        password: &str,
    ) -> Result<SessionUser, bcrypt::BcryptError> {
        let user = SessionUser {
            id: user_id_for(email),
            email: email.trim().to_lowercase(),
            name: name.to_string(),
            role,
        };
        self.accounts.push(Account {
            user: user.clone(),
            password_hash: bcrypt::hash(password, HASH_COST)?,
        });
        Ok(user)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&SessionUser> {
        let email = email.trim().to_lowercase();
        self.accounts
            .iter()
            .find(|a| a.user.email == email)
            .map(|a| &a.user)
    }

    /// Checks an email/password pair. Blank input never matches.
    pub fn authorize(&self, email: &str, password: &str) -> Option<SessionUser> {
        if email.trim().is_empty() || password.is_empty() {
            return None;
        }
        let email = email.trim().to_lowercase();
        let account = self.accounts.iter().find(|a| a.user.email == email)?;
        match bcrypt::verify(password, &account.password_hash) {
            Ok(true) => Some(account.user.clone()),
            Ok(false) => {
                debug!("Password mismatch for {}", email);
                None
            }
            Err(e) => {
                error!("Stored password hash for {} is unreadable: {}", email, e);
                None
            }
        }
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// Issues and checks signed session tokens.
#[derive(Clone)]
pub struct Sessions {
    secret: String,
    ttl: Duration,
}

impl Sessions {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            secret: secret.to_string(),
            ttl,
        }
    }

    pub fn issue(&self, user: &SessionUser) -> Result<String, SessionError> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| Utc::now().timestamp().checked_add(ttl))
            .and_then(|exp| usize::try_from(exp).ok())
            .ok_or(SessionError::ExpiryOverflow(self.ttl))?;
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Returns the session carried by `token`, or `None` if it is malformed,
    /// expired or signed with another key.
    pub fn verify(&self, token: &str) -> Option<SessionUser> {
        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(data) => Some(SessionUser {
                id: data.claims.sub,
                email: data.claims.email,
                name: data.claims.name,
                role: data.claims.role,
            }),
            Err(e) => {
                warn!("Rejected session token: {}", e);
                None
            }
        }
    }
}
