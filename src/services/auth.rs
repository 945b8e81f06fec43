//! Registration, login and bearer tokens.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::aggregates::{Role, User};
use crate::domain::events::UserEvent;
use crate::domain::value_objects::Username;
use crate::error::{ApiError, Result, StoreError};
use crate::services::EventBus;
use crate::store::UserStore;

/// Token payload: who the caller is and what they may do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims { id: user.id, role: user.role, iat: now, exp: now.saturating_add(ttl) };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String> {
        jsonwebtoken::encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| ApiError::Server(format!("token signing failed: {e}")))
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::InvalidToken)
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Server(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenKeys>,
    events: EventBus,
}

impl Accounts {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenKeys>, events: EventBus) -> Self {
        Self { users, tokens, events }
    }

    pub async fn register(&self, username: Username, password: &str) -> Result<User> {
        self.create(username, password, Role::User).await
    }

    async fn create(&self, username: Username, password: &str, role: Role) -> Result<User> {
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ApiError::Server(format!("hashing task failed: {e}")))??;

        let user = User::register(username, password_hash, role);
        match self.users.insert(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                warn!(username = %user.username, "username already registered");
                return Err(ApiError::UsernameTaken);
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, username = %user.username, role = %user.role, "user registered");
        self.events.publish(UserEvent::Registered { user_id: user.id }).await;
        Ok(user)
    }

    /// Returns a signed token on success.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let Some(user) = self.users.find_by_username(username).await? else {
            warn!(username, "login for unknown user");
            return Err(ApiError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ApiError::Server(format!("verification task failed: {e}")))?;
        if !matches {
            warn!(username, "login with wrong password");
            return Err(ApiError::InvalidCredentials);
        }

        self.tokens.issue(&user)
    }

    /// Creates the admin account unless the username already exists.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<()> {
        let username = Username::new(username).map_err(|e| ApiError::Validation(e.to_string()))?;
        if self.users.find_by_username(username.as_str()).await?.is_some() {
            return Ok(());
        }
        match self.create(username, password, Role::Admin).await {
            Ok(_) | Err(ApiError::UsernameTaken) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn accounts() -> (Accounts, Arc<TokenKeys>) {
        let tokens = Arc::new(TokenKeys::new("test-secret", Duration::from_secs(3600)));
        (Accounts::new(Arc::new(MemoryStore::default()), tokens.clone(), EventBus::disabled()), tokens)
    }

    #[test]
    fn password_hash_is_salted() {
        let a = hash_password("pw12345").unwrap();
        let b = hash_password("pw12345").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
        assert!(verify_password("pw12345", &a));
        assert!(!verify_password("nope", &a));
        assert!(!verify_password("pw12345", "not-a-hash"));
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let keys = TokenKeys::new("test-secret", Duration::from_secs(3600));
        let now = Utc::now().timestamp();
        let stale = keys.sign(&Claims { id: Uuid::new_v4(), role: Role::User, iat: now - 7200, exp: now - 3600 }).unwrap();
        assert!(matches!(keys.verify(&stale), Err(ApiError::InvalidToken)));

        let other = TokenKeys::new("other-secret", Duration::from_secs(3600));
        let foreign = other.sign(&Claims { id: Uuid::new_v4(), role: Role::Admin, iat: now, exp: now + 60 }).unwrap();
        assert!(matches!(keys.verify(&foreign), Err(ApiError::InvalidToken)));
        assert!(matches!(keys.verify("garbage"), Err(ApiError::InvalidToken)));
    }

    #[tokio::test]
    async fn register_then_login_issues_verifiable_token() {
        let (accounts, tokens) = accounts();
        let user = accounts.register(Username::new("loginuser").unwrap(), "pw12345").await.unwrap();

        let token = accounts.login("loginuser", "pw12345").await.unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let (accounts, _) = accounts();
        accounts.register(Username::new("loginuser").unwrap(), "pw12345").await.unwrap();
        assert!(matches!(accounts.login("loginuser", "wrongpassword").await, Err(ApiError::InvalidCredentials)));
        assert!(matches!(accounts.login("nouser", "pw12345").await, Err(ApiError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let (accounts, _) = accounts();
        accounts.register(Username::new("duplicateuser").unwrap(), "pw").await.unwrap();
        let again = accounts.register(Username::new("duplicateuser").unwrap(), "pw").await;
        assert!(matches!(again, Err(ApiError::UsernameTaken)));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let (accounts, tokens) = accounts();
        accounts.ensure_admin("boss", "pw").await.unwrap();
        accounts.ensure_admin("boss", "other").await.unwrap();
        let token = accounts.login("boss", "pw").await.unwrap();
        assert!(tokens.verify(&token).unwrap().is_admin());
    }
}
