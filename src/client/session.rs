//! Client-held login session with explicit persistence.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::Claims;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("session encoding: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("token could not be decoded")]
    InvalidToken,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Stored {
    token: Option<String>,
}

#[derive(Debug, Default)]
pub struct Session {
    token: Option<String>,
    claims: Option<Claims>,
}

/// Reads claims without checking the signature; only the server can do that.
fn decode_claims(token: &str) -> Result<Claims, SessionError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| SessionError::InvalidToken)
}

impl Session {
    /// Missing file means a fresh, logged-out session. Expired or
    /// undecodable stored tokens are dropped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let stored: Stored = match fs::read(path.as_ref()) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Stored::default(),
            Err(e) => return Err(e.into()),
        };
        let mut session = Self::default();
        if let Some(token) = stored.token {
            if session.login(token).is_ok() {
                session.restore(Utc::now().timestamp());
            }
        }
        Ok(session)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let stored = Stored { token: self.token.clone() };
        fs::write(path, serde_json::to_vec_pretty(&stored)?)?;
        Ok(())
    }

    pub fn login(&mut self, token: impl Into<String>) -> Result<&Claims, SessionError> {
        let token = token.into();
        let claims = decode_claims(&token)?;
        self.token = Some(token);
        Ok(self.claims.insert(claims))
    }

    /// Drops the token when it expired before `now` (unix seconds).
    pub fn restore(&mut self, now: i64) {
        if self.claims.as_ref().is_some_and(|c| c.exp < now) {
            self.logout();
        }
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.claims = None;
    }

    pub fn token(&self) -> Option<&str> { self.token.as_deref() }
    pub fn user(&self) -> Option<&Claims> { self.claims.as_ref() }
    pub fn is_authenticated(&self) -> bool { self.claims.is_some() }
    pub fn is_admin(&self) -> bool { self.claims.as_ref().is_some_and(Claims::is_admin) }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Role;
    use crate::services::TokenKeys;
    use std::time::Duration;
    use uuid::Uuid;

    fn token(role: Role, exp_offset: i64) -> String {
        let now = Utc::now().timestamp();
        TokenKeys::new("k", Duration::from_secs(60))
            .sign(&Claims { id: Uuid::new_v4(), role, iat: now, exp: now + exp_offset })
            .unwrap()
    }

    #[test]
    fn login_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = Session::default();
        session.login(token(Role::Admin, 3600)).unwrap();
        assert!(session.is_admin());
        session.save(&path).unwrap();

        let restored = Session::load(&path).unwrap();
        assert!(restored.is_authenticated());
        assert_eq!(restored.token(), session.token());
        assert!(restored.authorization().unwrap().starts_with("Bearer "));
    }

    #[test]
    fn expired_token_is_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut session = Session::default();
        session.login(token(Role::User, -10)).unwrap();
        session.save(&path).unwrap();

        assert!(!Session::load(&path).unwrap().is_authenticated());
    }

    #[test]
    fn missing_file_and_garbage_tokens() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!Session::load(dir.path().join("absent.json")).unwrap().is_authenticated());

        let mut session = Session::default();
        assert!(matches!(session.login("not-a-jwt"), Err(SessionError::InvalidToken)));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn logout_clears_everything() {
        let mut session = Session::default();
        session.login(token(Role::User, 3600)).unwrap();
        session.logout();
        assert!(session.token().is_none());
        assert!(session.user().is_none());
    }
}
