//! User Aggregate

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::domain::value_objects::Username;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self { Self::User => "user", Self::Admin => "admin" }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = UnknownRole;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s { "user" => Ok(Self::User), "admin" => Ok(Self::Admin), other => Err(UnknownRole(other.to_string())) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownRole(pub String);
impl std::error::Error for UnknownRole {}
impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown role {:?}", self.0) }
}

/// Registered account. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: Username,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

impl User {
    pub fn register(username: Username, password_hash: String, role: Role) -> Self {
        Self { id: Uuid::now_v7(), username, password_hash, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_role_round_trips_through_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default().as_str(), "user");
    }
    #[test]
    fn test_password_hash_is_not_serialized() {
        let u = User::register(Username::new("bob").unwrap(), "$argon2id$secret".into(), Role::User);
        let json = serde_json::to_value(&u).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
    }
}
