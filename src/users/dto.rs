use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::users::repo_types::User;

/// A text field as sent by the client. Any JSON value is accepted so that a
/// wrong type becomes a per-field validation message instead of a parse
/// failure of the whole body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TextField {
    /// Missing or `null`.
    #[default]
    Absent,
    Text(String),
    /// Number, bool, array or object.
    WrongType,
}

impl TextField {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for TextField {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl<'de> Deserialize<'de> for TextField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Self::Absent,
            Value::String(s) => Self::Text(s),
            _ => Self::WrongType,
        })
    }
}

/// Request body for `POST /api/users`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: TextField,
    #[serde(default)]
    pub email: TextField,
    #[serde(default)]
    pub password: TextField,
}

/// Request body for `PUT`/`PATCH /api/users/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: TextField,
    #[serde(default)]
    pub email: TextField,
    #[serde(default)]
    pub password: TextField, // absent, null or "" keeps the current password
}

/// User as returned to clients. Carries no credential material.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
