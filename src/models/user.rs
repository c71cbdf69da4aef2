use chrono::{DateTime, Utc};
use rocket::serde::Serialize;
use schemars::JsonSchema;

#[derive(Serialize, Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Identity as reported by the OAuth provider at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}
