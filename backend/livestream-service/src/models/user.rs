use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `users` table, which is also what the user cache holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Already-hashed password; hashing happens outside this service.
    #[serde(skip_serializing)]
    pub password: String,
    pub icon_hash: String,
    pub dark_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub hashed_password: String,
    pub dark_mode: bool,
}

impl NewUser {
    /// Combine the request with the id the store assigned.
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            password: self.hashed_password,
            icon_hash: String::new(),
            dark_mode: self.dark_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: i64,
    pub dark_mode: bool,
}

/// Public projection of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub theme: Theme,
    pub icon_hash: String,
}

impl User {
    pub fn to_profile(&self, fallback_icon_hash: &str) -> UserProfile {
        let icon_hash = if self.icon_hash.is_empty() {
            fallback_icon_hash.to_string()
        } else {
            self.icon_hash.clone()
        };

        UserProfile {
            id: self.id,
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            theme: Theme {
                id: self.id,
                dark_mode: self.dark_mode,
            },
            icon_hash,
        }
    }
}
