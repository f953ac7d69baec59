use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::errors::CustomError;

#[derive(Deserialize, Serialize, sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: u32,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub display_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// What other users get to see of a user
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: u32,
    pub name: String,
    pub display_name: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            display_name: user.display_name,
            email: user.email,
        }
    }
}

// The struct used for receiving user data for signing up as json
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SignUp {
    pub name: String,
    pub password: String,
    pub display_name: String,
    pub email: String,
}

impl SignUp {
    pub fn validate(&self) -> Result<(), CustomError> {
        let required = [&self.name, &self.password, &self.display_name, &self.email];
        if required.iter().any(|field| field.trim().is_empty()) || !self.email.contains('@') {
            return Err(CustomError::MissingUserFields);
        }
        Ok(())
    }
}

// The struct used to respond with an official json for the bearer token
#[derive(Deserialize, Serialize, Debug)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameStats {
    pub games_hosted: u32,
    pub games_joined: u32,
}
