//! Database entities for credentials and issued sessions

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity for MongoDB
///
/// `password_hash` is the self-describing output of the password hasher,
/// salt included. It never holds the plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntity {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub colour: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub password_last_changed: Option<DateTime<Utc>>,
}

impl UserEntity {
    pub fn new(data: UserCreationData) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            first_name: data.first_name,
            last_name: data.last_name,
            email: data.email,
            phone_number: data.phone_number,
            password_hash: data.password_hash,
            colour: data.colour,
            created_at: now,
            updated_at: now,
            password_last_changed: Some(now),
        }
    }

    /// Hex form of the id, used as the subject of session tokens.
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

/// User creation data for repository
#[derive(Debug, Clone)]
pub struct UserCreationData {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub colour: String,
}

/// One issued access/refresh token pair.
///
/// Keyed by the access token id so logout and validation never have to
/// parse the token itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTokenEntity {
    #[serde(rename = "_id")]
    pub access_token_id: String,
    pub refresh_token_id: String,
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
}

impl IssuedTokenEntity {
    pub fn new(
        user_id: String,
        access_token: String,
        refresh_token: String,
        access_token_id: String,
        refresh_token_id: String,
    ) -> Self {
        Self {
            access_token_id,
            refresh_token_id,
            user_id,
            access_token,
            refresh_token,
            created_at: Utc::now(),
        }
    }
}
