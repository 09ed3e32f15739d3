//! In-memory repositories used as test doubles for the MongoDB ones.

use crate::entities::{IssuedTokenEntity, UserCreationData, UserEntity};
use crate::error::AuthDataError;
use crate::repositories::{TokenRepository, UserRepository};
use async_trait::async_trait;
use bson::oid::ObjectId;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<ObjectId, UserEntity>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserEntity>, AuthDataError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, AuthDataError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthDataError> {
        let users = self.users.read().await;
        Ok(users.values().any(|user| user.email == email))
    }

    async fn create_user(&self, data: UserCreationData) -> Result<UserEntity, AuthDataError> {
        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == data.email) {
            return Err(AuthDataError::EmailTaken);
        }

        let id = ObjectId::new();
        let mut user = UserEntity::new(data);
        user.id = Some(id);
        users.insert(id, user.clone());

        Ok(user)
    }

    async fn save(&self, user: &UserEntity) -> Result<(), AuthDataError> {
        let id = user.id.ok_or(AuthDataError::UserNotFound)?;
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(stored) => {
                *stored = user.clone();
                stored.updated_at = chrono::Utc::now();
                Ok(())
            }
            None => Err(AuthDataError::UserNotFound),
        }
    }
}

#[derive(Default)]
pub struct InMemoryTokenRepository {
    records: RwLock<HashMap<String, IssuedTokenEntity>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn records_for_user(&self, user_id: &str) -> Vec<IssuedTokenEntity> {
        let records = self.records.read().await;
        records
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn create(&self, record: IssuedTokenEntity) -> Result<(), AuthDataError> {
        let mut records = self.records.write().await;
        records.insert(record.access_token_id.clone(), record);
        Ok(())
    }

    async fn find_by_access_token_id(
        &self,
        access_token_id: &str,
    ) -> Result<Option<IssuedTokenEntity>, AuthDataError> {
        Ok(self.records.read().await.get(access_token_id).cloned())
    }

    async fn find_by_refresh_token_id(
        &self,
        refresh_token_id: &str,
    ) -> Result<Option<IssuedTokenEntity>, AuthDataError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|record| record.refresh_token_id == refresh_token_id)
            .cloned())
    }

    async fn revoke(&self, access_token_id: &str) -> Result<bool, AuthDataError> {
        Ok(self.records.write().await.remove(access_token_id).is_some())
    }

    async fn revoke_all_for_user(&self, user_id: &str) -> Result<u64, AuthDataError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.user_id != user_id);
        Ok((before - records.len()) as u64)
    }
}
