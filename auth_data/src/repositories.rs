//! Repository implementations for credential and session data access

use crate::entities::{IssuedTokenEntity, UserCreationData, UserEntity};
use crate::error::AuthDataError;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use chrono::Utc;
use mongodb::options::{IndexOptions, ReplaceOptions};
use mongodb::{Collection, Database, IndexModel};
use std::sync::Arc;
use tokio::sync::RwLock;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserEntity>, AuthDataError>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, AuthDataError>;

    /// Check if email exists
    async fn email_exists(&self, email: &str) -> Result<bool, AuthDataError>;

    /// Create a new user, failing with `EmailTaken` on a duplicate email
    async fn create_user(&self, data: UserCreationData) -> Result<UserEntity, AuthDataError>;

    /// Save an existing user
    async fn save(&self, user: &UserEntity) -> Result<(), AuthDataError>;
}

/// Durable record of issued token pairs
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a record. Writing the same access token id twice keeps one record.
    async fn create(&self, record: IssuedTokenEntity) -> Result<(), AuthDataError>;

    async fn find_by_access_token_id(
        &self,
        access_token_id: &str,
    ) -> Result<Option<IssuedTokenEntity>, AuthDataError>;

    async fn find_by_refresh_token_id(
        &self,
        refresh_token_id: &str,
    ) -> Result<Option<IssuedTokenEntity>, AuthDataError>;

    /// Delete one record; returns whether anything was deleted
    async fn revoke(&self, access_token_id: &str) -> Result<bool, AuthDataError>;

    /// Delete every record of a user; returns the number deleted
    async fn revoke_all_for_user(&self, user_id: &str) -> Result<u64, AuthDataError>;
}

/// MongoDB implementation of UserRepository
pub struct MongoUserRepository {
    db: Arc<RwLock<Database>>,
    collection_name: String,
}

impl MongoUserRepository {
    /// Create a new MongoDB user repository
    pub fn new(db: Arc<RwLock<Database>>, collection_name: String) -> Self {
        Self {
            db,
            collection_name,
        }
    }

    /// Get the users collection
    async fn collection(&self) -> Collection<UserEntity> {
        self.db.read().await.collection(&self.collection_name)
    }

    /// Create the unique email index so concurrent registrations cannot
    /// produce two credentials for one address.
    pub async fn ensure_indexes(&self) -> Result<(), AuthDataError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection().await.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserEntity>, AuthDataError> {
        let filter = doc! { "_id": id };
        let coll = self.collection().await;
        let result = coll.find_one(filter).await?;
        Ok(result)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, AuthDataError> {
        let filter = doc! { "email": email };
        let coll = self.collection().await;
        let result = coll.find_one(filter).await?;
        Ok(result)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthDataError> {
        let filter = doc! { "email": email };
        let coll = self.collection().await;
        let count = coll.count_documents(filter).await?;
        Ok(count > 0)
    }

    async fn create_user(&self, data: UserCreationData) -> Result<UserEntity, AuthDataError> {
        let mut user = UserEntity::new(data);
        user.id = Some(ObjectId::new());

        let collection = self.collection().await;
        collection
            .insert_one(&user)
            .await
            .map_err(|e| AuthDataError::from_write(e, AuthDataError::EmailTaken))?;

        Ok(user)
    }

    async fn save(&self, user: &UserEntity) -> Result<(), AuthDataError> {
        let id = user.id.ok_or(AuthDataError::UserNotFound)?;
        let mut user = user.clone();
        user.updated_at = Utc::now();

        let collection = self.collection().await;
        let result = collection.replace_one(doc! { "_id": id }, &user).await?;

        if result.matched_count == 0 {
            return Err(AuthDataError::UserNotFound);
        }

        Ok(())
    }
}

/// MongoDB implementation of TokenRepository
pub struct MongoTokenRepository {
    db: Arc<RwLock<Database>>,
    collection_name: String,
}

impl MongoTokenRepository {
    pub fn new(db: Arc<RwLock<Database>>, collection_name: String) -> Self {
        Self {
            db,
            collection_name,
        }
    }

    async fn collection(&self) -> Collection<IssuedTokenEntity> {
        self.db.read().await.collection(&self.collection_name)
    }

    /// Index the secondary lookups used by refresh and bulk revocation.
    pub async fn ensure_indexes(&self) -> Result<(), AuthDataError> {
        let collection = self.collection().await;
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "refresh_token_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder().keys(doc! { "user_id": 1 }).build(),
        ];
        collection.create_indexes(indexes).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenRepository for MongoTokenRepository {
    async fn create(&self, record: IssuedTokenEntity) -> Result<(), AuthDataError> {
        let collection = self.collection().await;
        let filter = doc! { "_id": &record.access_token_id };
        let options = ReplaceOptions::builder().upsert(true).build();

        collection
            .replace_one(filter, &record)
            .with_options(options)
            .await?;

        tracing::debug!(user_id = %record.user_id, "issued token record stored");
        Ok(())
    }

    async fn find_by_access_token_id(
        &self,
        access_token_id: &str,
    ) -> Result<Option<IssuedTokenEntity>, AuthDataError> {
        let collection = self.collection().await;
        let result = collection.find_one(doc! { "_id": access_token_id }).await?;
        Ok(result)
    }

    async fn find_by_refresh_token_id(
        &self,
        refresh_token_id: &str,
    ) -> Result<Option<IssuedTokenEntity>, AuthDataError> {
        let collection = self.collection().await;
        let result = collection
            .find_one(doc! { "refresh_token_id": refresh_token_id })
            .await?;
        Ok(result)
    }

    async fn revoke(&self, access_token_id: &str) -> Result<bool, AuthDataError> {
        let collection = self.collection().await;
        let result = collection.delete_one(doc! { "_id": access_token_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn revoke_all_for_user(&self, user_id: &str) -> Result<u64, AuthDataError> {
        let collection = self.collection().await;
        let result = collection.delete_many(doc! { "user_id": user_id }).await?;

        tracing::info!(user_id, revoked = result.deleted_count, "revoked user sessions");

        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Document;
    use mongodb::Client;

    async fn setup_test_db() -> Arc<RwLock<Database>> {
        let mongo_uri = std::env::var("MONGO_DB_URI").expect("MONGO_DB_URI must be set");
        let client = Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let db = client.database("test_auth_db");

        // Clean up test data
        db.collection::<Document>("test_users")
            .delete_many(doc! {})
            .await
            .expect("Failed to clean users");
        db.collection::<Document>("test_tokens")
            .delete_many(doc! {})
            .await
            .expect("Failed to clean tokens");

        Arc::new(RwLock::new(db))
    }

    fn creation_data(email: &str) -> UserCreationData {
        UserCreationData {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            phone_number: None,
            password_hash: "pbkdf2-sha256$1000$00$00".to_string(),
            colour: "#8E44AD".to_string(),
        }
    }

    fn record(user_id: &str) -> IssuedTokenEntity {
        IssuedTokenEntity::new(
            user_id.to_string(),
            "access".to_string(),
            "refresh".to_string(),
            uuid::Uuid::new_v4().to_string(),
            uuid::Uuid::new_v4().to_string(),
        )
    }

    #[tokio::test]
    #[ignore = "requires MONGO_DB_URI"]
    async fn test_create_and_find_user() {
        let db = setup_test_db().await;
        let repo = MongoUserRepository::new(db, "test_users".to_string());
        repo.ensure_indexes().await.expect("Failed to create indexes");

        let created = repo
            .create_user(creation_data("ada@example.com"))
            .await
            .expect("Failed to create user");

        let found = repo
            .find_by_email("ada@example.com")
            .await
            .expect("Failed to find user")
            .expect("User not found");

        assert_eq!(found.id, created.id);
        assert!(repo.email_exists("ada@example.com").await.unwrap());

        let duplicate = repo.create_user(creation_data("ada@example.com")).await;
        assert!(matches!(duplicate, Err(AuthDataError::EmailTaken)));
    }

    #[tokio::test]
    #[ignore = "requires MONGO_DB_URI"]
    async fn test_save_user() {
        let db = setup_test_db().await;
        let repo = MongoUserRepository::new(db, "test_users".to_string());

        let mut user = repo
            .create_user(creation_data("save@example.com"))
            .await
            .expect("Failed to create user");
        user.password_hash = "pbkdf2-sha256$1000$11$11".to_string();
        repo.save(&user).await.expect("Failed to save user");

        let found = repo
            .find_by_id(&user.id.unwrap())
            .await
            .unwrap()
            .expect("User not found");
        assert_eq!(found.password_hash, "pbkdf2-sha256$1000$11$11");
    }

    #[tokio::test]
    #[ignore = "requires MONGO_DB_URI"]
    async fn test_token_records_lifecycle() {
        let db = setup_test_db().await;
        let repo = MongoTokenRepository::new(db, "test_tokens".to_string());
        repo.ensure_indexes().await.expect("Failed to create indexes");

        let first = record("user-1");
        let second = record("user-1");
        repo.create(first.clone()).await.unwrap();
        repo.create(first.clone()).await.unwrap();
        repo.create(second.clone()).await.unwrap();

        let found = repo
            .find_by_refresh_token_id(&first.refresh_token_id)
            .await
            .unwrap()
            .expect("Record not found");
        assert_eq!(found.access_token_id, first.access_token_id);

        assert!(repo.revoke(&first.access_token_id).await.unwrap());
        assert!(!repo.revoke(&first.access_token_id).await.unwrap());
        assert_eq!(repo.revoke_all_for_user("user-1").await.unwrap(), 1);
        assert!(repo
            .find_by_access_token_id(&second.access_token_id)
            .await
            .unwrap()
            .is_none());
    }
}
