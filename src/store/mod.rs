use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub language: String,
    pub created_at: OffsetDateTime,
}

/// A post joined with its author's username, as shown in the feed.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeedPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub body: String,
    pub language: String,
    pub created_at: OffsetDateTime,
}

/// Server-side half of a login session. The signed cookie carries `id`.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    pub fn is_live(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username already taken")]
    UsernameTaken,
    #[error("email already registered")]
    EmailTaken,
    #[error("a user cannot follow themselves")]
    SelfFollow,
    #[error("database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository operations over users, posts, follow edges and sessions.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, new: NewUser<'_>) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Adds the edge `follower -> followed`. Following twice is a no-op.
    async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> StoreResult<()>;
    async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> StoreResult<()>;
    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> StoreResult<bool>;

    async fn create_post(&self, author_id: Uuid, body: &str, language: &str) -> StoreResult<Post>;
    /// Posts by accounts `user_id` follows, newest first. Own posts are not included.
    async fn followed_posts(&self, user_id: Uuid, limit: i64, offset: i64)
        -> StoreResult<Vec<FeedPost>>;

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> StoreResult<Session>;
    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>>;
    async fn delete_session(&self, id: Uuid) -> StoreResult<()>;
    /// Drops sessions that are no longer live at `now`; returns how many went.
    async fn purge_expired_sessions(&self, now: OffsetDateTime) -> StoreResult<u64>;
}
