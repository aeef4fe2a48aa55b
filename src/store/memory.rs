//! In-process store used by the router tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{FeedPost, NewUser, Post, Session, Store, StoreError, StoreResult, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    follows: HashSet<(Uuid, Uuid)>,
    // insertion order doubles as the tie-breaker for equal timestamps
    posts: Vec<Post>,
    sessions: HashMap<Uuid, Session>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    // fault switches for exercising error paths
    fail_session_reads: AtomicBool,
    hide_users: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Database(anyhow::anyhow!("memory store poisoned")))
    }

    pub fn user_count(&self) -> usize {
        self.lock().map(|t| t.users.len()).unwrap_or(0)
    }

    pub fn posts(&self) -> Vec<Post> {
        self.lock().map(|t| t.posts.clone()).unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.lock().map(|t| t.sessions.len()).unwrap_or(0)
    }

    /// Makes `find_session` fail with a database error.
    pub fn fail_session_reads(&self, fail: bool) {
        self.fail_session_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes username/email lookups miss while inserts still see every row.
    pub fn hide_users(&self, hide: bool) {
        self.hide_users.store(hide, Ordering::SeqCst);
    }

    fn users_hidden(&self) -> bool {
        self.hide_users.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new: NewUser<'_>) -> StoreResult<User> {
        let mut t = self.lock()?;
        if t.users.iter().any(|u| u.username == new.username) {
            return Err(StoreError::UsernameTaken);
        }
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::EmailTaken);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username.to_owned(),
            email: new.email.to_owned(),
            password_hash: new.password_hash.to_owned(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        if self.users_hidden() {
            return Ok(None);
        }
        Ok(self.lock()?.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        if self.users_hidden() {
            return Ok(None);
        }
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn follow(&self, follower_id: Uuid, followed_id: Uuid) -> StoreResult<()> {
        if follower_id == followed_id {
            return Err(StoreError::SelfFollow);
        }
        self.lock()?.follows.insert((follower_id, followed_id));
        Ok(())
    }

    async fn unfollow(&self, follower_id: Uuid, followed_id: Uuid) -> StoreResult<()> {
        self.lock()?.follows.remove(&(follower_id, followed_id));
        Ok(())
    }

    async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> StoreResult<bool> {
        Ok(self.lock()?.follows.contains(&(follower_id, followed_id)))
    }

    async fn create_post(&self, author_id: Uuid, body: &str, language: &str) -> StoreResult<Post> {
        let mut t = self.lock()?;
        if !t.users.iter().any(|u| u.id == author_id) {
            return Err(StoreError::Database(anyhow::anyhow!("unknown author {author_id}")));
        }
        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            body: body.to_owned(),
            language: language.to_owned(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.posts.push(post.clone());
        Ok(post)
    }

    async fn followed_posts(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<FeedPost>> {
        let t = self.lock()?;
        let mut rows: Vec<(usize, FeedPost)> = t
            .posts
            .iter()
            .enumerate()
            .filter(|(_, p)| t.follows.contains(&(user_id, p.author_id)))
            .filter_map(|(seq, p)| {
                let author = t.users.iter().find(|u| u.id == p.author_id)?;
                Some((
                    seq,
                    FeedPost {
                        id: p.id,
                        author_id: p.author_id,
                        author_username: author.username.clone(),
                        body: p.body.clone(),
                        language: p.language.clone(),
                        created_at: p.created_at,
                    },
                ))
            })
            .collect();
        rows.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));
        Ok(rows
            .into_iter()
            .map(|(_, p)| p)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> StoreResult<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: OffsetDateTime::now_utc(),
            expires_at,
        };
        self.lock()?.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        if self.fail_session_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database(anyhow::anyhow!("session lookup failed")));
        }
        Ok(self.lock()?.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> StoreResult<()> {
        self.lock()?.sessions.remove(&id);
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: OffsetDateTime) -> StoreResult<u64> {
        let mut t = self.lock()?;
        let before = t.sessions.len();
        t.sessions.retain(|_, s| s.is_live(now));
        Ok((before - t.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(NewUser {
                username: name,
                email: &format!("{name}@x.com"),
                password_hash: "hash",
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn rejects_duplicate_username_and_email() {
        let store = MemoryStore::new();
        user(&store, "alice").await;
        let err = store
            .create_user(NewUser { username: "alice", email: "other@x.com", password_hash: "h" })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken));
        let err = store
            .create_user(NewUser { username: "bob", email: "alice@x.com", password_hash: "h" })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn feed_contains_only_followed_authors_newest_first() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let carol = user(&store, "carol").await;
        store.follow(alice.id, bob.id).await.unwrap();

        store.create_post(bob.id, "first", "").await.unwrap();
        store.create_post(carol.id, "not followed", "").await.unwrap();
        store.create_post(alice.id, "own post", "").await.unwrap();
        store.create_post(bob.id, "second", "").await.unwrap();

        let feed = store.followed_posts(alice.id, 10, 0).await.unwrap();
        let bodies: Vec<_> = feed.iter().map(|p| p.body.as_str()).collect();
        assert_eq!(bodies, vec!["second", "first"]);
        assert!(feed.iter().all(|p| p.author_username == "bob"));

        let page2 = store.followed_posts(alice.id, 1, 1).await.unwrap();
        assert_eq!(page2[0].body, "first");
    }

    #[tokio::test]
    async fn follow_edges() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        assert!(matches!(store.follow(alice.id, alice.id).await, Err(StoreError::SelfFollow)));
        store.follow(alice.id, bob.id).await.unwrap();
        store.follow(alice.id, bob.id).await.unwrap();
        assert!(store.is_following(alice.id, bob.id).await.unwrap());
        assert!(!store.is_following(bob.id, alice.id).await.unwrap());
        store.unfollow(alice.id, bob.id).await.unwrap();
        assert!(!store.is_following(alice.id, bob.id).await.unwrap());
    }
}
