use std::time::Duration;

use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{config::SessionConfig, state::AppState, store::StoreError};

pub const SESSION_COOKIE: &str = "session";

/// Payload of the signed session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user ID
    pub sid: Uuid, // server-side session ID
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub remember_ttl: Duration,
    pub cookie_secure: bool,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            remember_ttl_minutes,
            cookie_secure,
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::from_secs((ttl_minutes.max(1) as u64) * 60),
            remember_ttl: Duration::from_secs((remember_ttl_minutes.max(1) as u64) * 60),
            cookie_secure,
        }
    }
}

impl SessionKeys {
    pub fn ttl_for(&self, remember: bool) -> Duration {
        if remember {
            self.remember_ttl
        } else {
            self.ttl
        }
    }

    pub fn sign(&self, user_id: Uuid, session_id: Uuid, expires_at: OffsetDateTime) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            sid: session_id,
            iat: now.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, session_id = %session_id, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// Cookie holding `token`. Without "remember me" it lives for the browser session only.
    pub fn cookie(&self, token: String, remember: bool) -> Cookie<'static> {
        let mut cookie = Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .build();
        if remember {
            cookie.set_max_age(TimeDuration::seconds(self.remember_ttl.as_secs() as i64));
        }
        cookie
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, "")).path("/").build()
    }
}

/// Creates the server-side session row and returns the cookie that refers to it.
pub async fn issue(
    state: &AppState,
    user_id: Uuid,
    remember: bool,
) -> Result<Cookie<'static>, anyhow::Error> {
    let keys = SessionKeys::from_ref(state);
    let now = OffsetDateTime::now_utc();
    let purged = state
        .store
        .purge_expired_sessions(now)
        .await
        .map_err(anyhow::Error::from)?;
    if purged > 0 {
        debug!(purged, "expired sessions removed");
    }

    let ttl = keys.ttl_for(remember);
    let expires_at = now + TimeDuration::seconds(ttl.as_secs() as i64);
    let session = state
        .store
        .create_session(user_id, expires_at)
        .await
        .map_err(anyhow::Error::from)?;
    let token = keys.sign(user_id, session.id, session.expires_at)?;
    info!(
        user_id = %user_id,
        session_id = %session.id,
        created_at = %session.created_at,
        expires_at = %session.expires_at,
        remember,
        "session issued"
    );
    Ok(keys.cookie(token, remember))
}

/// Deletes the server-side session; its cookie stops validating immediately.
pub async fn invalidate(state: &AppState, session_id: Uuid) -> Result<(), StoreError> {
    state.store.delete_session(session_id).await?;
    info!(session_id = %session_id, "session invalidated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{memory::MemoryStore, Store};

    fn make_keys() -> SessionKeys {
        SessionKeys::from_ref(&AppState::fake())
    }

    #[test]
    fn sign_and_verify() {
        let keys = make_keys();
        let (user_id, sid) = (Uuid::new_v4(), Uuid::new_v4());
        let exp = OffsetDateTime::now_utc() + TimeDuration::minutes(5);
        let token = keys.sign(user_id, sid, exp).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.sid, sid);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[test]
    fn verify_rejects_wrong_audience() {
        let keys = make_keys();
        let mut other = make_keys();
        other.audience = "someone-else".into();
        let exp = OffsetDateTime::now_utc() + TimeDuration::minutes(5);
        let token = keys.sign(Uuid::new_v4(), Uuid::new_v4(), exp).unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_and_tampered_tokens() {
        let keys = make_keys();
        let past = OffsetDateTime::now_utc() - TimeDuration::hours(1);
        let expired = keys.sign(Uuid::new_v4(), Uuid::new_v4(), past).unwrap();
        assert!(keys.verify(&expired).is_err());

        let exp = OffsetDateTime::now_utc() + TimeDuration::minutes(5);
        let mut token = keys.sign(Uuid::new_v4(), Uuid::new_v4(), exp).unwrap();
        token.push('x');
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn remember_me_makes_the_cookie_persistent() {
        let keys = make_keys();
        let browser = keys.cookie("t".into(), false);
        assert!(browser.max_age().is_none());
        assert_eq!(browser.http_only(), Some(true));
        assert_eq!(browser.same_site(), Some(SameSite::Lax));

        let remembered = keys.cookie("t".into(), true);
        assert_eq!(
            remembered.max_age(),
            Some(TimeDuration::seconds(keys.remember_ttl.as_secs() as i64))
        );
        assert!(keys.ttl_for(true) > keys.ttl_for(false));
    }

    #[tokio::test]
    async fn issuing_a_session_sweeps_expired_rows() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::fake_with(store.clone());
        let user_id = Uuid::new_v4();

        let stale = store
            .create_session(user_id, OffsetDateTime::now_utc() - TimeDuration::minutes(1))
            .await
            .unwrap();
        let live = store
            .create_session(user_id, OffsetDateTime::now_utc() + TimeDuration::hours(1))
            .await
            .unwrap();
        assert_eq!(store.session_count(), 2);

        issue(&state, user_id, false).await.unwrap();

        assert_eq!(store.session_count(), 2);
        assert!(store.find_session(stale.id).await.unwrap().is_none());
        assert!(store.find_session(live.id).await.unwrap().is_some());
    }
}
