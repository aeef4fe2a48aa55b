use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::redirect::login_url;
use super::session::{SessionKeys, SESSION_COOKIE};
use crate::{error::AppError, state::AppState, store::User};

/// The signed-in user, resolved from the session cookie.
pub struct CurrentUser {
    pub user: User,
    pub session_id: Uuid,
}

pub enum AuthRejection {
    /// Not signed in; carries the path to come back to.
    Login(String),
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Login(next) => Redirect::to(&login_url(Some(&next))).into_response(),
            AuthRejection::Failed(e) => e.into_response(),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            debug!(path = %next, "no session cookie");
            return Err(AuthRejection::Login(next));
        };

        let keys = SessionKeys::from_ref(state);
        let claims = match keys.verify(&token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired session token");
                return Err(AuthRejection::Login(next));
            }
        };

        let session = state
            .store
            .find_session(claims.sid)
            .await
            .map_err(|e| AuthRejection::Failed(e.into()))?;
        let Some(session) = session
            .filter(|s| s.user_id == claims.sub && s.is_live(OffsetDateTime::now_utc()))
        else {
            warn!(session_id = %claims.sid, "session revoked or expired");
            return Err(AuthRejection::Login(next));
        };

        let user = state
            .store
            .find_user_by_id(claims.sub)
            .await
            .map_err(|e| AuthRejection::Failed(e.into()))?;
        let Some(user) = user else {
            warn!(user_id = %claims.sub, "session for missing user");
            return Err(AuthRejection::Login(next));
        };

        Ok(CurrentUser {
            user,
            session_id: session.id,
        })
    }
}
