use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use super::{
    extractors::{AuthRejection, CurrentUser},
    forms::{LoginForm, NextQuery, RegistrationForm},
    password::{burn_verification, hash_password, verify_password},
    redirect::{login_url, redirect_target, DEFAULT_PAGE},
    session::{self, SessionKeys},
};
use crate::{
    error::AppResult,
    flash,
    state::AppState,
    store::{NewUser, StoreError},
    validation::FieldErrors,
    views::{self, Page},
};

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const REGISTERED: &str = "Congratulations, you are now a registered user!";
const USERNAME_TAKEN: &str = "Please use a different username.";
const EMAIL_TAKEN: &str = "Please use a different email address.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout))
}

fn render_login(jar: CookieJar, username: &str, errors: &FieldErrors, next: Option<&str>) -> Response {
    let (jar, flashes) = flash::take(jar);
    let page = Page::new("Sign In", None, flashes);
    (jar, views::login(&page, username, errors, &login_url(next))).into_response()
}

fn render_register(jar: CookieJar, form: &RegistrationForm, errors: &FieldErrors) -> Response {
    let (jar, flashes) = flash::take(jar);
    let page = Page::new("Register", None, flashes);
    (jar, views::register(&page, &form.username, &form.email, errors)).into_response()
}

#[instrument(skip_all)]
pub async fn login_page(
    current: Option<CurrentUser>,
    jar: CookieJar,
    Query(q): Query<NextQuery>,
) -> Response {
    if current.is_some() {
        return Redirect::to(DEFAULT_PAGE).into_response();
    }
    render_login(jar, "", &FieldErrors::new(), q.next.as_deref())
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    jar: CookieJar,
    Query(q): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(Redirect::to(DEFAULT_PAGE).into_response());
    }
    if let Err(errors) = form.validate() {
        return Ok(render_login(jar, &form.username, &errors, q.next.as_deref()));
    }

    let user = state.store.find_user_by_username(form.username.trim()).await?;
    let verified = match &user {
        Some(u) => verify_password(&form.password, &u.password_hash)?,
        None => {
            burn_verification(&form.password);
            false
        }
    };

    let Some(user) = user.filter(|_| verified) else {
        warn!(username = %form.username, "login rejected");
        let jar = flash::push(jar, INVALID_CREDENTIALS);
        return Ok((jar, Redirect::to(&login_url(q.next.as_deref()))).into_response());
    };

    let cookie = session::issue(&state, user.id, form.remember()).await?;
    let target = redirect_target(q.next.as_deref());
    info!(user_id = %user.id, target = %target, "user logged in");
    Ok((jar.add(cookie), Redirect::to(&target)).into_response())
}

#[instrument(skip_all)]
pub async fn register_page(current: Option<CurrentUser>, jar: CookieJar) -> Response {
    if current.is_some() {
        return Redirect::to(DEFAULT_PAGE).into_response();
    }
    render_register(jar, &RegistrationForm::default(), &FieldErrors::new())
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    jar: CookieJar,
    Form(mut form): Form<RegistrationForm>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(Redirect::to(DEFAULT_PAGE).into_response());
    }

    form.normalize();
    let mut errors = form.validate().err().unwrap_or_default();

    if !errors.has("username")
        && state.store.find_user_by_username(&form.username).await?.is_some()
    {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.has("email") && state.store.find_user_by_email(&form.email).await?.is_some() {
        errors.add("email", EMAIL_TAKEN);
    }
    if !errors.is_empty() {
        warn!(username = %form.username, email = %form.email, "registration rejected");
        return Ok(render_register(jar, &form, &errors));
    }

    let hash = hash_password(&form.password)?;
    let created = state
        .store
        .create_user(NewUser {
            username: &form.username,
            email: &form.email,
            password_hash: &hash,
        })
        .await;

    match created {
        Ok(user) => {
            info!(user_id = %user.id, "user registered");
            let jar = flash::push(jar, REGISTERED);
            Ok((jar, Redirect::to("/login")).into_response())
        }
        // lost a race against a concurrent registration
        Err(StoreError::UsernameTaken) => {
            errors.add("username", USERNAME_TAKEN);
            Ok(render_register(jar, &form, &errors))
        }
        Err(StoreError::EmailTaken) => {
            errors.add("email", EMAIL_TAKEN);
            Ok(render_register(jar, &form, &errors))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    current: Result<CurrentUser, AuthRejection>,
    jar: CookieJar,
) -> AppResult<Response> {
    match current {
        Ok(current) => {
            session::invalidate(&state, current.session_id).await?;
            info!(user_id = %current.user.id, "user logged out");
        }
        // no live session to end
        Err(AuthRejection::Login(_)) => {}
        Err(AuthRejection::Failed(e)) => return Err(e),
    }
    let keys = SessionKeys::from_ref(&state);
    Ok((jar.remove(keys.removal_cookie()), Redirect::to("/")).into_response())
}
