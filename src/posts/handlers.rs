use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info, instrument};

use super::{
    forms::{FeedQuery, PostForm},
    language,
};
use crate::{
    auth::extractors::CurrentUser,
    error::AppResult,
    flash,
    state::AppState,
    store::User,
    validation::FieldErrors,
    views::{self, Page, Paging},
};

pub const POSTED: &str = "Your post is now live!";

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(home).post(create_post))
        .route("/write", get(write).post(write))
}

async fn render_home(
    state: &AppState,
    jar: CookieJar,
    user: &User,
    query: &FeedQuery,
    draft: &str,
    errors: &FieldErrors,
) -> AppResult<Response> {
    let per_page = state.config.posts_per_page;
    // one extra row tells us whether an older page exists
    let mut posts = state
        .store
        .followed_posts(user.id, per_page + 1, query.offset(per_page))
        .await?;
    let has_older = posts.len() as i64 > per_page;
    posts.truncate(per_page as usize);
    debug!(user_id = %user.id, page = query.page(), count = posts.len(), "feed loaded");

    let paging = Paging {
        page: query.page(),
        has_newer: query.page() > 1,
        has_older,
    };
    let (jar, flashes) = flash::take(jar);
    let page = Page::new("Home Page", Some(&user.username), flashes);
    Ok((jar, views::home(&page, &posts, draft, errors, paging)).into_response())
}

#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn home(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Query(query): Query<FeedQuery>,
) -> AppResult<Response> {
    render_home(&state, jar, &current.user, &query, "", &FieldErrors::new()).await
}

#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn create_post(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        let query = FeedQuery::default();
        return render_home(&state, jar, &current.user, &query, &form.post, &errors).await;
    }

    let body = form.body();
    let tag = language::tag_for(state.language.as_ref(), body);
    let post = state.store.create_post(current.user.id, body, &tag).await?;
    info!(post_id = %post.id, language = %post.language, "post created");

    let jar = flash::push(jar, POSTED);
    Ok((jar, Redirect::to("/home")).into_response())
}

#[instrument(skip_all, fields(user_id = %current.user.id))]
pub async fn write(current: CurrentUser, jar: CookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    let page = Page::new("Write", Some(&current.user.username), flashes);
    (jar, views::write(&page)).into_response()
}
