use crate::state::AppState;
use axum::Router;

mod forms;
pub mod handlers;
pub mod language;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::post_routes())
}
