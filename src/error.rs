use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::store::StoreError;
use crate::views::{self, Page};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Store(e) => tracing::error!(error = %e, "store failure"),
            AppError::Internal(e) => tracing::error!(error = ?e, "internal failure"),
        }
        let page = Page::new("Error", None, Vec::new());
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            views::error(
                &page,
                "Something went wrong",
                "An unexpected error has occurred. Please try again later.",
            ),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
