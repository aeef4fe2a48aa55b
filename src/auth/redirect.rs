use axum::http::Uri;
use tracing::warn;

/// Where a successful login lands when no usable `next` was supplied.
pub const DEFAULT_PAGE: &str = "/home";

/// Accepts only same-origin relative paths: a single leading slash, no
/// scheme, no authority, no backslashes and no control characters.
pub fn is_safe_next(next: &str) -> bool {
    if !next.starts_with('/') || next.starts_with("//") {
        return false;
    }
    if next.contains('\\') || next.chars().any(|c| c.is_control()) {
        return false;
    }
    match next.parse::<Uri>() {
        Ok(uri) => uri.scheme().is_none() && uri.authority().is_none(),
        Err(_) => false,
    }
}

/// The `next` value if it is safe, otherwise nothing.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    let next = next.filter(|n| !n.is_empty())?;
    if is_safe_next(next) {
        Some(next)
    } else {
        warn!(next = %next, "rejected unsafe redirect target");
        None
    }
}

pub fn redirect_target(next: Option<&str>) -> String {
    safe_next(next).unwrap_or(DEFAULT_PAGE).to_string()
}

/// `/login`, carrying `next` along when it is safe.
pub fn login_url(next: Option<&str>) -> String {
    match safe_next(next) {
        Some(n) => format!("/login?next={}", urlencoding::encode(n)),
        None => "/login".to_string(),
    }
}
