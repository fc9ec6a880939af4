//! Session guard for the signed-in area.

use axum::extract::Request;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

/// Cookie set by the auth backend once the user has signed in.
pub const SESSION_COOKIE: &str = "sb-access-token";
pub const LOGIN_PATH: &str = "/login";

/// Value of cookie `name`, if the request carries it.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

/// `/app` and everything below it.
pub fn is_protected(path: &str) -> bool {
    path == "/app" || path.starts_with("/app/")
}

/// Redirect protected pages to the login page when no session cookie is
/// present. Only presence is checked; the backend validates the token.
pub async fn require_session(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_protected(path) && cookie_value(request.headers(), SESSION_COOKIE).is_none() {
        debug!("No session for {}, redirecting to login", path);
        return Redirect::temporary(LOGIN_PATH).into_response();
    }
    next.run(request).await
}
