//! Welcome page: session gate plus static markup.
//!
//! A request without a logged-in session is answered with a `302 Found`
//! to the login page and an empty body. Nothing about the welcome page is
//! produced on that path.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::Cookie;

use crate::services::session;
use crate::state::AppState;

/// Matches the headers PHP's default `nocache` limiter sends with a session page.
fn no_cache_headers() -> [(HeaderName, &'static str); 2] {
    [(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"), (header::PRAGMA, "no-cache")]
}

// =============================================================================
// SESSION EXTRACTOR
// =============================================================================

/// Login state of the requesting client.
///
/// Never rejects: a missing cookie, an unknown id, or a store failure all
/// resolve to `logged_in == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub logged_in: bool,
}

impl<S> FromRequestParts<S> for SessionContext
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let id = first_cookie(&parts.headers, &app_state.config.session_cookie).unwrap_or_default();

        if !session::is_valid_session_id(&id) {
            return Ok(Self { logged_in: false });
        }

        let logged_in = match app_state.sessions.load(&id).await {
            Ok(found) => found.is_some_and(|s| s.logged_in),
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed; treating request as logged out");
                false
            }
        };
        Ok(Self { logged_in })
    }
}

/// Value of the first cookie called `name`, across all `Cookie` headers.
///
/// PHP fills `$_COOKIE` first-wins, so a duplicate (e.g. one set for a
/// parent path) must not override the session id PHP would pick.
fn first_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}

// =============================================================================
// HANDLER
// =============================================================================

/// `GET /welcome.php`: welcome page, or a redirect to login without a session.
pub async fn welcome(State(state): State<AppState>, session: SessionContext) -> Response {
    if !session.logged_in {
        tracing::debug!(location = %state.config.login_location, "no logged-in session, redirecting");
        return found(&state.config.login_location);
    }

    (no_cache_headers(), Html(state.page.clone())).into_response()
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)], no_cache_headers()).into_response()
}

// =============================================================================
// MARKUP
// =============================================================================

/// Render the welcome document with the given stylesheet and logout links.
#[must_use]
pub fn render_page(stylesheet_href: &str, logout_href: &str) -> String {
    let stylesheet_href = html_escape::encode_double_quoted_attribute(stylesheet_href);
    let logout_href = html_escape::encode_double_quoted_attribute(logout_href);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Welcome</title>
    <link rel="stylesheet" href="{stylesheet_href}">
</head>
<body>
    <div class="welcome-container">
        <h2>Welcome!</h2>
        <p>You have successfully logged in.</p>
        <a href="{logout_href}">Logout</a>
    </div>
</body>
</html>
"#
    )
}

#[cfg(test)]
#[path = "welcome_test.rs"]
mod tests;
