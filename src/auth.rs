use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};

use crate::{error::AppError, session::SessionManager, state::AppState};

pub const SESSION_COOKIE: &str = "travel_session";

/// The session of the client behind the current request, restored from its
/// private cookie. Signed out when the cookie is missing, stale or tampered with.
#[derive(Clone)]
pub struct ClientSession(pub SessionManager);

#[async_trait]
impl FromRequestParts<AppState> for ClientSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };

        let manager = state.session_manager();
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            manager.restore(cookie.value()).await?;
        }
        Ok(Self(manager))
    }
}

pub fn apply_session_cookie(jar: PrivateCookieJar, token: &str) -> PrivateCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
