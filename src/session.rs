//! The session of a logged in user and the middleware that requires one.
//!
//! A session is created when a user logs in or registers and holds the token
//! the remote API issued for them. It lives in an encrypted private cookie
//! together with its expiry, so nothing about the session is stored on the
//! server apart from the cached [crate::ledger::Ledger], which is keyed by
//! [SessionKey].
//!
//! The expiry is checked on every request and pushed back while the user is
//! active, so a session ends after a period of inactivity rather than at a
//! fixed time after logging in.

use std::cmp::max;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use axum_htmx::HxRedirect;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::{AppState, Error, endpoints, ledger::LedgerCache, log_out::end_session};

pub(crate) const COOKIE_SESSION: &str = "session";
/// The default duration for which session cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::days(1);

/// The user a request is made on behalf of.
///
/// Route handlers behind [auth_guard] receive it with
/// `Extension(session): Extension<Session>`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    username: String,
}

impl Session {
    pub fn new(token: &str, username: &str) -> Self {
        Self {
            token: token.to_owned(),
            username: username.to_owned(),
        }
    }

    /// The bearer token for the remote API.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The key for data cached on behalf of this session.
    pub fn key(&self) -> SessionKey {
        SessionKey(Sha256::digest(self.token.as_bytes()).into())
    }
}

// Keep the token out of the logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

/// A digest of a session's token used to key per-session server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey([u8; 32]);

/// Marks a response to a request whose token the API rejected.
///
/// The auth guard ends the session when it sees this in a response.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SessionRejected;

/// The contents of the session cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SessionCookie {
    #[serde(flatten)]
    session: Session,
    /// The session is rejected from this time on, whatever the browser does
    /// with the cookie's own expiry.
    expires_at: OffsetDateTime,
}

impl SessionCookie {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

fn write_session_cookie(
    jar: PrivateCookieJar,
    session_cookie: &SessionCookie,
) -> Result<PrivateCookieJar, Error> {
    let value = serde_json::to_string(session_cookie)
        .map_err(|error| Error::SessionSerialization(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_SESSION, value))
            .expires(session_cookie.expires_at)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Add the session cookie to the cookie jar, logging the user in.
///
/// The session expires `duration` from now unless it is extended by
/// activity, see [auth_guard].
///
/// # Errors
///
/// Returns [Error::SessionSerialization] if the session cannot be serialized
/// or the expiry is out of range.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    session: &Session,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::SessionSerialization("session expiry out of range".to_owned()))?;

    write_session_cookie(
        jar,
        &SessionCookie {
            session: session.clone(),
            expires_at,
        },
    )
}

/// Push the expiry of the session in `jar` back to `duration` from now.
///
/// An expiry that is already later than that is kept.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns [Error::SessionSerialization] if the new expiry is out of range or
/// the session cannot be serialized.
fn extend_session_cookie(
    jar: PrivateCookieJar,
    session_cookie: SessionCookie,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let extended = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::SessionSerialization("session expiry out of range".to_owned()))?;

    write_session_cookie(
        jar,
        &SessionCookie {
            expires_at: max(session_cookie.expires_at, extended),
            ..session_cookie
        },
    )
}

/// Set the session cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

fn read_session_cookie(jar: &PrivateCookieJar) -> Option<SessionCookie> {
    let cookie = jar.get(COOKIE_SESSION)?;

    serde_json::from_str(cookie.value_trimmed())
        .inspect_err(|error| tracing::warn!("Could not parse session cookie: {error}"))
        .ok()
}

/// Read the session from the cookie jar.
///
/// Returns `None` if there is no session cookie, it cannot be read or the
/// session has expired.
pub(crate) fn get_session_from_cookies(jar: &PrivateCookieJar) -> Option<Session> {
    read_session_cookie(jar)
        .filter(|session_cookie| !session_cookie.is_expired(OffsetDateTime::now_utc()))
        .map(|session_cookie| session_cookie.session)
}

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a session lasts after the last request made with it.
    pub cookie_duration: Duration,
    /// Cached ledgers, dropped when the API rejects a session.
    pub ledgers: LedgerCache,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            ledgers: state.ledgers.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn() -> Response,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Redirecting to log in page.");
            return get_redirect();
        }
    };

    let Some(session_cookie) = read_session_cookie(&jar) else {
        return get_redirect();
    };

    if session_cookie.is_expired(OffsetDateTime::now_utc()) {
        tracing::info!(
            "Session of {} has expired, redirecting to log in page.",
            session_cookie.session.username()
        );
        let jar = end_session(&state.ledgers, &session_cookie.session, jar);
        return (jar, get_redirect()).into_response();
    }

    parts.extensions.insert(session_cookie.session.clone());
    let response = next.run(Request::from_parts(parts, body)).await;

    if response.extensions().get::<SessionRejected>().is_some() {
        tracing::info!(
            "The API rejected the session of {}, ending it.",
            session_cookie.session.username()
        );
        let jar = end_session(&state.ledgers, &session_cookie.session, jar);
        return append_set_cookie_headers(response, jar);
    }

    // The handler ended or replaced the session, e.g. on log out.
    if sets_session_cookie(&response) {
        return response;
    }

    match extend_session_cookie(jar.clone(), session_cookie, state.cookie_duration) {
        Ok(jar) => append_set_cookie_headers(response, jar),
        Err(error) => {
            tracing::error!("Could not extend session: {error}. Keeping the current expiry.");
            response
        }
    }
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{COOKIE_SESSION}=");

    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

/// Add the cookie changes in `jar` to `response`.
fn append_set_cookie_headers(response: Response, jar: PrivateCookieJar) -> Response {
    let (mut parts, body) = response.into_parts();

    let cookies: Vec<HeaderValue> = jar
        .into_response()
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .cloned()
        .collect();
    for cookie in cookies {
        parts.headers.append(SET_COOKIE, cookie);
    }

    Response::from_parts(parts, body)
}

/// Middleware function that checks for a valid session cookie.
/// The [Session] is placed into the request and the request executed normally if the cookie is valid, otherwise a redirect to the log-in page is returned.
///
/// After the request, the session's expiry is pushed back by the cookie duration.
/// If the API rejected the session's token while handling the request, the
/// session is ended instead.
///
/// **Note**: The app state must contain an `axum_extra::extract::cookie::Key` for decrypting and verifying the cookie contents.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, || {
        Redirect::to(endpoints::LOG_IN_VIEW).into_response()
    })
    .await
}

/// Middleware function that checks for a valid session cookie.
/// The [Session] is placed into the request and the request executed normally if the cookie is valid, otherwise a HTMX redirect to the log-in page is returned.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, || {
        (
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            StatusCode::OK,
        )
            .into_response()
    })
    .await
}
