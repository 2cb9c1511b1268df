//! Log-out route handler that ends the session and redirects users.

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{
    AppState,
    api::ApiClient,
    endpoints,
    ledger::{LedgerCache, evict_ledger},
    session::{Session, invalidate_session_cookie},
};

/// The state needed to end a session.
#[derive(Debug, Clone)]
pub struct LogOutState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    pub api: ApiClient,
    pub ledgers: LedgerCache,
}

impl FromRef<AppState> for LogOutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            api: state.api.clone(),
            ledgers: state.ledgers.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogOutState> for Key {
    fn from_ref(state: &LogOutState) -> Self {
        state.cookie_key.clone()
    }
}

/// Forget everything held for `session` and invalidate the session cookie.
pub(crate) fn end_session(
    ledgers: &LedgerCache,
    session: &Session,
    jar: PrivateCookieJar,
) -> PrivateCookieJar {
    evict_ledger(ledgers, session);
    invalidate_session_cookie(jar)
}

/// Revoke the API token, invalidate the session cookie and redirect the
/// client to the log-in page.
///
/// The user is logged out locally even if the API could not revoke the token.
pub async fn get_log_out(
    State(state): State<LogOutState>,
    Extension(session): Extension<Session>,
    jar: PrivateCookieJar,
) -> Response {
    if let Err(error) = state.api.log_out(&session).await {
        tracing::warn!("Could not revoke API token: {error}");
    }

    tracing::info!("User {} logged out", session.username());
    let jar = end_session(&state.ledgers, &session, jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
