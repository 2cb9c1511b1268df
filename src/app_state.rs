//! The state shared by every handler: the cookie key, the finance API client
//! and the cache of each signed-in user's ledger.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{api::ApiClient, ledger::LedgerCache, session::DEFAULT_COOKIE_DURATION};

/// The state of the web app, split into per-handler states with [FromRef].
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,

    /// The client for the remote finance API.
    pub api: ApiClient,

    /// The cached ledgers of logged in users.
    pub ledgers: LedgerCache,
}

impl AppState {
    /// Create a new [AppState] that talks to the finance API through `api`.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "America/Sao_Paulo".
    pub fn new(cookie_secret: &str, local_timezone: &str, api: ApiClient) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            api,
            ledgers: LedgerCache::new(DEFAULT_COOKIE_DURATION),
        }
    }
}

// `PrivateCookieJar` reads its key from the state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
