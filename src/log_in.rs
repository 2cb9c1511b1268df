//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The session module handles the cookie that keeps the user logged in.

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    alert::{ALERT_CONTAINER_TARGET, Alert},
    api::{ApiClient, ApiError, types::Credentials},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    session::{Session, invalidate_session_cookie, set_session_cookie},
};

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect username or password";

/// A labelled username field.
pub(crate) fn username_input() -> Markup {
    html! {
        div
        {
            label for="username" class=(FORM_LABEL_STYLE) { "Username" }

            input
                type="text"
                name="username"
                id="username"
                autocomplete="username"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus;
        }
    }
}

fn log_in_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-target-error=(ALERT_CONTAINER_TARGET)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (username_input())
            (password_input("password", "Password", 0))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Register here"
                }
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    let content = log_in_register("Log in to your account", &log_in_form());
    base("Log In", &[], &content).into_response()
}

/// The state needed to log in or register a user.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    pub api: ApiClient,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            api: state.api.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The credentials are not validated here, the API checks them.
#[derive(Clone, Deserialize)]
pub struct LogInForm {
    pub username: String,
    pub password: String,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the session cookie is set and the client
/// is redirected to the dashboard page. Otherwise, an alert explaining the
/// problem is returned.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(form): Form<LogInForm>,
) -> Response {
    let username = form.username.trim();

    if username.is_empty() || form.password.is_empty() {
        return Error::MissingCredentials.into_alert_response();
    }

    let credentials = Credentials {
        username,
        password: &form.password,
    };

    match state.api.log_in(&credentials).await {
        Ok(token) => {
            tracing::info!("User {username} logged in");
            start_session(jar, &Session::new(&token.token, username), state.cookie_duration)
        }
        Err(ApiError::Unauthorized | ApiError::Status { status: 400 | 403, .. }) => (
            StatusCode::UNAUTHORIZED,
            Alert::ErrorSimple {
                message: INVALID_CREDENTIALS_ERROR_MSG.to_owned(),
            }
            .into_html(),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not log in {username}: {error}");
            Error::from(error).into_alert_response()
        }
    }
}

/// Store `session` in the session cookie and send the client to the dashboard.
pub(crate) fn start_session(
    jar: PrivateCookieJar,
    session: &Session,
    cookie_duration: Duration,
) -> Response {
    set_session_cookie(jar.clone(), session, cookie_duration)
        .map(|updated_jar| {
            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                updated_jar,
            )
        })
        .map_err(|err| {
            tracing::error!("Error setting session cookie: {err}");
            (
                invalidate_session_cookie(jar),
                get_internal_server_error_redirect(),
            )
        })
        .into_response()
}
