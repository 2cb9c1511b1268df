//! The registration page for creating an account with the finance API.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    alert::ALERT_CONTAINER_TARGET,
    api::types::Credentials,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, base, loading_spinner, log_in_register, password_input},
    log_in::{LogInState, start_session, username_input},
    session::Session,
};

/// The minimum number of characters a new password must have.
pub const MIN_PASSWORD_LENGTH: usize = 6;

fn register_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER_API)
            hx-target-error=(ALERT_CONTAINER_TARGET)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (username_input())
            (password_input("password", "Password", MIN_PASSWORD_LENGTH))
            (password_input("confirm_password", "Confirm Password", MIN_PASSWORD_LENGTH))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                    "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let content = log_in_register("Create an account", &register_form());
    base("Register", &[], &content).into_response()
}

/// The data entered by the user in the registration form.
#[derive(Clone, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Check the new password before it is sent to the API.
///
/// # Errors
///
/// Returns [Error::PasswordTooShort] or [Error::PasswordMismatch].
pub(crate) fn validate_new_password(password: &str, confirm_password: &str) -> Result<(), Error> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if password != confirm_password {
        return Err(Error::PasswordMismatch);
    }

    Ok(())
}

/// Create a user with the API and log them in.
///
/// On success the session cookie is set and the client is redirected to the
/// dashboard, otherwise an alert explaining the problem is returned.
pub async fn register_user(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let username = form.username.trim();

    if username.is_empty() || form.password.is_empty() {
        return Error::MissingCredentials.into_alert_response();
    }

    if let Err(error) = validate_new_password(&form.password, &form.confirm_password) {
        return error.into_alert_response();
    }

    let credentials = Credentials {
        username,
        password: &form.password,
    };

    match state.api.register(&credentials).await {
        Ok(token) => {
            tracing::info!("Registered user {username}");
            start_session(jar, &Session::new(&token.token, username), state.cookie_duration)
        }
        Err(error) => {
            tracing::error!("Could not register {username}: {error}");
            Error::from(error).into_alert_response()
        }
    }
}
