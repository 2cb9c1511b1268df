//! Budget View is a web app for tracking personal spending.
//!
//! This library provides a REST API that directly serves HTML pages. It is a
//! presentation layer over a remote finance API, which stores all of the
//! user's data: categories, accounts and transactions. The server keeps a
//! per-session copy of that data to render the dashboard, and relays every
//! change the user makes to the remote API.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Extension,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;
use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod api;
mod app_state;
mod category;
mod dashboard;
mod endpoints;
mod html;
mod internal_server_error;
mod ledger;
mod log_in;
mod log_out;
mod logging;
mod navigation;
mod not_found;
mod profile;
mod register;
mod routing;
mod session;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use api::{ApiClient, ApiError};
pub use app_state::AppState;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

use crate::{
    alert::Alert, internal_server_error::InternalServerError, session::SessionRejected,
    transaction::EntryError,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A call to the remote finance API failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The transaction entry form had an invalid value, the transaction was
    /// not sent to the API.
    #[error("invalid transaction: {0}")]
    InvalidEntry(#[from] EntryError),

    /// An empty string was used to create a category or subcategory name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A category kind other than "expense" or "income" was given.
    #[error("\"{0}\" is not a valid category kind")]
    InvalidCategoryKind(String),

    /// A payment method other than cash, pix, card or vr was given.
    #[error("\"{0}\" is not a valid payment method")]
    InvalidPaymentMethod(String),

    /// The username or password was left empty on the log in or register form.
    #[error("username and password are required")]
    MissingCredentials,

    /// The new password is shorter than the minimum length.
    #[error("the new password must be at least {0} characters long")]
    PasswordTooShort(usize),

    /// The new password and its confirmation do not match.
    #[error("the passwords do not match")]
    PasswordMismatch,

    /// The user did not type the confirmation text to delete their account.
    #[error("the account deletion was not confirmed")]
    DeletionNotConfirmed,

    /// The session could not be written to the session cookie.
    #[error("could not serialize the session: {0}")]
    SessionSerialization(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the lock for the cached ledgers.
    #[error("could not acquire the ledger cache lock")]
    LedgerLockError,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Api(ApiError::Unauthorized) => {
                tracing::info!("The API rejected the session token, redirecting to log in.");
                (
                    Extension(SessionRejected),
                    Redirect::to(endpoints::LOG_IN_VIEW),
                )
                    .into_response()
            }
            Error::Api(error) => {
                tracing::error!("A request to the finance API failed: {error}");
                InternalServerError::finance_api_failed().into_response()
            }
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::LedgerLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::Api(ApiError::Unauthorized) => {
                return (
                    Extension(SessionRejected),
                    HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
                    StatusCode::OK,
                )
                    .into_response();
            }
            Error::Api(ApiError::Status { message, .. }) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "The finance service rejected the request".to_owned(),
                    details: message,
                },
            ),
            Error::Api(ApiError::Request(_)) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Could not reach the finance service".to_owned(),
                    details: "Check your connection and try again.".to_owned(),
                },
            ),
            Error::Api(ApiError::InvalidResponse(_)) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Unexpected response from the finance service".to_owned(),
                    details: "Check the server logs for more details.".to_owned(),
                },
            ),
            Error::InvalidEntry(error) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not add transaction".to_owned(),
                    details: capitalize_first(&error.to_string()),
                },
            ),
            Error::EmptyCategoryName => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Category name cannot be empty".to_owned(),
                },
            ),
            Error::InvalidCategoryKind(kind) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category kind".to_owned(),
                    details: format!("\"{kind}\" is not one of expense or income."),
                },
            ),
            Error::InvalidPaymentMethod(method) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid payment method".to_owned(),
                    details: format!("\"{method}\" is not a valid payment method."),
                },
            ),
            Error::MissingCredentials => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Enter your username and password".to_owned(),
                },
            ),
            Error::PasswordTooShort(min_length) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Password is too short".to_owned(),
                    details: format!(
                        "The new password must be at least {min_length} characters long."
                    ),
                },
            ),
            Error::PasswordMismatch => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "The passwords do not match".to_owned(),
                },
            ),
            Error::DeletionNotConfirmed => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Account not deleted".to_owned(),
                    details: "Type DELETE to confirm that you want to delete your account."
                        .to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
