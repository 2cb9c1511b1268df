//! The endpoint for changing the user's password.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;

use crate::{
    Error,
    alert::Alert,
    api::types::PasswordChange,
    ledger::LedgerState,
    register::validate_new_password,
    session::Session,
};

#[derive(Clone, Deserialize)]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password: String,
    /// Only checked when the form sends it.
    pub confirm_password: Option<String>,
}

/// Change the password with the API.
///
/// The new password is checked locally first: it must be long enough and
/// match its confirmation.
pub async fn change_password_endpoint(
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    if form.old_password.is_empty() {
        return Error::MissingCredentials.into_alert_response();
    }

    let confirm_password = form.confirm_password.as_deref().unwrap_or(&form.new_password);

    if let Err(error) = validate_new_password(&form.new_password, confirm_password) {
        return error.into_alert_response();
    }

    let change = PasswordChange {
        old_password: &form.old_password,
        new_password: &form.new_password,
    };

    match state.api.change_password(&session, &change).await {
        Ok(()) => {
            tracing::info!("User {} changed their password", session.username());
            (
                StatusCode::OK,
                Alert::SuccessSimple {
                    message: "Password changed".to_owned(),
                }
                .into_html(),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not change password: {error}");
            Error::from(error).into_alert_response()
        }
    }
}
