//! Permanently delete the user's account.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;
use serde::Deserialize;

use crate::{
    Error, endpoints,
    log_out::{LogOutState, end_session},
    session::Session,
};

/// The text the user must type to confirm the deletion.
pub const DELETE_CONFIRMATION: &str = "DELETE";

#[derive(Clone, Deserialize)]
pub struct DeleteAccountForm {
    pub confirmation: String,
}

/// Delete the account and all of its data with the API, end the session and
/// send the client to the log-in page.
pub async fn delete_account_endpoint(
    State(state): State<LogOutState>,
    Extension(session): Extension<Session>,
    jar: PrivateCookieJar,
    Form(form): Form<DeleteAccountForm>,
) -> Response {
    if form.confirmation.trim() != DELETE_CONFIRMATION {
        return Error::DeletionNotConfirmed.into_alert_response();
    }

    if let Err(error) = state.api.delete_account(&session).await {
        tracing::error!("Could not delete account of {}: {error}", session.username());
        return Error::from(error).into_alert_response();
    }

    tracing::info!("Deleted account of {}", session.username());
    let jar = end_session(&state.ledgers, &session, jar);

    (
        StatusCode::SEE_OTHER,
        HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
        jar,
    )
        .into_response()
}

#[cfg(test)]
mod delete_account_tests {
    use axum::{
        Extension, Form,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use axum_extra::extract::PrivateCookieJar;

    use crate::{
        app_state::create_cookie_key,
        endpoints,
        ledger::{Ledger, LedgerCache},
        log_out::LogOutState,
        profile::delete_account_endpoint,
        session::{DEFAULT_COOKIE_DURATION, Session},
        test_utils::{assert_hx_redirect, fake_api::FakeApi},
    };

    use super::DeleteAccountForm;

    fn state(fake: &FakeApi) -> LogOutState {
        LogOutState {
            cookie_key: create_cookie_key("42"),
            api: fake.client(),
            ledgers: LedgerCache::new(DEFAULT_COOKIE_DURATION),
        }
    }

    async fn delete(state: LogOutState, confirmation: &str) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        delete_account_endpoint(
            State(state),
            Extension(Session::new("token", "alice")),
            jar,
            Form(DeleteAccountForm {
                confirmation: confirmation.to_owned(),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn deletes_account_and_ends_session() {
        let fake = FakeApi::builder()
            .respond("DELETE", "/account", 204, "text/plain", "")
            .start()
            .await;
        let state = state(&fake);
        let session = Session::new("token", "alice");
        state
            .ledgers
            .insert(&session, Ledger::default())
            .unwrap();

        let response = delete(state.clone(), "DELETE").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::LOG_IN_VIEW);
        assert_eq!(state.ledgers.len(), 0);
        assert_eq!(fake.requests()[0].method, "DELETE");
    }

    #[tokio::test]
    async fn requires_typed_confirmation() {
        let fake = FakeApi::builder().start().await;

        let response = delete(state(&fake), "delete").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn api_failure_keeps_session() {
        let fake = FakeApi::builder()
            .status("DELETE", "/account", 500, "")
            .start()
            .await;
        let state = state(&fake);
        let session = Session::new("token", "alice");
        state
            .ledgers
            .insert(&session, Ledger::default())
            .unwrap();

        let response = delete(state.clone(), "DELETE").await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(state.ledgers.contains(&session));
    }
}
