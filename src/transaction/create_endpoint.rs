//! Defines the endpoint for recording a new transaction.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{
    Error, endpoints,
    ledger::{LedgerState, LedgerUpdate, apply_to_cached_ledger, cached_ledger},
    session::Session,
    transaction::TransactionEntry,
};

/// A route handler for the transaction entry form, redirects to the dashboard on success.
///
/// A card purchase split into installments is recorded as one transaction per
/// installment. The transactions the API returns are added to the front of
/// the cached ledger in the order they were received. Nothing is added when
/// the entry is invalid or the API call fails.
pub async fn create_transaction_endpoint(
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
    Form(entry): Form<TransactionEntry>,
) -> Response {
    let ledger = match cached_ledger(&state.ledgers, &state.api, &session).await {
        Ok(ledger) => ledger,
        Err(error) => {
            tracing::error!("Could not load ledger for new transaction: {error}");
            return error.into_alert_response();
        }
    };

    let new_transaction =
        match entry.into_new_transaction(ledger.default_account_id(), ledger.lookup()) {
            Ok(new_transaction) => new_transaction,
            Err(error) => {
                tracing::debug!("Rejected transaction entry: {error}");
                return Error::from(error).into_alert_response();
            }
        };

    let created = match state
        .api
        .create_transaction(&session, &new_transaction)
        .await
    {
        Ok(created) => created,
        Err(error) => {
            tracing::error!("Could not create transaction: {error}");
            return Error::from(error).into_alert_response();
        }
    };

    if new_transaction.is_split() {
        tracing::info!(
            "Recorded {} installments for a {} purchase",
            created.len(),
            new_transaction.payment_method
        );
    } else {
        tracing::info!("Recorded transaction on {}", new_transaction.date);
    }

    if let Err(error) = apply_to_cached_ledger(
        &state.ledgers,
        &session,
        LedgerUpdate::PrependTransactions(created),
    ) {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
