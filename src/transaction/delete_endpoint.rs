//! Defines the endpoint for deleting a transaction.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    ledger::{LedgerState, LedgerUpdate, apply_to_cached_ledger},
    session::Session,
    transaction::TransactionId,
};

/// A route handler for deleting a transaction, responds with an alert.
///
/// The status code has to be 200 OK or htmx will not remove the table row.
/// A transaction the API had already deleted is treated as deleted.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
) -> Response {
    if let Err(error) = state
        .api
        .delete_transaction(&session, transaction_id)
        .await
    {
        tracing::error!("Could not delete transaction {transaction_id}: {error}");
        return Error::from(error).into_alert_response();
    }

    if let Err(error) = apply_to_cached_ledger(
        &state.ledgers,
        &session,
        LedgerUpdate::RemoveTransaction(transaction_id),
    ) {
        return error.into_alert_response();
    }

    Alert::SuccessSimple {
        message: "Transaction removed".to_owned(),
    }
    .into_oob_html()
    .into_response()
}
