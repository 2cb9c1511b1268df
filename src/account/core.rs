//! The account model and the default account every user needs.

use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiClient, ApiError, types::NewAccount},
    session::Session,
};

pub type AccountId = i64;

/// The name of the account created for users who have none.
pub const DEFAULT_ACCOUNT_NAME: &str = "Personal";
/// The type of the account created for users who have none.
pub const DEFAULT_ACCOUNT_KIND: &str = "other";

/// Where money is held, e.g. a bank account or a wallet.
///
/// Every transaction is recorded against an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// A free-form account type such as "checking" or "other".
    #[serde(rename = "type")]
    pub kind: String,
}

/// Make sure the user has at least one account.
///
/// Returns `accounts` unchanged if it is not empty. Otherwise the default
/// account is created through the API and returned as the only account.
///
/// # Errors
///
/// Returns an [ApiError] if the default account could not be created.
pub async fn ensure_default_account(
    api: &ApiClient,
    session: &Session,
    accounts: Vec<Account>,
) -> Result<Vec<Account>, ApiError> {
    if !accounts.is_empty() {
        return Ok(accounts);
    }

    let account = api
        .create_account(
            session,
            &NewAccount {
                name: DEFAULT_ACCOUNT_NAME,
                kind: DEFAULT_ACCOUNT_KIND,
            },
        )
        .await
        .inspect_err(|error| tracing::error!("Could not create the default account: {error}"))?;

    tracing::info!(
        "Created default account {} for {}",
        account.id,
        session.username()
    );

    Ok(vec![account])
}
