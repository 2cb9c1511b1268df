//! The HTTP client for the remote finance API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::{
    account::Account,
    api::{
        ApiError,
        types::{
            AuthToken, CategoryRename, CreatedTransactions, Credentials, CsvExport, CurrentUser,
            MonthSummary, NewAccount, NewCategory, NewSubcategory, PasswordChange,
            SubcategoryUpdate,
        },
    },
    category::{Category, CategoryId, Subcategory, SubcategoryId},
    session::Session,
    transaction::{NewTransaction, Transaction, TransactionId},
};

/// A typed client for the remote finance API.
///
/// Every authenticated call takes the [Session] of the user it is made on
/// behalf of and sends its token as a bearer token. Calls are never retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the API served at `base_url`, e.g. "http://localhost:8000".
    ///
    /// # Errors
    ///
    /// Returns [ApiError::Request] if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ApiError::Request(error.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send `request` and return the response if its status is a success.
    async fn send_checked(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|error| ApiError::Request(error.to_string()))?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_owned()
            } else {
                text
            };

            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Send `request` and return the body of a successful response.
    async fn send_raw(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        self.send_checked(request)
            .await?
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|error| ApiError::Request(error.to_string()))
    }

    /// Send `request` and decode the JSON body of a successful response.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send_raw(request).await?;

        serde_json::from_slice(&body).map_err(|error| ApiError::InvalidResponse(error.to_string()))
    }

    fn get(&self, session: &Session, path: &str) -> RequestBuilder {
        self.http.get(self.url(path)).bearer_auth(session.token())
    }

    fn post(&self, session: &Session, path: &str) -> RequestBuilder {
        self.http.post(self.url(path)).bearer_auth(session.token())
    }

    fn put(&self, session: &Session, path: &str) -> RequestBuilder {
        self.http.put(self.url(path)).bearer_auth(session.token())
    }

    fn delete(&self, session: &Session, path: &str) -> RequestBuilder {
        self.http.delete(self.url(path)).bearer_auth(session.token())
    }

    // ============================================================================
    // AUTHENTICATION
    // ============================================================================

    /// Create a user and return their API token.
    pub async fn register(&self, credentials: &Credentials<'_>) -> Result<AuthToken, ApiError> {
        self.send(self.http.post(self.url("/auth/register")).json(credentials))
            .await
    }

    /// Exchange a username and password for an API token.
    pub async fn log_in(&self, credentials: &Credentials<'_>) -> Result<AuthToken, ApiError> {
        self.send(self.http.post(self.url("/auth/login")).json(credentials))
            .await
    }

    /// Revoke the session's token.
    pub async fn log_out(&self, session: &Session) -> Result<(), ApiError> {
        self.send_raw(self.post(session, "/auth/logout"))
            .await
            .map(|_| ())
    }

    /// The user the session belongs to.
    pub async fn current_user(&self, session: &Session) -> Result<CurrentUser, ApiError> {
        self.send(self.get(session, "/auth/me")).await
    }

    /// Replace the user's password, the API checks the old one.
    pub async fn change_password(
        &self,
        session: &Session,
        change: &PasswordChange<'_>,
    ) -> Result<(), ApiError> {
        self.send_raw(self.post(session, "/auth/change-password").json(change))
            .await
            .map(|_| ())
    }

    /// Permanently delete the user and all of their data.
    pub async fn delete_account(&self, session: &Session) -> Result<(), ApiError> {
        self.send_raw(self.delete(session, "/account"))
            .await
            .map(|_| ())
    }

    // ============================================================================
    // CATEGORIES
    // ============================================================================

    /// List the user's categories.
    pub async fn list_categories(&self, session: &Session) -> Result<Vec<Category>, ApiError> {
        self.send(self.get(session, "/categories")).await
    }

    /// Create a category and return it as the API stored it.
    pub async fn create_category(
        &self,
        session: &Session,
        category: &NewCategory<'_>,
    ) -> Result<Category, ApiError> {
        self.send(self.post(session, "/categories").json(category))
            .await
    }

    /// Rename a category.
    pub async fn rename_category(
        &self,
        session: &Session,
        category_id: CategoryId,
        rename: &CategoryRename<'_>,
    ) -> Result<Category, ApiError> {
        self.send(
            self.put(session, &format!("/categories/{category_id}"))
                .json(rename),
        )
        .await
    }

    /// List the subcategories of every category.
    pub async fn list_subcategories(&self, session: &Session) -> Result<Vec<Subcategory>, ApiError> {
        self.send(self.get(session, "/subcategories")).await
    }

    /// Create a subcategory under an existing category.
    pub async fn create_subcategory(
        &self,
        session: &Session,
        subcategory: &NewSubcategory<'_>,
    ) -> Result<Subcategory, ApiError> {
        self.send(self.post(session, "/subcategories").json(subcategory))
            .await
    }

    /// Rename a subcategory, or move it to another category.
    pub async fn update_subcategory(
        &self,
        session: &Session,
        subcategory_id: SubcategoryId,
        update: &SubcategoryUpdate<'_>,
    ) -> Result<Subcategory, ApiError> {
        self.send(
            self.put(session, &format!("/subcategories/{subcategory_id}"))
                .json(update),
        )
        .await
    }

    // ============================================================================
    // ACCOUNTS
    // ============================================================================

    /// List the user's accounts.
    pub async fn list_accounts(&self, session: &Session) -> Result<Vec<Account>, ApiError> {
        self.send(self.get(session, "/accounts")).await
    }

    /// Create an account.
    pub async fn create_account(
        &self,
        session: &Session,
        account: &NewAccount<'_>,
    ) -> Result<Account, ApiError> {
        self.send(self.post(session, "/accounts").json(account))
            .await
    }

    // ============================================================================
    // TRANSACTIONS
    // ============================================================================

    /// List all of the user's transactions.
    pub async fn list_transactions(
        &self,
        session: &Session,
    ) -> Result<Vec<Transaction>, ApiError> {
        self.send(self.get(session, "/transactions")).await
    }

    /// Create a transaction, or one transaction per installment for a card
    /// purchase split into installments.
    ///
    /// The returned transactions keep the order the API sent them in.
    pub async fn create_transaction(
        &self,
        session: &Session,
        transaction: &NewTransaction,
    ) -> Result<Vec<Transaction>, ApiError> {
        self.send::<CreatedTransactions>(self.post(session, "/transactions").json(transaction))
            .await
            .map(CreatedTransactions::into_vec)
    }

    /// Delete a transaction.
    ///
    /// A transaction the API no longer knows about counts as deleted.
    pub async fn delete_transaction(
        &self,
        session: &Session,
        transaction_id: TransactionId,
    ) -> Result<(), ApiError> {
        match self
            .send_raw(self.delete(session, &format!("/transactions/{transaction_id}")))
            .await
        {
            Ok(_) => Ok(()),
            Err(ApiError::Status { status: 404, .. }) => {
                tracing::debug!("transaction {transaction_id} was already deleted");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    // ============================================================================
    // REPORTS
    // ============================================================================

    /// Get the totals for `month`, given in the form "YYYY-MM".
    pub async fn month_summary(
        &self,
        session: &Session,
        month: &str,
    ) -> Result<MonthSummary, ApiError> {
        self.send(
            self.get(session, "/summary/month")
                .query(&[("month", month)]),
        )
        .await
    }

    /// Export transactions as CSV, optionally only those in `month` ("YYYY-MM").
    pub async fn export_csv(
        &self,
        session: &Session,
        month: Option<&str>,
    ) -> Result<CsvExport, ApiError> {
        let request = self.get(session, "/export/csv");
        let request = match month {
            Some(month) => request.query(&[("month", month)]),
            None => request,
        };

        let response = self.send_checked(request).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|error| ApiError::Request(error.to_string()))?
            .to_vec();

        Ok(CsvExport { content_type, body })
    }
}
