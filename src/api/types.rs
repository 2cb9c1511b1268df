//! Request and response payloads for the remote finance API.
//!
//! Each endpoint gets its own type so that a response that does not have the
//! expected shape is rejected when it is decoded instead of deep inside a view.

use serde::{Deserialize, Serialize};

use crate::{
    category::{CategoryId, CategoryKind, SubcategoryId},
    transaction::Transaction,
};

/// The body for `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// The response to a successful log in or registration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

/// The response for `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

/// The body for `POST /auth/change-password`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PasswordChange<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

/// The body for `POST /categories`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub kind: CategoryKind,
}

/// The body for `PUT /categories/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRename<'a> {
    pub name: &'a str,
}

/// The body for `POST /subcategories`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSubcategory<'a> {
    pub category_id: CategoryId,
    pub name: &'a str,
}

/// The body for `PUT /subcategories/{id}`.
///
/// `category_id` moves the subcategory to another category when set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubcategoryUpdate<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

/// The body for `POST /accounts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAccount<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
}

/// The response for `POST /transactions`.
///
/// The API answers with a single transaction for a one-off payment and with
/// every installment, in schedule order, for a card purchase split into
/// installments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CreatedTransactions {
    Many(Vec<Transaction>),
    One(Box<Transaction>),
}

impl CreatedTransactions {
    /// The created transactions in the order the API returned them.
    pub fn into_vec(self) -> Vec<Transaction> {
        match self {
            CreatedTransactions::Many(transactions) => transactions,
            CreatedTransactions::One(transaction) => vec![*transaction],
        }
    }
}

/// The total spent in one category for a month.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryTotal {
    pub category_id: CategoryId,
    pub total: f64,
}

/// The total spent in one subcategory for a month.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubcategoryTotal {
    pub category_id: CategoryId,
    #[serde(default)]
    pub subcategory_id: Option<SubcategoryId>,
    pub total: f64,
}

/// The response for `GET /summary/month`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthSummary {
    /// The month in the form "YYYY-MM".
    pub month: String,
    pub total: f64,
    #[serde(default)]
    pub by_category: Vec<CategoryTotal>,
    #[serde(default)]
    pub by_subcategory: Vec<SubcategoryTotal>,
}

/// The file returned by `GET /export/csv`.
///
/// The body is kept as bytes because the API picks the CSV encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    /// The `Content-Type` the API sent, if any.
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}
