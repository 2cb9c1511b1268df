//! Turns the values a user typed into the entry form into a creation request.
//!
//! All validation happens here, before the remote API is called. A card
//! purchase split into installments is still a single request: the API
//! expands it into one transaction per installment.

use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{
    account::AccountId,
    category::{CategoryId, CategoryLookup, SubcategoryId},
    transaction::{PaymentMethod, core::serialize_date},
};

/// The largest number of installments a card purchase can be split into.
pub const MAX_INSTALLMENTS: u32 = 12;

/// Why a transaction entry was rejected.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EntryError {
    /// The user has no account to record the transaction in.
    #[error("there is no account to record the transaction in")]
    MissingAccount,

    #[error("a category must be chosen")]
    MissingCategory,

    /// The amount was not a finite number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    #[error("\"{0}\" is not a valid date, use the format YYYY-MM-DD")]
    InvalidDate(String),

    #[error("\"{0}\" is not a valid payment method")]
    InvalidPaymentMethod(String),

    #[error("installments must be a whole number from 1 to {MAX_INSTALLMENTS}, got \"{0}\"")]
    InstallmentsOutOfRange(String),

    /// The subcategory is known but belongs to another category.
    #[error("subcategory {subcategory_id} does not belong to category {category_id}")]
    SubcategoryMismatch {
        subcategory_id: SubcategoryId,
        category_id: CategoryId,
    },
}

/// Parse a user-entered amount and apply the expense sign convention.
///
/// Surrounding whitespace is ignored and a decimal comma is accepted in place
/// of a decimal point, so "35,90" and "35.90" are the same amount. The result
/// is always zero or negative.
///
/// # Errors
///
/// Returns [EntryError::InvalidAmount] if `raw_amount` is not a finite number.
pub fn normalize_amount(raw_amount: &str) -> Result<f64, EntryError> {
    let normalized = raw_amount.trim().replacen(',', ".", 1);

    match normalized.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(-amount.abs()),
        _ => Err(EntryError::InvalidAmount(raw_amount.to_owned())),
    }
}

/// The body for `POST /transactions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub category_id: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<SubcategoryId>,
    pub amount: f64,
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
    /// How many rows the API should create, always 1 unless paying by card.
    pub installments: u32,
}

impl NewTransaction {
    /// Whether the API will answer with more than one transaction.
    pub fn is_split(&self) -> bool {
        self.installments > 1
    }
}

/// The raw values submitted from the transaction entry form.
///
/// Everything is kept as text so that each field can be validated with a
/// specific error message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionEntry {
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    pub amount: String,
    pub date: String,
    pub note: Option<String>,
    pub payment_method: Option<String>,
    pub installments: Option<String>,
}

impl TransactionEntry {
    /// Validate the entry and build the creation request for it.
    ///
    /// `account_id` is the account the transaction is recorded in, `None` if
    /// the user has no accounts. `lookup` is used to check that a chosen
    /// subcategory belongs to the chosen category; subcategories the lookup
    /// does not know about are passed on for the API to validate.
    ///
    /// For every payment method other than card, installments are ignored and
    /// the request asks for a single transaction.
    ///
    /// # Errors
    ///
    /// Returns an [EntryError] describing the first invalid field.
    pub fn into_new_transaction(
        self,
        account_id: Option<AccountId>,
        lookup: &CategoryLookup,
    ) -> Result<NewTransaction, EntryError> {
        let account_id = account_id.ok_or(EntryError::MissingAccount)?;

        let category_id = parse_optional_id(self.category_id.as_deref())
            .ok_or(EntryError::MissingCategory)?;

        let subcategory_id = parse_optional_id(self.subcategory_id.as_deref());

        if let Some(subcategory) = subcategory_id.and_then(|id| lookup.subcategory(id)) {
            if subcategory.category_id != category_id {
                return Err(EntryError::SubcategoryMismatch {
                    subcategory_id: subcategory.id,
                    category_id,
                });
            }
        }

        let amount = normalize_amount(&self.amount)?;
        let date = parse_date(&self.date)?;

        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            None | Some("") => PaymentMethod::default(),
            Some(raw) => raw
                .parse()
                .map_err(|_| EntryError::InvalidPaymentMethod(raw.to_owned()))?,
        };

        let installments = if payment_method == PaymentMethod::Card {
            parse_installments(self.installments.as_deref())?
        } else {
            1
        };

        let note = self
            .note
            .map(|note| note.trim().to_owned())
            .filter(|note| !note.is_empty());

        Ok(NewTransaction {
            account_id,
            category_id,
            subcategory_id,
            amount,
            date,
            note,
            payment_method,
            installments,
        })
    }
}

fn parse_optional_id(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| raw.parse().ok())
}

fn parse_date(raw: &str) -> Result<Date, EntryError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| EntryError::InvalidDate(raw.to_owned()))
}

fn parse_installments(raw: Option<&str>) -> Result<u32, EntryError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(1),
        Some(raw) => raw,
    };

    match raw.parse::<u32>() {
        Ok(installments) if (1..=MAX_INSTALLMENTS).contains(&installments) => Ok(installments),
        _ => Err(EntryError::InstallmentsOutOfRange(raw.to_owned())),
    }
}

#[cfg(test)]
mod normalize_amount_tests {
    use crate::transaction::{EntryError, normalize_amount};

    #[test]
    fn accepts_decimal_comma() {
        assert_eq!(normalize_amount("35,90"), Ok(-35.90));
    }

    #[test]
    fn accepts_decimal_point_and_whitespace() {
        assert_eq!(normalize_amount(" 12.5 "), Ok(-12.5));
    }

    #[test]
    fn negative_input_stays_negative() {
        assert_eq!(normalize_amount("-8"), Ok(-8.0));
    }

    #[test]
    fn rejects_text() {
        assert_eq!(
            normalize_amount("abc"),
            Err(EntryError::InvalidAmount("abc".to_owned()))
        );
    }

    #[test]
    fn rejects_empty_and_non_finite() {
        assert!(normalize_amount("").is_err());
        assert!(normalize_amount("inf").is_err());
        assert!(normalize_amount("NaN").is_err());
    }
}
