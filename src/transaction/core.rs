//! Defines the core data models for transactions.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::AccountId,
    category::{CategoryId, SubcategoryId},
};

/// Identifier the remote API assigns to a transaction.
pub type TransactionId = i64;

// Dates travel as plain ISO calendar dates, e.g. "2024-05-01".
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

pub(crate) use iso_date::{deserialize as deserialize_date, serialize as serialize_date};

/// How a transaction was paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    /// Instant bank transfer.
    Pix,
    /// Credit card, the only method that can be split into installments.
    Card,
    /// Meal voucher.
    Vr,
}

impl PaymentMethod {
    /// Every payment method in the order they are offered in forms.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Pix,
        PaymentMethod::Card,
        PaymentMethod::Vr,
    ];

    /// The value used in forms, query strings and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Card => "card",
            PaymentMethod::Vr => "vr",
        }
    }

    /// The label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::Card => "Card",
            PaymentMethod::Vr => "Meal voucher",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cash" => Ok(PaymentMethod::Cash),
            "pix" => Ok(PaymentMethod::Pix),
            "card" => Ok(PaymentMethod::Card),
            "vr" => Ok(PaymentMethod::Vr),
            other => Err(Error::InvalidPaymentMethod(other.to_owned())),
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expense or income recorded by the remote API.
///
/// A card purchase split into installments is stored as one transaction per
/// installment, each carrying its position (`installment_index`, starting at
/// one) and the total number of installments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub subcategory_id: Option<SubcategoryId>,
    /// Negative for money spent, see [crate::transaction::normalize_amount].
    pub amount: f64,
    #[serde(serialize_with = "serialize_date", deserialize_with = "deserialize_date")]
    pub date: Date,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub installments: Option<u32>,
    #[serde(default)]
    pub installment_index: Option<u32>,
}

impl Transaction {
    /// Whether this row is one installment of a split card purchase.
    pub fn is_installment(&self) -> bool {
        self.payment_method == Some(PaymentMethod::Card) && self.installments.unwrap_or(1) > 1
    }

    /// Describe how the transaction was paid, e.g. "PIX" or "Card 2/3".
    ///
    /// Transactions without a payment method were recorded before payment
    /// methods existed and are shown as cash.
    pub fn payment_label(&self) -> String {
        let method = self.payment_method.unwrap_or_default();

        if self.is_installment() {
            format!(
                "{} {}/{}",
                method.label(),
                self.installment_index.unwrap_or(1),
                self.installments.unwrap_or(1)
            )
        } else {
            method.label().to_owned()
        }
    }
}
