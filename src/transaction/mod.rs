//! Transactions and the entry flow that records them.
//!
//! This module contains:
//! - The `Transaction` model as returned by the finance API
//! - The validation of the entry form, including installment splitting for card purchases
//! - The endpoints for recording and deleting transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod entry;

pub use core::{PaymentMethod, Transaction, TransactionId};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use entry::{EntryError, MAX_INSTALLMENTS, NewTransaction, TransactionEntry, normalize_amount};
