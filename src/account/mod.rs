//! Accounts that transactions are recorded against.

mod core;

pub use core::{
    Account, AccountId, DEFAULT_ACCOUNT_KIND, DEFAULT_ACCOUNT_NAME, ensure_default_account,
};
