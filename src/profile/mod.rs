//! The account settings of the logged in user.
//!
//! This module contains:
//! - The profile page with the username and the account actions
//! - The endpoint for changing the password
//! - The CSV export of the user's transactions
//! - The endpoint that permanently deletes the account and ends the session

mod delete;
mod export;
mod page;
mod password;

pub use delete::delete_account_endpoint;
pub use export::export_csv_endpoint;
pub use page::get_profile_page;
pub use password::change_password_endpoint;
