//! Dashboard module
//!
//! The landing page of a logged in user. It shows the transactions that match
//! the filters in the query string, a chart of their totals per category and
//! the form for recording a new transaction.

mod aggregation;
mod charts;
mod filters;
mod handlers;
mod tables;

pub use handlers::{get_dashboard_page, get_subcategory_options};
pub(crate) use filters::YearMonth;
