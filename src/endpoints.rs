//! Every route served by the app.
//!
//! Routes with a path parameter, e.g. [DELETE_TRANSACTION], are turned into
//! concrete URIs with [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for managing categories and subcategories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for the user's profile, data export and account deletion.
pub const PROFILE_VIEW: &str = "/account";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/log_out";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for registering a new user.
pub const REGISTER_API: &str = "/api/register";
/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to delete a single transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create a category.
pub const POST_CATEGORY: &str = "/api/categories";
/// The route to rename a category.
pub const PUT_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to create a subcategory.
pub const POST_SUBCATEGORY: &str = "/api/subcategories";
/// The route to rename a subcategory.
pub const PUT_SUBCATEGORY: &str = "/api/subcategories/{subcategory_id}";
/// The route for the subcategory options of the category picked in the entry form.
pub const SUBCATEGORY_OPTIONS: &str = "/api/entry/subcategories";
/// The route to change the user's password.
pub const CHANGE_PASSWORD: &str = "/api/password";
/// The route to download the user's transactions as CSV.
pub const EXPORT_CSV: &str = "/api/export";
/// The route to permanently delete the user's account and data.
pub const DELETE_ACCOUNT: &str = "/api/account/delete";

/// Substitute `id` for the first `{parameter}` in `endpoint_path`.
///
/// Paths without a parameter are returned unchanged. An unterminated
/// parameter, e.g. '/transactions/{id', swallows the rest of the path.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(open) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let rest = match endpoint_path[open..].find('}') {
        Some(close) => &endpoint_path[open + close + 1..],
        None => "",
    };

    format!("{}{id}{rest}", &endpoint_path[..open])
}
