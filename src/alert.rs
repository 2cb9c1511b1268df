//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered into the `#alert-container` element that every page
//! carries (see [crate::html::base]). Forms target it with `hx-target-error`
//! so that 4xx and 5xx alert fragments replace its contents.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// The id of the element alerts are rendered into.
pub const ALERT_CONTAINER_ID: &str = "alert-container";

/// The CSS selector for [ALERT_CONTAINER_ID], for use in `hx-target` attributes.
pub const ALERT_CONTAINER_TARGET: &str = "#alert-container";

/// A message to show the user after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    SuccessSimple { message: String },
    Error { message: String, details: String },
    ErrorSimple { message: String },
}

impl Alert {
    fn is_error(&self) -> bool {
        matches!(self, Alert::Error { .. } | Alert::ErrorSimple { .. })
    }

    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let container_style = if self.is_error() {
            "flex items-start p-4 mb-4 text-sm text-red-800 border border-red-300 \
            rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
        } else {
            "flex items-start p-4 mb-4 text-sm text-green-800 border border-green-300 \
            rounded-lg bg-green-50 dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
        };

        let (message, details) = match self {
            Alert::Error { message, details } => (message, Some(details)),
            Alert::SuccessSimple { message } | Alert::ErrorSimple { message } => (message, None),
        };

        html! {
            div class=(container_style) role="alert" data-alert
            {
                div class="flex-1"
                {
                    p class="font-medium" { (message) }

                    @if let Some(details) = details.filter(|details| !details.is_empty())
                    {
                        p class="mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Close"
                    class="ms-3 -my-1.5 p-1.5 rounded-lg hover:opacity-75"
                    onclick="this.closest('[data-alert]').remove()"
                {
                    "×"
                }
            }
        }
    }
}

impl Alert {
    /// Render the alert so that htmx swaps it into the alert container out of
    /// band, whatever the target of the request is.
    pub fn into_oob_html(self) -> Markup {
        html! {
            div hx-swap-oob={ "innerHTML:" (ALERT_CONTAINER_TARGET) }
            {
                (self.into_html())
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
