//! The profile page.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    ApiError, Error,
    alert::ALERT_CONTAINER_TARGET,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, password_input,
    },
    ledger::LedgerState,
    navigation::NavBar,
    register::MIN_PASSWORD_LENGTH,
    session::Session,
};

const BUTTON_DANGER_STYLE: &str = "w-full px-4 py-2 bg-red-600 hover:bg-red-700 \
    dark:bg-red-700 dark:hover:bg-red-800 text-white rounded";

/// Display the profile page.
///
/// The username is taken from the API, falling back to the name the user
/// logged in with if the API does not return one.
pub async fn get_profile_page(
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let username = match state.api.current_user(&session).await {
        Ok(user) => user.username.unwrap_or_else(|| session.username().to_owned()),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(error) => {
            tracing::warn!("Could not get the current user: {error}");
            session.username().to_owned()
        }
    };

    Ok(profile_view(&username).into_response())
}

fn profile_view(username: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-xl space-y-6"
            {
                section class=(CARD_STYLE)
                {
                    h1 class="text-xl font-bold" { "Account" }

                    p class="mt-2"
                    {
                        "Logged in as "
                        span id="username" class="font-semibold" { (username) }
                    }

                    a href=(endpoints::LOG_OUT) class={"block mt-4 text-center " (BUTTON_SECONDARY_STYLE)}
                    {
                        "Log out"
                    }
                }

                section class=(CARD_STYLE)
                {
                    h2 class="mb-4 text-lg font-semibold" { "Export transactions" }
                    (export_form())
                }

                section class=(CARD_STYLE)
                {
                    h2 class="mb-4 text-lg font-semibold" { "Change password" }
                    (change_password_form())
                }

                section class=(CARD_STYLE)
                {
                    h2 class="mb-2 text-lg font-semibold text-red-600 dark:text-red-500"
                    {
                        "Delete account"
                    }
                    (delete_account_form())
                }
            }
        }
    );

    base("Account", &[], &content)
}

fn export_form() -> Markup {
    html!(
        form id="export-form" method="get" action=(endpoints::EXPORT_CSV) class="space-y-4"
        {
            div
            {
                label for="export-month" class=(FORM_LABEL_STYLE) { "Month (leave empty for all)" }

                input
                    id="export-month"
                    type="month"
                    name="month"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Download CSV" }
        }
    )
}

fn change_password_form() -> Markup {
    html!(
        form
            id="change-password-form"
            hx-post=(endpoints::CHANGE_PASSWORD)
            hx-target=(ALERT_CONTAINER_TARGET)
            hx-target-error=(ALERT_CONTAINER_TARGET)
            class="space-y-4"
        {
            (password_input("old_password", "Current password", 0))
            (password_input("new_password", "New password", MIN_PASSWORD_LENGTH))
            (password_input("confirm_password", "Confirm new password", MIN_PASSWORD_LENGTH))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Change Password" }
        }
    )
}

fn delete_account_form() -> Markup {
    html!(
        form
            id="delete-account-form"
            hx-post=(endpoints::DELETE_ACCOUNT)
            hx-target-error=(ALERT_CONTAINER_TARGET)
            hx-confirm="This permanently deletes your account and all of your data. Continue?"
            class="space-y-4"
        {
            p class="text-sm text-gray-600 dark:text-gray-400"
            {
                "All of your categories, accounts and transactions will be deleted. \
                Type DELETE to confirm."
            }

            input
                type="text"
                name="confirmation"
                aria-label="Confirmation"
                placeholder="DELETE"
                autocomplete="off"
                required
                class=(FORM_TEXT_INPUT_STYLE);

            button type="submit" class=(BUTTON_DANGER_STYLE) { "Delete Account" }
        }
    )
}
