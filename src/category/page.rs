//! The page for managing categories and subcategories.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    alert::ALERT_CONTAINER_TARGET,
    category::{Category, CategoryKind, CategoryLookup, Subcategory},
    endpoints,
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base,
    },
    ledger::{LedgerState, refresh_ledger},
    navigation::NavBar,
    session::Session,
};

const INLINE_INPUT_STYLE: &str = "flex-1 p-1.5 rounded text-sm text-gray-900 \
    dark:text-white bg-gray-50 dark:bg-gray-700 border border-gray-300 \
    dark:border-gray-600";

const INLINE_BUTTON_STYLE: &str = "px-3 py-1.5 text-sm text-white bg-blue-500 \
    hover:bg-blue-600 dark:bg-blue-600 dark:hover:bg-blue-700 rounded";

/// Render the categories page with a fresh copy of the user's categories.
pub async fn get_categories_page(
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    let ledger = refresh_ledger(&state.ledgers, &state.api, &session)
        .await
        .inspect_err(|error| tracing::error!("Could not load categories: {error}"))?;

    Ok(categories_view(ledger.categories(), ledger.lookup()).into_response())
}

fn categories_view(categories: &[Category], lookup: &CategoryLookup) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-6"
            {
                h1 class="text-xl font-bold" { "Categories" }

                section class=(CARD_STYLE)
                {
                    h2 class="mb-4 text-lg font-semibold" { "New category" }
                    (new_category_form())
                }

                @if !categories.is_empty() {
                    section class=(CARD_STYLE)
                    {
                        h2 class="mb-4 text-lg font-semibold" { "New subcategory" }
                        (new_subcategory_form(categories))
                    }
                }

                section id="category-list" class="space-y-4"
                {
                    @for category in categories {
                        (category_card(category, lookup.subcategories_of(category.id), categories))
                    }

                    @if categories.is_empty() {
                        p class="text-center text-gray-500 dark:text-gray-400"
                        {
                            "No categories yet. Create one above to start recording transactions."
                        }
                    }
                }
            }
        }
    );

    base("Categories", &[], &content)
}

fn new_category_form() -> Markup {
    html!(
        form
            id="new-category-form"
            hx-post=(endpoints::POST_CATEGORY)
            hx-target-error=(ALERT_CONTAINER_TARGET)
            class="space-y-4"
        {
            div
            {
                label for="category-name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="category-name"
                    type="text"
                    name="name"
                    placeholder="Groceries"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="category-kind" class=(FORM_LABEL_STYLE) { "Kind" }

                select id="category-kind" name="kind" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for kind in [CategoryKind::Expense, CategoryKind::Income] {
                        option value=(kind.as_str()) { (kind.label()) }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Category" }
        }
    )
}

fn new_subcategory_form(categories: &[Category]) -> Markup {
    html!(
        form
            id="new-subcategory-form"
            hx-post=(endpoints::POST_SUBCATEGORY)
            hx-target-error=(ALERT_CONTAINER_TARGET)
            class="space-y-4"
        {
            div
            {
                label for="subcategory-category" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    id="subcategory-category"
                    name="category_id"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for category in categories {
                        option value=(category.id) { (category.name) }
                    }
                }
            }

            div
            {
                label for="subcategory-name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="subcategory-name"
                    type="text"
                    name="name"
                    placeholder="Vegetables"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Subcategory" }
        }
    )
}

fn category_card(
    category: &Category,
    subcategories: &[Subcategory],
    categories: &[Category],
) -> Markup {
    let rename_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category.id);

    html!(
        article class=(CARD_STYLE) data-category-id=(category.id)
        {
            div class="flex items-center gap-2"
            {
                form
                    hx-put=(rename_endpoint)
                    hx-target-error=(ALERT_CONTAINER_TARGET)
                    class="flex flex-1 gap-2"
                {
                    input
                        type="text"
                        name="name"
                        value=(category.name)
                        aria-label="Category name"
                        required
                        class=(INLINE_INPUT_STYLE);

                    button type="submit" class=(INLINE_BUTTON_STYLE) { "Rename" }
                }

                span class=(BADGE_STYLE) { (category.kind.label()) }
            }

            @if subcategories.is_empty() {
                p class="mt-3 text-sm text-gray-500 dark:text-gray-400" { "No subcategories" }
            } @else {
                ul class="mt-3 ml-4 space-y-2"
                {
                    @for subcategory in subcategories {
                        li { (subcategory_row(subcategory, categories)) }
                    }
                }
            }
        }
    )
}

fn subcategory_row(subcategory: &Subcategory, categories: &[Category]) -> Markup {
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_SUBCATEGORY, subcategory.id);

    html!(
        form
            hx-put=(update_endpoint)
            hx-target-error=(ALERT_CONTAINER_TARGET)
            class="flex gap-2"
            data-subcategory-id=(subcategory.id)
        {
            input
                type="text"
                name="name"
                value=(subcategory.name)
                aria-label="Subcategory name"
                required
                class=(INLINE_INPUT_STYLE);

            select name="category_id" aria-label="Parent category" class=(INLINE_INPUT_STYLE)
            {
                @for category in categories {
                    option
                        value=(category.id)
                        selected[category.id == subcategory.category_id]
                    {
                        (category.name)
                    }
                }
            }

            button type="submit" class=(INLINE_BUTTON_STYLE) { "Save" }
        }
    )
}
