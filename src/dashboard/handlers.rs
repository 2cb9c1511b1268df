//! Dashboard HTTP handler and view rendering.
//!
//! This module contains:
//! - The route handler for displaying the dashboard
//! - The htmx handler that narrows the entry form's subcategories to the picked category
//! - HTML view functions for the filter bar, the entry form and the month summary
//! - The state used by the handler

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    alert::ALERT_CONTAINER_TARGET,
    api::{ApiClient, types::MonthSummary},
    category::{Category, CategoryId, CategoryKind, CategoryLookup, Subcategory},
    dashboard::{
        aggregation::DashboardView,
        charts::{DashboardChart, chart_head_elements, chart_view},
        filters::{DashboardFilters, DashboardQuery},
        tables::transactions_table,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, format_currency, link,
    },
    ledger::{Ledger, LedgerCache, cached_ledger, refresh_ledger},
    navigation::NavBar,
    session::Session,
    timezone::get_local_date,
    transaction::{MAX_INSTALLMENTS, PaymentMethod},
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub api: ApiClient,
    pub ledgers: LedgerCache,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api: state.api.clone(),
            ledgers: state.ledgers.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the transactions that match the filters in the query string, the
/// chart of their category totals and the form for recording a transaction.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(session): Extension<Session>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let ledger = refresh_ledger(&state.ledgers, &state.api, &session)
        .await
        .inspect_err(|error| tracing::error!("Could not load dashboard data: {error}"))?;

    let filters = DashboardFilters::from_query(query, today);

    let summary = match filters.month {
        Some(month) => state
            .api
            .month_summary(&session, &month.to_string())
            .await
            .inspect_err(|error| tracing::warn!("Could not get summary for {month}: {error}"))
            .ok(),
        None => None,
    };

    Ok(dashboard_view(&ledger, &filters, summary.as_ref(), today).into_response())
}

fn dashboard_view(
    ledger: &Ledger,
    filters: &DashboardFilters,
    summary: Option<&MonthSummary>,
    today: Date,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let lookup = ledger.lookup();
    let view = DashboardView::new(ledger.transactions(), lookup, filters);

    let subtitle = match filters.month {
        Some(month) => month.to_string(),
        None => "All time".to_owned(),
    };
    let chart = (!view.totals.is_empty())
        .then(|| DashboardChart::category_spending(&view.totals, &subtitle));
    let head_elements = chart.as_ref().map(chart_head_elements);

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-6"
            {
                section class=(CARD_STYLE)
                {
                    h2 class="mb-4 text-lg font-semibold" { "New transaction" }
                    (entry_form(ledger.categories(), ledger.subcategories(), today))
                }

                section class=(CARD_STYLE)
                {
                    (filter_form(filters, ledger.categories(), ledger.subcategories()))
                }

                div class="grid grid-cols-1 xl:grid-cols-3 gap-4"
                {
                    section id="charts" class={(CARD_STYLE) " xl:col-span-2"}
                    {
                        @if let Some(chart) = &chart {
                            (chart_view(chart))
                        } @else {
                            p class="text-center text-gray-500 dark:text-gray-400"
                            {
                                "Nothing to chart for the current filters."
                            }
                        }
                    }

                    (summary_card(&subtitle, view.total(), summary, lookup))
                }

                (transactions_table(&view.transactions, lookup))
            }
        }
    );

    match head_elements {
        Some(head_elements) => base("Dashboard", &head_elements, &content),
        None => base("Dashboard", &[], &content),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubcategoryOptionsQuery {
    /// Left as text so that an empty value selects no category instead of
    /// failing to parse.
    pub category_id: Option<String>,
}

/// The `<option>`s for the entry form's subcategory select, limited to the
/// subcategories of the category in the query string.
///
/// A missing or unknown category leaves only the "None" option.
pub async fn get_subcategory_options(
    State(state): State<DashboardState>,
    Extension(session): Extension<Session>,
    Query(query): Query<SubcategoryOptionsQuery>,
) -> Response {
    let category_id = query
        .category_id
        .as_deref()
        .and_then(|id| id.trim().parse::<CategoryId>().ok());

    match cached_ledger(&state.ledgers, &state.api, &session).await {
        Ok(ledger) => subcategory_options(ledger.subcategories(), category_id).into_response(),
        Err(error) => {
            tracing::error!("Could not load subcategories: {error}");
            error.into_alert_response()
        }
    }
}

fn subcategory_options(subcategories: &[Subcategory], category_id: Option<CategoryId>) -> Markup {
    let matching = subcategories
        .iter()
        .filter(|subcategory| Some(subcategory.category_id) == category_id);

    html!(
        option value="" { "None" }

        @for subcategory in matching {
            option value=(subcategory.id) { (subcategory.name) }
        }
    )
}

fn entry_form(categories: &[Category], subcategories: &[Subcategory], today: Date) -> Markup {
    if categories.is_empty() {
        let categories_link = link(endpoints::CATEGORIES_VIEW, "create a category");

        return html!(
            p id="entry-form-empty" class="text-gray-600 dark:text-gray-400"
            {
                "Before recording transactions you need to " (categories_link) "."
            }
        );
    }

    html!(
        form
            id="entry-form"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error=(ALERT_CONTAINER_TARGET)
            class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-4"
        {
            div
            {
                label for="entry-category" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    id="entry-category"
                    name="category_id"
                    required
                    hx-get=(endpoints::SUBCATEGORY_OPTIONS)
                    hx-trigger="change"
                    hx-target="#entry-subcategory"
                    hx-target-error=(ALERT_CONTAINER_TARGET)
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for (index, category) in categories.iter().enumerate() {
                        option value=(category.id) selected[index == 0] { (category.name) }
                    }
                }
            }

            div
            {
                label for="entry-subcategory" class=(FORM_LABEL_STYLE) { "Subcategory" }

                select id="entry-subcategory" name="subcategory_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    (subcategory_options(subcategories, categories.first().map(|category| category.id)))
                }
            }

            div
            {
                label for="entry-amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="entry-amount"
                    type="text"
                    name="amount"
                    inputmode="decimal"
                    placeholder="0.00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="entry-date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    id="entry-date"
                    type="date"
                    name="date"
                    value=(today.to_string())
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="entry-payment-method" class=(FORM_LABEL_STYLE) { "Payment method" }

                select id="entry-payment-method" name="payment_method" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for method in PaymentMethod::ALL {
                        option
                            value=(method.as_str())
                            selected[method == PaymentMethod::default()]
                        {
                            (method.label())
                        }
                    }
                }
            }

            div
            {
                label for="entry-installments" class=(FORM_LABEL_STYLE) { "Installments (card only)" }

                select id="entry-installments" name="installments" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for count in 1..=MAX_INSTALLMENTS {
                        option value=(count) selected[count == 1] { (count) "x" }
                    }
                }
            }

            div class="md:col-span-2"
            {
                label for="entry-note" class=(FORM_LABEL_STYLE) { "Note" }

                input
                    id="entry-note"
                    type="text"
                    name="note"
                    placeholder="Optional"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="md:col-span-2 lg:col-span-4"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Transaction" }
            }
        }
    )
}

fn filter_form(
    filters: &DashboardFilters,
    categories: &[Category],
    subcategories: &[Subcategory],
) -> Markup {
    let month = filters.month.map(|month| month.to_string());
    let day = filters.day.map(|day| day.to_string());
    // Only offer the subcategories of the chosen category once one is chosen.
    let subcategories = subcategories.iter().filter(|subcategory| {
        filters
            .category_id
            .is_none_or(|category_id| subcategory.category_id == category_id)
    });

    html!(
        form
            id="filter-form"
            method="get"
            action=(endpoints::DASHBOARD_VIEW)
            class="grid grid-cols-2 md:grid-cols-3 lg:grid-cols-7 gap-4 items-end"
        {
            div
            {
                label for="filter-month" class=(FORM_LABEL_STYLE) { "Month" }

                input
                    id="filter-month"
                    type="month"
                    name="month"
                    value=[month]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="filter-day" class=(FORM_LABEL_STYLE) { "Day" }

                input
                    id="filter-day"
                    type="date"
                    name="day"
                    value=[day]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="filter-category" class=(FORM_LABEL_STYLE) { "Category" }

                select id="filter-category" name="category_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }

                    @for category in categories {
                        option
                            value=(category.id)
                            selected[filters.category_id == Some(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            div
            {
                label for="filter-subcategory" class=(FORM_LABEL_STYLE) { "Subcategory" }

                select id="filter-subcategory" name="subcategory_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }

                    @for subcategory in subcategories {
                        option
                            value=(subcategory.id)
                            selected[filters.subcategory_id == Some(subcategory.id)]
                        {
                            (subcategory.name)
                        }
                    }
                }
            }

            div
            {
                label for="filter-payment-method" class=(FORM_LABEL_STYLE) { "Payment (chart)" }

                select id="filter-payment-method" name="payment_method" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }

                    @for method in PaymentMethod::ALL {
                        option
                            value=(method.as_str())
                            selected[filters.payment_method == Some(method)]
                        {
                            (method.label())
                        }
                    }
                }
            }

            div
            {
                label for="filter-kind" class=(FORM_LABEL_STYLE) { "Kind" }

                select id="filter-kind" name="kind" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "All" }

                    @for kind in [CategoryKind::Expense, CategoryKind::Income] {
                        option value=(kind.as_str()) selected[filters.kind == Some(kind)]
                        {
                            (kind.label())
                        }
                    }
                }
            }

            div class="flex gap-2"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }
                a href=(endpoints::DASHBOARD_VIEW) class=(BUTTON_SECONDARY_STYLE) { "Reset" }
            }
        }
    )
}

/// The sum of the table alongside the API's totals for the filtered month.
fn summary_card(
    period: &str,
    table_total: f64,
    summary: Option<&MonthSummary>,
    lookup: &CategoryLookup,
) -> Markup {
    html!(
        section id="month-summary" class=(CARD_STYLE)
        {
            h2 class="text-lg font-semibold" { "Summary" }
            p class="text-sm text-gray-500 dark:text-gray-400" { (period) }

            dl class="mt-4 space-y-2"
            {
                div class="flex justify-between"
                {
                    dt { "Shown in table" }
                    dd id="table-total" class="font-semibold" { (format_currency(table_total)) }
                }

                @if let Some(summary) = summary {
                    div class="flex justify-between"
                    {
                        dt { "Month total" }
                        dd id="summary-total" class="font-semibold" { (format_currency(summary.total)) }
                    }

                    @for category_total in &summary.by_category {
                        div class="flex justify-between text-sm text-gray-600 dark:text-gray-300"
                        {
                            dt { (lookup.category_label(category_total.category_id)) }
                            dd { (format_currency(category_total.total)) }
                        }
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod dashboard_page_tests {
    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use scraper::{Html, Selector};

    use crate::{
        Error,
        dashboard::{
            filters::DashboardQuery,
            get_dashboard_page, get_subcategory_options,
            handlers::{DashboardState, SubcategoryOptionsQuery},
        },
        endpoints,
        ledger::LedgerCache,
        session::{DEFAULT_COOKIE_DURATION, Session},
        test_utils::{
            assert_form_input, assert_form_input_with_value, assert_hx_endpoint,
            assert_valid_html,
            fake_api::{FakeApi, FakeApiBuilder},
            parse_html_document, parse_html_fragment, selected_option,
        },
        timezone::get_local_date,
        transaction::MAX_INSTALLMENTS,
    };

    const CATEGORIES: &str = r#"[{"id": 1, "name": "Food", "kind": "expense"},
        {"id": 2, "name": "Salary", "kind": "income"}]"#;
    const SUBCATEGORIES: &str = r#"[{"id": 10, "category_id": 1, "name": "Market"},
        {"id": 20, "category_id": 2, "name": "Bonus"}]"#;
    const TRANSACTIONS: &str = r#"[
        {"id": 3, "account_id": 1, "category_id": 2, "amount": 1000.0, "date": "2024-05-05", "payment_method": "pix"},
        {"id": 2, "account_id": 1, "category_id": 1, "subcategory_id": 10, "amount": -30.0, "date": "2024-05-02", "payment_method": "card", "installments": 2, "installment_index": 1},
        {"id": 1, "account_id": 1, "category_id": 1, "amount": -20.0, "date": "2024-04-01", "payment_method": "cash"}
    ]"#;

    fn ledger_routes(categories: &str) -> FakeApiBuilder {
        FakeApi::builder()
            .json("GET", "/categories", categories)
            .json("GET", "/subcategories", SUBCATEGORIES)
            .json(
                "GET",
                "/accounts",
                r#"[{"id": 1, "name": "Personal", "type": "other"}]"#,
            )
            .json("GET", "/transactions", TRANSACTIONS)
    }

    fn state(fake: &FakeApi) -> DashboardState {
        DashboardState {
            api: fake.client(),
            ledgers: LedgerCache::new(DEFAULT_COOKIE_DURATION),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn query(pairs: &[(&str, &str)]) -> Query<DashboardQuery> {
        let encoded = serde_urlencoded::to_string(pairs).unwrap();
        Query(serde_urlencoded::from_str(&encoded).unwrap())
    }

    async fn get_page(state: DashboardState, query: Query<DashboardQuery>) -> Html {
        let response = get_dashboard_page(
            State(state),
            Extension(Session::new("token", "alice")),
            query,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        html
    }

    fn row_ids(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("#transactions-table tr[data-transaction-id]").unwrap())
            .filter_map(|row| row.value().attr("data-transaction-id").map(str::to_owned))
            .collect()
    }

    #[tokio::test]
    async fn shows_transactions_of_selected_month() {
        let fake = ledger_routes(CATEGORIES)
            .json(
                "GET",
                "/summary/month",
                r#"{"month": "2024-05", "total": -30.0, "by_category": [{"category_id": 1, "total": -30.0}]}"#,
            )
            .start()
            .await;

        let html = get_page(state(&fake), query(&[("month", "2024-05")])).await;

        assert_eq!(row_ids(&html), vec!["3", "2"]);
        let summary_request = fake
            .requests()
            .into_iter()
            .find(|request| request.path == "/summary/month")
            .expect("summary was not requested");
        assert_eq!(summary_request.query.as_deref(), Some("month=2024-05"));

        let summary_total = html
            .select(&Selector::parse("#summary-total").unwrap())
            .next()
            .expect("summary total missing")
            .text()
            .collect::<String>();
        assert_eq!(summary_total, "-$30.00");
        assert!(
            html.select(&Selector::parse("#category-spending-chart").unwrap())
                .next()
                .is_some(),
            "chart container missing"
        );
    }

    #[tokio::test]
    async fn empty_month_shows_every_transaction() {
        let fake = ledger_routes(CATEGORIES).start().await;

        let html = get_page(state(&fake), query(&[("month", "")])).await;

        assert_eq!(row_ids(&html), vec!["3", "2", "1"]);
        assert!(
            fake.requests()
                .iter()
                .all(|request| request.path != "/summary/month"),
            "summary should not be requested without a month"
        );
    }

    #[tokio::test]
    async fn kind_filter_keeps_income_only() {
        let fake = ledger_routes(CATEGORIES).start().await;

        let html = get_page(state(&fake), query(&[("month", ""), ("kind", "income")])).await;

        assert_eq!(row_ids(&html), vec!["3"]);
    }

    #[tokio::test]
    async fn invalid_filters_are_ignored() {
        let fake = ledger_routes(CATEGORIES).start().await;

        let html = get_page(
            state(&fake),
            query(&[("month", ""), ("category_id", "food"), ("day", "yesterday")]),
        )
        .await;

        assert_eq!(row_ids(&html), vec!["3", "2", "1"]);
    }

    #[tokio::test]
    async fn failed_summary_still_renders_page() {
        let fake = ledger_routes(CATEGORIES)
            .status("GET", "/summary/month", 500, "database unavailable")
            .start()
            .await;

        let html = get_page(state(&fake), query(&[("month", "2024-05")])).await;

        assert_eq!(row_ids(&html), vec!["3", "2"]);
        assert!(
            html.select(&Selector::parse("#summary-total").unwrap())
                .next()
                .is_none()
        );
    }

    #[tokio::test]
    async fn renders_entry_form() {
        let fake = ledger_routes(CATEGORIES).start().await;

        let html = get_page(state(&fake), query(&[("month", "")])).await;

        let form = html
            .select(&Selector::parse("#entry-form").unwrap())
            .next()
            .expect("entry form missing");
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "amount", "text");
        let today = get_local_date("Etc/UTC").unwrap();
        assert_form_input_with_value(&form, "date", "date", &today.to_string());

        assert_eq!(selected_option(&form, "category_id"), "1");
        assert_eq!(selected_option(&form, "payment_method"), "cash");

        let installment_options = form
            .select(&Selector::parse("select[name=installments] option").unwrap())
            .count();
        assert_eq!(installment_options, MAX_INSTALLMENTS as usize);
    }

    fn option_values(html: &Html, selector: &str) -> Vec<String> {
        html.select(&Selector::parse(selector).unwrap())
            .map(|option| option.value().attr("value").unwrap_or_default().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn entry_form_offers_subcategories_of_first_category() {
        let fake = ledger_routes(CATEGORIES).start().await;

        let html = get_page(state(&fake), query(&[("month", "")])).await;

        assert_eq!(
            option_values(&html, "#entry-subcategory option"),
            vec!["".to_owned(), "10".to_owned()]
        );
        let category_select = html
            .select(&Selector::parse("#entry-category").unwrap())
            .next()
            .expect("category select missing");
        assert_eq!(
            category_select.value().attr("hx-get"),
            Some(endpoints::SUBCATEGORY_OPTIONS)
        );
        assert_eq!(
            category_select.value().attr("hx-target"),
            Some("#entry-subcategory")
        );
    }

    async fn get_options(fake: &FakeApi, category_id: Option<&str>) -> Html {
        let response = get_subcategory_options(
            State(state(fake)),
            Extension(Session::new("token", "alice")),
            Query(SubcategoryOptionsQuery {
                category_id: category_id.map(str::to_owned),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        parse_html_fragment(response).await
    }

    #[tokio::test]
    async fn subcategory_options_follow_picked_category() {
        let fake = ledger_routes(CATEGORIES).start().await;

        let html = get_options(&fake, Some("2")).await;

        assert_eq!(
            option_values(&html, "option"),
            vec!["".to_owned(), "20".to_owned()]
        );
    }

    #[tokio::test]
    async fn subcategory_options_without_category_only_offer_none() {
        let fake = ledger_routes(CATEGORIES).start().await;

        for category_id in [None, Some(""), Some("abc"), Some("99")] {
            let html = get_options(&fake, category_id).await;

            assert_eq!(
                option_values(&html, "option"),
                vec!["".to_owned()],
                "for category_id {category_id:?}"
            );
        }
    }

    #[tokio::test]
    async fn prompts_for_category_without_categories() {
        let fake = ledger_routes("[]").start().await;

        let html = get_page(state(&fake), query(&[("month", "")])).await;

        assert!(
            html.select(&Selector::parse("#entry-form").unwrap())
                .next()
                .is_none()
        );
        let prompt = html
            .select(&Selector::parse("#entry-form-empty a").unwrap())
            .next()
            .expect("link to categories page missing");
        assert_eq!(prompt.value().attr("href"), Some(endpoints::CATEGORIES_VIEW));
    }

    #[tokio::test]
    async fn invalid_timezone_is_an_error() {
        let fake = ledger_routes(CATEGORIES).start().await;
        let mut state = state(&fake);
        state.local_timezone = "Not/AZone".to_owned();

        let result = get_dashboard_page(
            State(state),
            Extension(Session::new("token", "alice")),
            query(&[]),
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidTimezoneError(_))));
    }
}
