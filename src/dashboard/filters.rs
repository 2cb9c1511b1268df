//! The filter selections of the dashboard and the function that applies them.
//!
//! Filters come from the dashboard's query string. Every filter is optional
//! and an absent filter lets every transaction through, so the result of
//! [filter_transactions] does not depend on the order the filters are checked in.

use std::fmt::Display;

use serde::Deserialize;
use time::{Date, Month, macros::format_description};

use crate::{
    category::{CategoryId, CategoryKind, CategoryLookup, SubcategoryId},
    transaction::{PaymentMethod, Transaction},
};

/// A calendar month, e.g. May 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: Month,
}

impl YearMonth {
    /// The month `date` falls in.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse a month in the form "YYYY-MM", as produced by `<input type="month">`.
    pub fn parse(text: &str) -> Option<Self> {
        let (year, month) = text.trim().split_once('-')?;

        if year.len() != 4 || month.len() != 2 {
            return None;
        }

        let year = year.parse().ok()?;
        let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;

        Some(Self { year, month })
    }

    pub fn contains(&self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

/// The raw query string of the dashboard.
///
/// Values are kept as text so that an invalid value can be dropped on its own
/// instead of rejecting the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub month: Option<String>,
    pub day: Option<String>,
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    pub payment_method: Option<String>,
    pub kind: Option<String>,
}

/// The filter selections that decide which transactions the dashboard shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardFilters {
    /// Only transactions in this month.
    pub month: Option<YearMonth>,
    /// Only transactions on this date.
    pub day: Option<Date>,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    /// Narrows the chart only, the table ignores it.
    pub payment_method: Option<PaymentMethod>,
    /// Only transactions whose category is of this kind.
    pub kind: Option<CategoryKind>,
}

impl DashboardFilters {
    /// Build the filters from the dashboard's query string.
    ///
    /// When `month` is missing from the query, the month of `today` is used.
    /// An empty value turns a filter off. Values that cannot be parsed are
    /// logged and ignored.
    pub fn from_query(query: DashboardQuery, today: Date) -> Self {
        let month = match query.month.as_deref() {
            None => Some(YearMonth::of(today)),
            Some(month) => parse_filter("month", Some(month), YearMonth::parse),
        };

        Self {
            month,
            day: parse_filter("day", query.day.as_deref(), parse_day),
            category_id: parse_filter("category_id", query.category_id.as_deref(), |id| {
                id.parse().ok()
            }),
            subcategory_id: parse_filter(
                "subcategory_id",
                query.subcategory_id.as_deref(),
                |id| id.parse().ok(),
            ),
            payment_method: parse_filter(
                "payment_method",
                query.payment_method.as_deref(),
                |method| method.parse().ok(),
            ),
            kind: parse_filter("kind", query.kind.as_deref(), |kind| kind.parse().ok()),
        }
    }

    /// Whether `transaction` passes every filter except the payment method.
    pub fn matches(&self, transaction: &Transaction, lookup: &CategoryLookup) -> bool {
        self.month
            .is_none_or(|month| month.contains(transaction.date))
            && self.day.is_none_or(|day| transaction.date == day)
            && self
                .category_id
                .is_none_or(|category_id| transaction.category_id == category_id)
            && self
                .subcategory_id
                .is_none_or(|subcategory_id| transaction.subcategory_id == Some(subcategory_id))
            && self
                .kind
                .is_none_or(|kind| kind_of(transaction, lookup) == kind)
    }
}

/// Transactions whose category is unknown count as expenses.
fn kind_of(transaction: &Transaction, lookup: &CategoryLookup) -> CategoryKind {
    lookup
        .category(transaction.category_id)
        .map(|category| category.kind)
        .unwrap_or_default()
}

fn parse_day(text: &str) -> Option<Date> {
    Date::parse(text, format_description!("[year]-[month]-[day]")).ok()
}

fn parse_filter<T>(name: &str, raw: Option<&str>, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    let parsed = parse(raw);

    if parsed.is_none() {
        tracing::warn!("Ignoring invalid dashboard filter {name}={raw:?}");
    }

    parsed
}

/// The transactions that pass `filters`, in their original order.
///
/// The payment method filter is not applied here since it only narrows the chart.
pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    lookup: &CategoryLookup,
    filters: &DashboardFilters,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|transaction| filters.matches(transaction, lookup))
        .collect()
}

#[cfg(test)]
mod year_month_tests {
    use time::{Month, macros::date};

    use crate::dashboard::filters::YearMonth;

    #[test]
    fn parses_month_input_value() {
        assert_eq!(
            YearMonth::parse("2024-05"),
            Some(YearMonth {
                year: 2024,
                month: Month::May
            })
        );
    }

    #[test]
    fn rejects_malformed_months() {
        for text in ["2024-13", "2024-5", "24-05", "May 2024", "2024-05-01", ""] {
            assert_eq!(YearMonth::parse(text), None, "parsed {text:?}");
        }
    }

    #[test]
    fn displays_as_month_input_value() {
        assert_eq!(YearMonth::of(date!(2024 - 03 - 31)).to_string(), "2024-03");
    }

    #[test]
    fn contains_only_dates_in_month() {
        let may = YearMonth::parse("2024-05").unwrap();

        assert!(may.contains(date!(2024 - 05 - 01)));
        assert!(may.contains(date!(2024 - 05 - 31)));
        assert!(!may.contains(date!(2024 - 06 - 01)));
        assert!(!may.contains(date!(2023 - 05 - 15)));
    }
}
