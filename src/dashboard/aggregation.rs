//! Category totals for the dashboard chart.
//!
//! The dashboard's view model is a pure function of the transactions, the
//! category lookup and the filter selections: see [DashboardView::new].

use std::collections::HashMap;

use crate::{
    category::{CategoryId, CategoryLookup},
    dashboard::filters::{DashboardFilters, filter_transactions},
    transaction::{PaymentMethod, Transaction},
};

/// Chart-ready totals per category.
///
/// `labels` and `values` have the same length; the value at an index is the
/// total for the label at that index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl CategoryTotals {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Sums the amounts of `transactions` per category.
///
/// When `payment_method` is set, only transactions paid that way are counted;
/// transactions without a payment method never match. Categories appear in
/// the order they are first seen in `transactions`. Values are the absolute
/// value of each sum, so expenses and income both chart as positive bars.
/// Categories the lookup does not know are labelled with their ID.
pub fn aggregate_by_category(
    transactions: &[&Transaction],
    lookup: &CategoryLookup,
    payment_method: Option<PaymentMethod>,
) -> CategoryTotals {
    let mut order: Vec<CategoryId> = Vec::new();
    let mut sums: HashMap<CategoryId, f64> = HashMap::new();

    for transaction in transactions {
        if payment_method.is_some_and(|method| transaction.payment_method != Some(method)) {
            continue;
        }

        let sum = sums.entry(transaction.category_id).or_insert_with(|| {
            order.push(transaction.category_id);
            0.0
        });
        *sum += transaction.amount;
    }

    let labels = order
        .iter()
        .map(|&category_id| lookup.category_label(category_id))
        .collect();
    let values = order
        .iter()
        .map(|category_id| sums[category_id].abs())
        .collect();

    CategoryTotals { labels, values }
}

/// The transactions the dashboard table shows and the totals its chart shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView<'a> {
    pub transactions: Vec<&'a Transaction>,
    pub totals: CategoryTotals,
}

impl<'a> DashboardView<'a> {
    pub fn new(
        transactions: &'a [Transaction],
        lookup: &CategoryLookup,
        filters: &DashboardFilters,
    ) -> Self {
        let transactions = filter_transactions(transactions, lookup, filters);
        let totals = aggregate_by_category(&transactions, lookup, filters.payment_method);

        Self {
            transactions,
            totals,
        }
    }

    /// The sum of the amounts in the table.
    pub fn total(&self) -> f64 {
        self.transactions
            .iter()
            .map(|transaction| transaction.amount)
            .sum()
    }
}
