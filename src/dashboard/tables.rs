//! The table of filtered transactions on the dashboard.

use maud::{Markup, html};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    alert::ALERT_CONTAINER_TARGET,
    category::CategoryLookup,
    endpoints,
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        format_currency,
    },
    transaction::Transaction,
};

/// The max number of graphemes to display in the note column before
/// truncating and displaying ellipses.
const MAX_NOTE_GRAPHEMES: usize = 32;

/// Renders the transactions that passed the dashboard filters.
///
/// Amounts are shown without their sign since every row is read as money spent
/// or received in its category.
pub(super) fn transactions_table(transactions: &[&Transaction], lookup: &CategoryLookup) -> Markup {
    html! {
        section class="w-full overflow-x-auto rounded-lg shadow"
        {
            table id="transactions-table" class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Payment" }
                        th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                        th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        (transaction_row(transaction, lookup))
                    }

                    @if transactions.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td
                                colspan="6"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "No transactions match the current filters."
                            }
                        }
                    }
                }
            }
        }
    }
}

fn transaction_row(transaction: &Transaction, lookup: &CategoryLookup) -> Markup {
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, transaction.id);
    let (note, full_note) = format_note(transaction.note.as_deref().unwrap_or_default());

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class={(TABLE_CELL_STYLE) " whitespace-nowrap"} { (transaction.date.to_string()) }

            td class=(TABLE_CELL_STYLE)
            {
                (lookup.category_label(transaction.category_id))

                @if let Some(subcategory_id) = transaction.subcategory_id {
                    span class="text-gray-400" { " / " }
                    (lookup.subcategory_label(subcategory_id))
                }
            }

            td class=(TABLE_CELL_STYLE)
            {
                span class=(BADGE_STYLE) { (transaction.payment_label()) }
            }

            td class={(TABLE_CELL_STYLE) " text-right whitespace-nowrap"}
            {
                (format_currency(transaction.amount.abs()))
            }

            td class=(TABLE_CELL_STYLE) title=[full_note] { (note) }

            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(delete_url)
                    hx-confirm="Are you sure you want to delete this transaction?"
                    hx-target="closest tr"
                    hx-target-error=(ALERT_CONTAINER_TARGET)
                    hx-swap="delete"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

fn format_note(note: &str) -> (String, Option<&str>) {
    let note_length = note.graphemes(true).count();

    if note_length <= MAX_NOTE_GRAPHEMES {
        (note.to_owned(), None)
    } else {
        let truncated: String = note.graphemes(true).take(MAX_NOTE_GRAPHEMES - 3).collect();
        (truncated + "...", Some(note))
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        category::{Category, CategoryKind, CategoryLookup, Subcategory},
        dashboard::tables::{format_note, transactions_table},
        endpoints,
        test_utils::assert_valid_html,
        transaction::{PaymentMethod, Transaction},
    };

    fn lookup() -> CategoryLookup {
        CategoryLookup::new(
            &[Category {
                id: 1,
                name: "Food".to_owned(),
                kind: CategoryKind::Expense,
            }],
            &[Subcategory {
                id: 10,
                category_id: 1,
                name: "Market".to_owned(),
            }],
        )
    }

    fn card_installment() -> Transaction {
        Transaction {
            id: 7,
            account_id: 1,
            category_id: 1,
            subcategory_id: Some(10),
            amount: -35.9,
            date: date!(2024 - 05 - 10),
            note: Some("Fridge".to_owned()),
            payment_method: Some(PaymentMethod::Card),
            installments: Some(3),
            installment_index: Some(2),
        }
    }

    fn cell_texts(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("tbody td").unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[test]
    fn renders_transaction_row() {
        let transaction = card_installment();

        let html = Html::parse_fragment(&transactions_table(&[&transaction], &lookup()).into_string());

        assert_valid_html(&html);
        let cells = cell_texts(&html);
        assert_eq!(cells[0], "2024-05-10");
        assert_eq!(cells[1], "Food / Market");
        assert_eq!(cells[2], "Card 2/3");
        assert_eq!(cells[3], "$35.90");
        assert_eq!(cells[4], "Fridge");

        let button = html
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .next()
            .expect("missing delete button");
        assert_eq!(
            button.value().attr("hx-delete"),
            Some(endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, 7).as_str())
        );
    }

    #[test]
    fn unknown_category_shows_raw_id() {
        let mut transaction = card_installment();
        transaction.category_id = 42;
        transaction.subcategory_id = None;

        let html = Html::parse_fragment(&transactions_table(&[&transaction], &lookup()).into_string());

        assert_eq!(cell_texts(&html)[1], "42");
    }

    #[test]
    fn renders_empty_state() {
        let html = Html::parse_fragment(&transactions_table(&[], &lookup()).into_string());

        assert_eq!(
            cell_texts(&html),
            vec!["No transactions match the current filters."]
        );
    }

    #[test]
    fn long_notes_are_truncated_by_grapheme() {
        let note = "🍕".repeat(40);

        let (truncated, full) = format_note(&note);

        assert_eq!(truncated, format!("{}...", "🍕".repeat(29)));
        assert_eq!(full, Some(note.as_str()));
        assert_eq!(format_note("short"), ("short".to_owned(), None));
    }
}
