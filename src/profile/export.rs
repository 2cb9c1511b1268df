//! Download the user's transactions as a CSV file.

use axum::{
    Extension,
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{Error, dashboard::YearMonth, ledger::LedgerState, session::Session};

/// Used when the API does not say what it sent.
const DEFAULT_CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Only export this month, "YYYY-MM". Empty or missing exports everything.
    pub month: Option<String>,
}

/// Relay the API's CSV export of the user's transactions as a file download.
///
/// An invalid month is logged and ignored, so every transaction is exported.
pub async fn export_csv_endpoint(
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, Error> {
    let month = query
        .month
        .as_deref()
        .map(str::trim)
        .filter(|month| !month.is_empty())
        .and_then(|month| {
            let parsed = YearMonth::parse(month);
            if parsed.is_none() {
                tracing::warn!("Ignoring invalid export month {month:?}");
            }
            parsed
        })
        .map(|month| month.to_string());

    let export = state
        .api
        .export_csv(&session, month.as_deref())
        .await
        .inspect_err(|error| tracing::error!("Could not export transactions: {error}"))?;

    let filename = match &month {
        Some(month) => format!("transactions-{month}.csv"),
        None => "transactions.csv".to_owned(),
    };

    Ok((
        [
            (
                CONTENT_TYPE,
                export
                    .content_type
                    .unwrap_or_else(|| DEFAULT_CSV_CONTENT_TYPE.to_owned()),
            ),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        export.body,
    )
        .into_response())
}

#[cfg(test)]
mod export_tests {
    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };

    use crate::{
        ledger::LedgerState,
        profile::export_csv_endpoint,
        session::Session,
        test_utils::{assert_content_type, fake_api::FakeApi, get_header},
    };

    use super::ExportQuery;

    const CSV: &str = "id,date,amount\n1,2024-05-01,-20.0\n";

    async fn fake_api() -> FakeApi {
        FakeApi::builder()
            .respond("GET", "/export/csv", 200, "text/csv", CSV)
            .start()
            .await
    }

    #[tokio::test]
    async fn downloads_month_as_attachment() {
        let fake = fake_api().await;

        let response = export_csv_endpoint(
            State(LedgerState::with_api(fake.client())),
            Extension(Session::new("token", "alice")),
            Query(ExportQuery {
                month: Some("2024-05".to_owned()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/csv");
        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=\"transactions-2024-05.csv\""
        );
        assert_eq!(fake.requests()[0].query.as_deref(), Some("month=2024-05"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, CSV.as_bytes());
    }

    #[tokio::test]
    async fn empty_or_invalid_month_exports_everything() {
        let fake = fake_api().await;

        for month in [None, Some(""), Some("May")] {
            let response = export_csv_endpoint(
                State(LedgerState::with_api(fake.client())),
                Extension(Session::new("token", "alice")),
                Query(ExportQuery {
                    month: month.map(str::to_owned),
                }),
            )
            .await
            .unwrap();

            assert_eq!(
                get_header(&response, "content-disposition"),
                "attachment; filename=\"transactions.csv\""
            );
        }

        assert!(
            fake.requests()
                .iter()
                .all(|request| request.query.is_none())
        );
    }

    #[tokio::test]
    async fn relays_latin1_export_byte_for_byte() {
        // "ação" in Latin-1, which is not valid UTF-8.
        let latin1_csv = b"note\na\xe7\xe3o\n";
        let fake = FakeApi::builder()
            .respond(
                "GET",
                "/export/csv",
                200,
                "text/csv; charset=iso-8859-1",
                latin1_csv,
            )
            .start()
            .await;

        let response = export_csv_endpoint(
            State(LedgerState::with_api(fake.client())),
            Extension(Session::new("token", "alice")),
            Query(ExportQuery::default()),
        )
        .await
        .unwrap();

        assert_content_type(&response, "text/csv; charset=iso-8859-1");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.as_ref(), latin1_csv.as_slice());
    }

    #[tokio::test]
    async fn api_failure_is_an_error() {
        let fake = FakeApi::builder()
            .status("GET", "/export/csv", 500, "")
            .start()
            .await;

        let result = export_csv_endpoint(
            State(LedgerState::with_api(fake.client())),
            Extension(Session::new("token", "alice")),
            Query(ExportQuery::default()),
        )
        .await;

        assert!(result.is_err());
    }
}
