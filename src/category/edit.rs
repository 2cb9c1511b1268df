//! Endpoints for renaming categories and subcategories.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use serde::Deserialize;

use crate::{
    Error,
    api::types::{CategoryRename, SubcategoryUpdate},
    category::{CategoryId, CategoryName, SubcategoryId},
    endpoints,
    ledger::{LedgerState, LedgerUpdate, apply_to_cached_ledger},
    session::Session,
};

/// Form data for renaming a category.
#[derive(Debug, Deserialize)]
pub struct CategoryRenameForm {
    pub name: String,
}

/// Form data for renaming a subcategory or moving it to another category.
#[derive(Debug, Deserialize)]
pub struct SubcategoryUpdateForm {
    pub name: String,
    pub category_id: Option<CategoryId>,
}

/// Handle the rename form of a category.
pub async fn rename_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
    Form(form): Form<CategoryRenameForm>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let rename = CategoryRename {
        name: name.as_ref(),
    };

    let category = match state
        .api
        .rename_category(&session, category_id, &rename)
        .await
    {
        Ok(category) => category,
        Err(error) => {
            tracing::error!("Could not rename category {category_id}: {error}");
            return Error::from(error).into_alert_response();
        }
    };

    if let Err(error) = apply_to_cached_ledger(
        &state.ledgers,
        &session,
        LedgerUpdate::UpdateCategory(category),
    ) {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Handle the edit form of a subcategory.
pub async fn update_subcategory_endpoint(
    Path(subcategory_id): Path<SubcategoryId>,
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
    Form(form): Form<SubcategoryUpdateForm>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let update = SubcategoryUpdate {
        name: name.as_ref(),
        category_id: form.category_id,
    };

    let subcategory = match state
        .api
        .update_subcategory(&session, subcategory_id, &update)
        .await
    {
        Ok(subcategory) => subcategory,
        Err(error) => {
            tracing::error!("Could not update subcategory {subcategory_id}: {error}");
            return Error::from(error).into_alert_response();
        }
    };

    if let Err(error) = apply_to_cached_ledger(
        &state.ledgers,
        &session,
        LedgerUpdate::UpdateSubcategory(subcategory),
    ) {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod edit_category_tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;

    use crate::{
        category::{
            edit::{CategoryRenameForm, SubcategoryUpdateForm},
            rename_category_endpoint, update_subcategory_endpoint,
        },
        endpoints,
        ledger::{LedgerState, cached_ledger},
        session::Session,
        test_utils::{assert_hx_redirect, fake_api::FakeApi},
    };

    async fn fake_api() -> FakeApi {
        FakeApi::builder()
            .json(
                "GET",
                "/categories",
                r#"[{"id": 1, "name": "Food", "kind": "expense"},
                    {"id": 2, "name": "Home", "kind": "expense"}]"#,
            )
            .json(
                "GET",
                "/subcategories",
                r#"[{"id": 10, "category_id": 1, "name": "Market"}]"#,
            )
            .json("GET", "/accounts", r#"[{"id": 1, "name": "Personal", "type": "other"}]"#)
            .json("GET", "/transactions", "[]")
            .json(
                "PUT",
                "/categories/1",
                r#"{"id": 1, "name": "Groceries", "kind": "expense"}"#,
            )
            .json(
                "PUT",
                "/subcategories/10",
                r#"{"id": 10, "category_id": 2, "name": "Cleaning"}"#,
            )
            .start()
            .await
    }

    #[tokio::test]
    async fn rename_is_visible_in_cached_lookup() {
        let fake = fake_api().await;
        let state = LedgerState::with_api(fake.client());
        let session = Session::new("token", "alice");
        cached_ledger(&state.ledgers, &state.api, &session)
            .await
            .unwrap();

        let response = rename_category_endpoint(
            Path(1),
            State(state.clone()),
            Extension(session.clone()),
            Form(CategoryRenameForm {
                name: "Groceries".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let ledger = cached_ledger(&state.ledgers, &state.api, &session)
            .await
            .unwrap();
        assert_eq!(ledger.lookup().category_label(1), "Groceries");
    }

    #[tokio::test]
    async fn moving_subcategory_regroups_lookup() {
        let fake = fake_api().await;
        let state = LedgerState::with_api(fake.client());
        let session = Session::new("token", "alice");
        cached_ledger(&state.ledgers, &state.api, &session)
            .await
            .unwrap();

        let response = update_subcategory_endpoint(
            Path(10),
            State(state.clone()),
            Extension(session.clone()),
            Form(SubcategoryUpdateForm {
                name: "Cleaning".to_owned(),
                category_id: Some(2),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let ledger = cached_ledger(&state.ledgers, &state.api, &session)
            .await
            .unwrap();
        assert!(ledger.lookup().subcategories_of(1).is_empty());
        assert_eq!(ledger.lookup().subcategories_of(2).len(), 1);

        let request = fake
            .requests()
            .into_iter()
            .find(|request| request.method == "PUT")
            .unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&request.body).unwrap(),
            serde_json::json!({"name": "Cleaning", "category_id": 2})
        );
    }

    #[tokio::test]
    async fn rejects_empty_name() {
        let fake = fake_api().await;

        let response = rename_category_endpoint(
            Path(1),
            State(LedgerState::with_api(fake.client())),
            Extension(Session::new("token", "alice")),
            Form(CategoryRenameForm {
                name: String::new(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn unknown_category_is_reported() {
        let fake = FakeApi::builder().start().await;

        let response = rename_category_endpoint(
            Path(99),
            State(LedgerState::with_api(fake.client())),
            Extension(Session::new("token", "alice")),
            Form(CategoryRenameForm {
                name: "Anything".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
