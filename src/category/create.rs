//! Endpoints for creating categories and subcategories.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use serde::Deserialize;

use crate::{
    Error,
    api::types::{NewCategory, NewSubcategory},
    category::{CategoryId, CategoryKind, CategoryName},
    endpoints,
    ledger::{LedgerState, LedgerUpdate, apply_to_cached_ledger},
    session::Session,
};

/// Form data for creating a category.
#[derive(Debug, Deserialize)]
pub struct NewCategoryForm {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
}

/// Form data for creating a subcategory.
#[derive(Debug, Deserialize)]
pub struct NewSubcategoryForm {
    pub category_id: CategoryId,
    pub name: String,
}

fn redirect_to_categories() -> Response {
    (
        HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Handle the new category form.
///
/// The kind defaults to expense when the form leaves it out.
pub async fn create_category_endpoint(
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
    Form(form): Form<NewCategoryForm>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let kind = match form.kind.as_deref() {
        None | Some("") => CategoryKind::default(),
        Some(kind) => match kind.parse::<CategoryKind>() {
            Ok(kind) => kind,
            Err(error) => return error.into_alert_response(),
        },
    };

    let new_category = NewCategory {
        name: name.as_ref(),
        kind,
    };

    let category = match state.api.create_category(&session, &new_category).await {
        Ok(category) => category,
        Err(error) => {
            tracing::error!("Could not create category {name:?}: {error}");
            return Error::from(error).into_alert_response();
        }
    };

    tracing::info!("Created category {} ({})", category.id, category.name);

    if let Err(error) = apply_to_cached_ledger(
        &state.ledgers,
        &session,
        LedgerUpdate::AppendCategory(category),
    ) {
        return error.into_alert_response();
    }

    redirect_to_categories()
}

/// Handle the new subcategory form.
pub async fn create_subcategory_endpoint(
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
    Form(form): Form<NewSubcategoryForm>,
) -> Response {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let new_subcategory = NewSubcategory {
        category_id: form.category_id,
        name: name.as_ref(),
    };

    let subcategory = match state
        .api
        .create_subcategory(&session, &new_subcategory)
        .await
    {
        Ok(subcategory) => subcategory,
        Err(error) => {
            tracing::error!(
                "Could not create subcategory {name:?} in category {}: {error}",
                form.category_id
            );
            return Error::from(error).into_alert_response();
        }
    };

    if let Err(error) = apply_to_cached_ledger(
        &state.ledgers,
        &session,
        LedgerUpdate::AppendSubcategory(subcategory),
    ) {
        return error.into_alert_response();
    }

    redirect_to_categories()
}
