use super::common::{non_blank, ApiQuery};
use crate::{
    entities::{category, tray},
    errors::ServiceError,
    services::catalog::TacLookup,
    AppState,
};
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring filter
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TacQuery {
    /// Full IMEI or at least its first eight digits
    pub imei: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryList {
    pub categories: Vec<category::Model>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrayList {
    pub trays: Vec<tray::Model>,
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    summary = "List manufacturer categories",
    params(SearchQuery),
    responses(
        (status = 200, description = "Categories ordered by title", body = CategoryList),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "reference-data"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<CategoryList>, ServiceError> {
    let search = non_blank(query.search);
    let categories = state
        .services
        .catalog
        .list_categories(search.as_deref())
        .await?;
    Ok(Json(CategoryList { categories }))
}

#[utoipa::path(
    get,
    path = "/api/v1/trays",
    summary = "List trays",
    params(SearchQuery),
    responses(
        (status = 200, description = "Trays ordered by id", body = TrayList),
    ),
    tag = "reference-data"
)]
pub async fn list_trays(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<TrayList>, ServiceError> {
    let search = non_blank(query.search);
    let trays = state.services.catalog.list_trays(search.as_deref()).await?;
    Ok(Json(TrayList { trays }))
}

#[utoipa::path(
    get,
    path = "/api/v1/tac",
    summary = "Look up manufacturer and model by IMEI",
    params(TacQuery),
    responses(
        (status = 200, description = "TAC resolved", body = TacLookup),
        (status = 400, description = "IMEI has fewer than eight leading digits", body = crate::errors::ErrorResponse),
        (status = 404, description = "TAC not known", body = crate::errors::ErrorResponse),
    ),
    tag = "reference-data"
)]
pub async fn lookup_tac(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TacQuery>,
) -> Result<Json<TacLookup>, ServiceError> {
    Ok(Json(state.services.catalog.lookup_tac(&query.imei).await?))
}
