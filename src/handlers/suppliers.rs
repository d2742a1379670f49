use super::common::{created_response, non_blank, Actor, ApiJson, ApiPath, ApiQuery};
use crate::{
    entities::supplier,
    errors::ServiceError,
    pagination::{PaginationMeta, PaginationParams},
    services::suppliers::CreateSupplierRequest,
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SupplierListQuery {
    /// Matches id, name or email
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SupplierList {
    pub suppliers: Vec<supplier::Model>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    summary = "List suppliers",
    params(SupplierListQuery),
    responses(
        (status = 200, description = "Suppliers retrieved", body = SupplierList),
        (status = 400, description = "Invalid query parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "reference-data"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SupplierListQuery>,
) -> Result<Json<SupplierList>, ServiceError> {
    let page = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config)?;
    let search = non_blank(query.search);

    let result = state
        .services
        .suppliers
        .list_suppliers(search.as_deref(), page)
        .await?;

    Ok(Json(SupplierList {
        suppliers: result.items,
        pagination: result.pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    summary = "Get supplier",
    params(("id" = String, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier retrieved", body = supplier::Model),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reference-data"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<supplier::Model>, ServiceError> {
    Ok(Json(state.services.suppliers.get_supplier(&id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    summary = "Create supplier",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created", body = supplier::Model),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Supplier id already exists", body = crate::errors::ErrorResponse),
    ),
    tag = "reference-data"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(payload): ApiJson<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .suppliers
        .create_supplier(payload, actor.as_str())
        .await?;
    Ok(created_response(created))
}
