use super::common::{created_response, non_blank, Actor, ApiJson, ApiPath, ApiQuery};
use crate::{
    entities::customer,
    errors::ServiceError,
    pagination::{PaginationMeta, PaginationParams},
    services::customers::CreateCustomerRequest,
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
pub struct CustomerListQuery {
    /// Matches id, name or email
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomerList {
    pub customers: Vec<customer::Model>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    summary = "List customers",
    params(CustomerListQuery),
    responses(
        (status = 200, description = "Customers retrieved", body = CustomerList),
        (status = 400, description = "Invalid query parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "reference-data"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CustomerListQuery>,
) -> Result<Json<CustomerList>, ServiceError> {
    let page = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config)?;
    let search = non_blank(query.search);

    let result = state
        .services
        .customers
        .list_customers(search.as_deref(), page)
        .await?;

    Ok(Json(CustomerList {
        customers: result.items,
        pagination: result.pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    summary = "Get customer",
    params(("id" = String, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer retrieved", body = customer::Model),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    tag = "reference-data"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<customer::Model>, ServiceError> {
    Ok(Json(state.services.customers.get_customer(&id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    summary = "Create customer",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = customer::Model),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Customer id already exists", body = crate::errors::ErrorResponse),
    ),
    tag = "reference-data"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(payload): ApiJson<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .customers
        .create_customer(payload, actor.as_str())
        .await?;
    Ok(created_response(created))
}
