use super::common::{created_response, non_blank, Actor, ApiJson, ApiPath, ApiQuery};
use crate::{
    errors::ServiceError,
    pagination::{PaginationMeta, PaginationParams},
    services::sales_orders::{
        CreateSalesOrderRequest, SalesOrderDetail, SalesOrderFilter, SalesOrderItemView,
        SalesOrderSummary, UpdateSalesItemRequest,
    },
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct GoodsOutQuery {
    pub order_id: Option<i32>,
    pub customer_id: Option<String>,
    /// Inclusive, applied to the order date
    pub date_from: Option<NaiveDate>,
    /// Inclusive, applied to the order date
    pub date_to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SalesOrderList {
    pub orders: Vec<SalesOrderSummary>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    get,
    path = "/api/v1/goods-out",
    summary = "List sales orders",
    params(GoodsOutQuery),
    responses(
        (status = 200, description = "Sales orders retrieved", body = SalesOrderList),
        (status = 400, description = "Invalid query parameters", body = crate::errors::ErrorResponse),
    ),
    tag = "goods-out"
)]
pub async fn list_goods_out(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GoodsOutQuery>,
) -> Result<Json<SalesOrderList>, ServiceError> {
    let page = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config)?;
    let filter = SalesOrderFilter {
        order_id: query.order_id,
        customer_id: non_blank(query.customer_id),
        date_from: query.date_from,
        date_to: query.date_to,
    };

    let result = state.services.sales_orders.list_orders(filter, page).await?;
    Ok(Json(SalesOrderList {
        orders: result.items,
        pagination: result.pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales-orders/{id}",
    summary = "Get sales order",
    description = "Order lines merged by brand, details, color, grade and storage",
    params(("id" = i32, Path, description = "Sales order id")),
    responses(
        (status = 200, description = "Grouped order detail", body = SalesOrderDetail),
        (status = 404, description = "Sales order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "goods-out"
)]
pub async fn get_sales_order(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<i32>,
) -> Result<Json<SalesOrderDetail>, ServiceError> {
    Ok(Json(state.services.sales_orders.get_order(order_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/sales-orders",
    summary = "Create sales order",
    request_body = CreateSalesOrderRequest,
    responses(
        (status = 201, description = "Sales order created", body = SalesOrderDetail),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    tag = "goods-out"
)]
pub async fn create_sales_order(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(payload): ApiJson<CreateSalesOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .sales_orders
        .create_order(payload, actor.as_str())
        .await?;
    Ok(created_response(order))
}

#[utoipa::path(
    put,
    path = "/api/v1/sales-orders/{id}/items/{item_id}",
    summary = "Update sales order item",
    description = "Allocates a device to the item and sets its completion; completed items take their device out of stock",
    params(
        ("id" = i32, Path, description = "Sales order id"),
        ("item_id" = i32, Path, description = "Order line id"),
    ),
    request_body = UpdateSalesItemRequest,
    responses(
        (status = 200, description = "Item updated", body = SalesOrderItemView),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order item or device not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Device is not in stock", body = crate::errors::ErrorResponse),
    ),
    tag = "goods-out"
)]
pub async fn update_sales_order_item(
    State(state): State<AppState>,
    ApiPath((order_id, item_id)): ApiPath<(i32, i32)>,
    actor: Actor,
    ApiJson(payload): ApiJson<UpdateSalesItemRequest>,
) -> Result<Json<SalesOrderItemView>, ServiceError> {
    let item = state
        .services
        .sales_orders
        .update_item(order_id, item_id, payload, actor.as_str())
        .await?;
    Ok(Json(item))
}
