use super::common::{created_response, non_blank, Actor, ApiJson, ApiQuery};
use crate::{
    errors::ServiceError,
    pagination::{PaginationMeta, PaginationParams},
    services::{
        goods_in::GoodsInSubmission,
        purchases::{PurchaseFilter, PurchaseSummary},
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
pub struct GoodsInQuery {
    pub purchase_id: Option<i32>,
    pub supplier_id: Option<String>,
    /// Inclusive, `YYYY-MM-DD`
    pub date_from: Option<NaiveDate>,
    /// Inclusive, `YYYY-MM-DD`
    pub date_to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl GoodsInQuery {
    fn filter(self) -> PurchaseFilter {
        PurchaseFilter {
            purchase_id: self.purchase_id,
            supplier_id: non_blank(self.supplier_id),
            date_from: self.date_from,
            date_to: self.date_to,
            ..Default::default()
        }
    }
}

/// Consolidated purchase orders
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseList {
    pub purchases: Vec<PurchaseSummary>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    get,
    path = "/api/v1/goods-in",
    summary = "List purchase orders",
    description = "One entry per purchase order, newest first, with device counts aggregated from its lines",
    params(GoodsInQuery),
    responses(
        (status = 200, description = "Purchase orders retrieved", body = PurchaseList),
        (status = 400, description = "Invalid query parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "goods-in"
)]
pub async fn list_goods_in(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GoodsInQuery>,
) -> Result<Json<PurchaseList>, ServiceError> {
    let page = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config)?;

    let result = state
        .services
        .goods_in
        .list_purchases(query.filter(), page)
        .await?;

    Ok(Json(PurchaseList {
        purchases: result.items,
        pagination: result.pagination,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/goods-in/submit",
    summary = "Receive devices",
    description = "Creates a purchase order, upserts one device per IMEI and adds one purchase line per device, atomically",
    request_body = GoodsInSubmission,
    responses(
        (status = 201, description = "Goods received", body = crate::services::goods_in::GoodsInReceipt),
        (status = 400, description = "Invalid submission", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
    ),
    tag = "goods-in"
)]
pub async fn submit_goods_in(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(payload): ApiJson<GoodsInSubmission>,
) -> Result<impl IntoResponse, ServiceError> {
    let receipt = state
        .services
        .goods_in
        .submit(payload, actor.as_str())
        .await?;
    Ok(created_response(receipt))
}
