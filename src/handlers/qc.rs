use super::common::{created_response, non_blank, Actor, ApiJson, ApiPath, ApiQuery};
use super::goods_in::PurchaseList;
use crate::{
    errors::ServiceError,
    pagination::{PaginationMeta, PaginationParams},
    services::{
        purchases::{PurchaseFilter, QcStatus},
        qc::{PurchaseDevices, QcBatchResult, QcBatchUpdate, QcRecordView, QcResult, RecordQcRequest},
    },
    AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct QcPurchaseQuery {
    pub purchase_id: Option<i32>,
    /// `pending` or `completed`
    pub qc_status: Option<String>,
    pub supplier_id: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct QcRecordQuery {
    /// `passed` or `failed`
    pub status: Option<String>,
    /// Substring of the device code
    pub search: Option<String>,
    pub purchase_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QcRecordList {
    pub records: Vec<QcRecordView>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    get,
    path = "/api/v1/qc/purchases",
    summary = "QC queue",
    description = "Purchase orders with at least one line requiring QC",
    params(QcPurchaseQuery),
    responses(
        (status = 200, description = "Purchase orders retrieved", body = PurchaseList),
        (status = 400, description = "Invalid query parameters", body = crate::errors::ErrorResponse),
    ),
    tag = "qc"
)]
pub async fn list_qc_purchases(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<QcPurchaseQuery>,
) -> Result<Json<PurchaseList>, ServiceError> {
    let page = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config)?;
    let qc_status = non_blank(query.qc_status)
        .map(|raw| QcStatus::parse(&raw))
        .transpose()?;
    let filter = PurchaseFilter {
        purchase_id: query.purchase_id,
        supplier_id: non_blank(query.supplier_id),
        qc_status,
        ..Default::default()
    };

    let result = state.services.qc.list_purchases(filter, page).await?;
    Ok(Json(PurchaseList {
        purchases: result.items,
        pagination: result.pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/qc/purchases/{id}/devices",
    summary = "Devices of a purchase order",
    params(("id" = i32, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Per-device QC view", body = PurchaseDevices),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "qc"
)]
pub async fn purchase_devices(
    State(state): State<AppState>,
    ApiPath(purchase_id): ApiPath<i32>,
) -> Result<Json<PurchaseDevices>, ServiceError> {
    Ok(Json(state.services.qc.purchase_devices(purchase_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/qc/purchases/{id}/update",
    summary = "Apply a QC session",
    description = "Updates device color and grade, upserts QC records and optionally completes the whole purchase order",
    params(("id" = i32, Path, description = "Purchase order id")),
    request_body = QcBatchUpdate,
    responses(
        (status = 200, description = "QC applied", body = QcBatchResult),
        (status = 400, description = "Unknown grade or IMEI not in purchase", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "qc"
)]
pub async fn update_purchase_qc(
    State(state): State<AppState>,
    ApiPath(purchase_id): ApiPath<i32>,
    actor: Actor,
    ApiJson(payload): ApiJson<QcBatchUpdate>,
) -> Result<Json<QcBatchResult>, ServiceError> {
    let result = state
        .services
        .qc
        .update_purchase(purchase_id, payload, actor.as_str())
        .await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/qc/imei",
    summary = "List QC records",
    params(QcRecordQuery),
    responses(
        (status = 200, description = "QC records retrieved", body = QcRecordList),
        (status = 400, description = "Invalid status filter", body = crate::errors::ErrorResponse),
    ),
    tag = "qc"
)]
pub async fn list_qc_records(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<QcRecordQuery>,
) -> Result<Json<QcRecordList>, ServiceError> {
    let page = PaginationParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config)?;
    let status = non_blank(query.status)
        .map(|raw| QcResult::parse(&raw))
        .transpose()?;
    let search = non_blank(query.search);

    let result = state
        .services
        .qc
        .list_records(status, search.as_deref(), query.purchase_id, page)
        .await?;
    Ok(Json(QcRecordList {
        records: result.items,
        pagination: result.pagination,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/qc/imei",
    summary = "Record QC for one device",
    description = "Creates or updates the QC record for the device within the purchase order and marks the order QC-completed",
    request_body = RecordQcRequest,
    responses(
        (status = 201, description = "QC recorded", body = QcRecordView),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "qc"
)]
pub async fn record_qc(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(payload): ApiJson<RecordQcRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let record = state.services.qc.record(payload, actor.as_str()).await?;
    Ok(created_response(record))
}
