use crate::{
    db::DbPool,
    entities::{
        device::{self, StockStatus},
        purchase_line, purchase_order, qc_record,
    },
    errors::ServiceError,
    models::{imei::normalize_device_code, stored_grade_letter, Grade},
    pagination::{Page, PageRequest},
    services::{
        audit::{AuditEntry, AuditLog},
        catalog::{category_titles, resolve_title, tac_models},
        filters::{contains_ci, search_term},
        purchases::{self, PurchaseFilter, PurchaseSummary},
    },
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
    sync::Arc,
};
use strum::{Display, EnumString};
use tracing::{info, instrument};
use utoipa::ToSchema;

/// `status` filter of the QC record list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum QcResult {
    Passed,
    Failed,
}

impl QcResult {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        QcResult::from_str(raw.trim()).map_err(|_| {
            ServiceError::BadRequest(format!(
                "status must be 'passed' or 'failed', got '{raw}'"
            ))
        })
    }
}

/// Inspection outcome for one device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QcOutcome {
    pub cosmetic_passed: bool,
    pub functional_passed: bool,
    pub comments: Option<String>,
    pub flashed: bool,
    pub eu: bool,
}

/// Body of `POST /qc/imei`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecordQcRequest {
    pub purchase_id: i32,
    /// IMEI or item code
    #[serde(alias = "imei")]
    pub device_code: String,
    #[serde(alias = "cosmetic_passed")]
    pub cosmetic: bool,
    #[serde(alias = "functional_passed")]
    pub functional: bool,
    pub comments: Option<String>,
    pub flashed: Option<bool>,
    pub eu: Option<bool>,
}

impl RecordQcRequest {
    fn outcome(&self) -> QcOutcome {
        QcOutcome {
            cosmetic_passed: self.cosmetic,
            functional_passed: self.functional,
            comments: self.comments.clone(),
            flashed: self.flashed.unwrap_or(false),
            eu: self.eu.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QcRecordView {
    pub id: i32,
    pub purchase_id: i32,
    pub device_code: String,
    pub cosmetic_passed: bool,
    pub functional_passed: bool,
    /// Cosmetic and functional both passed
    pub passed: bool,
    pub comments: Option<String>,
    pub flashed: bool,
    pub eu: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<qc_record::Model> for QcRecordView {
    fn from(r: qc_record::Model) -> Self {
        Self {
            passed: r.passed(),
            id: r.id,
            purchase_id: r.purchase_id,
            device_code: r.device_code,
            cosmetic_passed: r.cosmetic_passed,
            functional_passed: r.functional_passed,
            comments: r.comments,
            flashed: r.flashed,
            eu: r.eu,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// One device of a purchase as shown on the QC screen
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QcDeviceView {
    pub line_id: i32,
    pub imei: String,
    pub tac: Option<String>,
    pub brand: Option<String>,
    pub brand_title: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub grade: Option<String>,
    pub storage: Option<String>,
    pub tray_id: Option<String>,
    pub status: Option<StockStatus>,
    pub qc_required: bool,
    pub qc_completed: bool,
    pub repair_required: bool,
    pub repair_completed: bool,
    pub qc: Option<QcRecordView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseDevices {
    pub purchase: PurchaseSummary,
    pub devices: Vec<QcDeviceView>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct QcDeviceUpdate {
    pub imei: String,
    pub color: Option<String>,
    pub grade: Option<Grade>,
    pub cosmetic: bool,
    pub functional: bool,
    pub comments: Option<String>,
    pub flashed: Option<bool>,
    pub eu: Option<bool>,
}

/// Body of `POST /qc/purchases/{id}/update`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct QcBatchUpdate {
    #[serde(default)]
    pub devices: Vec<QcDeviceUpdate>,
    #[serde(default, rename = "qcCompleted", alias = "qc_completed")]
    pub qc_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QcBatchResult {
    pub purchase_id: i32,
    /// Devices whose QC record was written
    pub updated: usize,
    /// Every line of the purchase has completed QC
    pub qc_completed: bool,
}

/// Inserts or updates the QC record for (`device_code`, `purchase_id`) in a
/// single statement.
pub async fn upsert_qc_record<C: ConnectionTrait>(
    conn: &C,
    purchase_id: i32,
    device_code: &str,
    outcome: QcOutcome,
) -> Result<qc_record::Model, ServiceError> {
    let now = Utc::now();
    qc_record::Entity::insert(qc_record::ActiveModel {
        purchase_id: Set(purchase_id),
        device_code: Set(device_code.to_string()),
        cosmetic_passed: Set(outcome.cosmetic_passed),
        functional_passed: Set(outcome.functional_passed),
        comments: Set(outcome.comments),
        flashed: Set(outcome.flashed),
        eu: Set(outcome.eu),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([qc_record::Column::DeviceCode, qc_record::Column::PurchaseId])
            .update_columns([
                qc_record::Column::CosmeticPassed,
                qc_record::Column::FunctionalPassed,
                qc_record::Column::Comments,
                qc_record::Column::Flashed,
                qc_record::Column::Eu,
                qc_record::Column::UpdatedAt,
            ])
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    qc_record::Entity::find()
        .filter(qc_record::Column::DeviceCode.eq(device_code))
        .filter(qc_record::Column::PurchaseId.eq(purchase_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::InternalError("QC record missing after upsert".into()))
}

/// Marks every line of the purchase as QC-completed.
pub async fn complete_purchase_qc<C: ConnectionTrait>(
    conn: &C,
    purchase_id: i32,
) -> Result<u64, ServiceError> {
    let result = purchase_line::Entity::update_many()
        .col_expr(purchase_line::Column::QcCompleted, Expr::value(true))
        .filter(purchase_line::Column::PurchaseId.eq(purchase_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

async fn require_purchase<C: ConnectionTrait>(
    conn: &C,
    purchase_id: i32,
) -> Result<purchase_order::Model, ServiceError> {
    purchase_order::Entity::find_by_id(purchase_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("purchase order {purchase_id}")))
}

/// Quality control: QC queue, per-device results and order completion
#[derive(Clone)]
pub struct QcService {
    db_pool: Arc<DbPool>,
    audit: AuditLog,
}

impl QcService {
    pub fn new(db_pool: Arc<DbPool>, audit: AuditLog) -> Self {
        Self { db_pool, audit }
    }

    /// Purchase orders with at least one line needing QC.
    #[instrument(skip(self))]
    pub async fn list_purchases(
        &self,
        mut filter: PurchaseFilter,
        page: PageRequest,
    ) -> Result<Page<PurchaseSummary>, ServiceError> {
        filter.qc_only = true;
        purchases::consolidate(&*self.db_pool, &filter, page).await
    }

    #[instrument(skip(self))]
    pub async fn list_records(
        &self,
        status: Option<QcResult>,
        search: Option<&str>,
        purchase_id: Option<i32>,
        page: PageRequest,
    ) -> Result<Page<QcRecordView>, ServiceError> {
        let mut query = qc_record::Entity::find();
        match status {
            Some(QcResult::Passed) => {
                query = query
                    .filter(qc_record::Column::CosmeticPassed.eq(true))
                    .filter(qc_record::Column::FunctionalPassed.eq(true));
            }
            Some(QcResult::Failed) => {
                query = query.filter(
                    Condition::any()
                        .add(qc_record::Column::CosmeticPassed.eq(false))
                        .add(qc_record::Column::FunctionalPassed.eq(false)),
                );
            }
            None => {}
        }
        if let Some(term) = search_term(search) {
            query = query.filter(contains_ci(
                (qc_record::Entity, qc_record::Column::DeviceCode),
                term,
            ));
        }
        if let Some(id) = purchase_id {
            query = query.filter(qc_record::Column::PurchaseId.eq(id));
        }

        let paginator = query
            .order_by_desc(qc_record::Column::UpdatedAt)
            .order_by_desc(qc_record::Column::Id)
            .paginate(&*self.db_pool, page.limit);
        let total = paginator.num_items().await?;
        let records = paginator.fetch_page(page.index()).await?;

        Ok(Page::new(
            records.into_iter().map(QcRecordView::from).collect(),
            page,
            total,
        ))
    }

    /// Records one device's QC and completes the whole purchase order.
    #[instrument(skip(self, request), fields(purchase_id = request.purchase_id))]
    pub async fn record(
        &self,
        request: RecordQcRequest,
        actor: &str,
    ) -> Result<QcRecordView, ServiceError> {
        let device_code = normalize_device_code(&request.device_code)?;
        let outcome = request.outcome();
        let txn = self.db_pool.begin().await?;

        require_purchase(&txn, request.purchase_id).await?;
        let record = upsert_qc_record(&txn, request.purchase_id, &device_code, outcome).await?;
        complete_purchase_qc(&txn, request.purchase_id).await?;

        txn.commit().await?;

        info!(device_code = %record.device_code, passed = record.passed(), "QC recorded");
        self.audit
            .record(
                AuditEntry::new(
                    "qc",
                    format!(
                        "QC {} for {} (cosmetic: {}, functional: {})",
                        if record.passed() { "passed" } else { "failed" },
                        record.device_code,
                        record.cosmetic_passed,
                        record.functional_passed
                    ),
                    actor,
                )
                .with_ref(record.purchase_id),
            )
            .await;

        Ok(record.into())
    }

    /// Per-device view of one purchase order.
    #[instrument(skip(self))]
    pub async fn purchase_devices(&self, purchase_id: i32) -> Result<PurchaseDevices, ServiceError> {
        let db = &*self.db_pool;
        let filter = PurchaseFilter {
            purchase_id: Some(purchase_id),
            ..Default::default()
        };
        let purchase = purchases::consolidate(db, &filter, PageRequest { page: 1, limit: 1 })
            .await?
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound(format!("purchase order {purchase_id}")))?;

        let lines = purchase_line::Entity::find()
            .filter(purchase_line::Column::PurchaseId.eq(purchase_id))
            .order_by_asc(purchase_line::Column::Id)
            .all(db)
            .await?;
        let imeis: Vec<String> = lines.iter().map(|l| l.imei.clone()).collect();

        let devices: HashMap<String, device::Model> = device::Entity::find()
            .filter(device::Column::Imei.is_in(imeis.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|d| (d.imei.clone(), d))
            .collect();
        let mut records: HashMap<String, qc_record::Model> = qc_record::Entity::find()
            .filter(qc_record::Column::PurchaseId.eq(purchase_id))
            .all(db)
            .await?
            .into_iter()
            .map(|r| (r.device_code.clone(), r))
            .collect();
        let tacs = tac_models(db, devices.values().filter_map(|d| d.tac.clone())).await?;
        let titles = category_titles(db, tacs.values().map(|t| t.brand.clone())).await?;

        let devices = lines
            .into_iter()
            .map(|line| {
                let device = devices.get(&line.imei);
                let tac = device.and_then(|d| d.tac.clone());
                let tac_row = tac.as_ref().and_then(|t| tacs.get(t));
                QcDeviceView {
                    line_id: line.id,
                    tac,
                    brand: tac_row.map(|t| t.brand.clone()),
                    brand_title: tac_row.map(|t| resolve_title(&titles, &t.brand)),
                    model: tac_row.map(|t| t.model.clone()),
                    color: device.and_then(|d| d.color.clone()),
                    grade: device
                        .and_then(|d| stored_grade_letter(d.grade))
                        .map(str::to_string),
                    storage: device.and_then(|d| d.storage.clone()),
                    tray_id: line.tray_id.clone(),
                    status: device.map(|d| d.status),
                    qc_required: line.qc_required,
                    qc_completed: line.qc_completed,
                    repair_required: line.repair_required,
                    repair_completed: line.repair_completed,
                    qc: records.remove(&line.imei).map(QcRecordView::from),
                    imei: line.imei,
                }
            })
            .collect();

        Ok(PurchaseDevices { purchase, devices })
    }

    /// Applies a QC session to a purchase order in one transaction.
    ///
    /// Grades are parsed before anything is written; every IMEI must belong
    /// to the purchase.
    #[instrument(skip(self, update), fields(devices = update.devices.len(), qc_completed = update.qc_completed))]
    pub async fn update_purchase(
        &self,
        purchase_id: i32,
        update: QcBatchUpdate,
        actor: &str,
    ) -> Result<QcBatchResult, ServiceError> {
        let mut entries = Vec::with_capacity(update.devices.len());
        for device in update.devices {
            let imei = normalize_device_code(&device.imei)?;
            entries.push((imei, device));
        }

        let txn = self.db_pool.begin().await?;
        require_purchase(&txn, purchase_id).await?;

        let members: HashSet<String> = purchase_line::Entity::find()
            .filter(purchase_line::Column::PurchaseId.eq(purchase_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|l| l.imei)
            .collect();
        if let Some((imei, _)) = entries.iter().find(|(imei, _)| !members.contains(imei)) {
            return Err(ServiceError::BadRequest(format!(
                "IMEI {imei} is not part of purchase order {purchase_id}"
            )));
        }

        let now = Utc::now();
        for (imei, device) in &entries {
            if device.color.is_some() || device.grade.is_some() {
                let mut changes = device::Entity::update_many()
                    .col_expr(device::Column::UpdatedAt, Expr::value(now));
                if let Some(color) = &device.color {
                    changes = changes.col_expr(device::Column::Color, Expr::value(color.clone()));
                }
                if let Some(grade) = device.grade {
                    changes = changes.col_expr(device::Column::Grade, Expr::value(grade.code()));
                }
                changes
                    .filter(device::Column::Imei.eq(imei.as_str()))
                    .exec(&txn)
                    .await?;
            }

            let outcome = QcOutcome {
                cosmetic_passed: device.cosmetic,
                functional_passed: device.functional,
                comments: device.comments.clone(),
                flashed: device.flashed.unwrap_or(false),
                eu: device.eu.unwrap_or(false),
            };
            upsert_qc_record(&txn, purchase_id, imei, outcome).await?;
        }

        if update.qc_completed {
            complete_purchase_qc(&txn, purchase_id).await?;
        }
        let pending = purchase_line::Entity::find()
            .filter(purchase_line::Column::PurchaseId.eq(purchase_id))
            .filter(purchase_line::Column::QcCompleted.eq(false))
            .count(&txn)
            .await?;

        txn.commit().await?;

        let updated = entries.len();
        info!(purchase_id, updated, "QC batch applied");
        self.audit
            .record(
                AuditEntry::new(
                    "qc",
                    format!(
                        "QC updated for {updated} device(s){}",
                        if update.qc_completed {
                            ", order completed"
                        } else {
                            ""
                        }
                    ),
                    actor,
                )
                .with_ref(purchase_id),
            )
            .await;

        Ok(QcBatchResult {
            purchase_id,
            updated,
            qc_completed: !members.is_empty() && pending == 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_filter_accepts_known_values_only() {
        assert_eq!(QcResult::parse("passed").unwrap(), QcResult::Passed);
        assert_eq!(QcResult::parse("FAILED").unwrap(), QcResult::Failed);
        assert_matches!(QcResult::parse("pending"), Err(ServiceError::BadRequest(_)));
    }

    #[test]
    fn batch_body_accepts_camel_case_completion_flag() {
        let body: QcBatchUpdate = serde_json::from_value(serde_json::json!({
            "devices": [{"imei": "1", "grade": "b", "cosmetic": true, "functional": false}],
            "qcCompleted": true
        }))
        .unwrap();
        assert!(body.qc_completed);
        assert_eq!(body.devices[0].grade, Some(Grade::B));
    }

    #[test]
    fn batch_body_with_unknown_grade_is_rejected() {
        let parsed = serde_json::from_value::<QcBatchUpdate>(serde_json::json!({
            "devices": [{"imei": "1", "grade": "Q", "cosmetic": true, "functional": true}]
        }));
        assert!(parsed.is_err());
    }
}
