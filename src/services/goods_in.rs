use crate::{
    db::DbPool,
    entities::{
        device::{self, StockStatus},
        purchase_line, purchase_order, supplier,
    },
    errors::ServiceError,
    models::{
        imei::{normalize_device_code, tac_of},
        stored_grade_letter, Grade,
    },
    pagination::{Page, PageRequest},
    services::{
        audit::{AuditEntry, AuditLog},
        purchases::{self, PurchaseFilter, PurchaseSummary},
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct GoodsInDevice {
    pub imei: String,
    pub color: Option<String>,
    pub grade: Option<Grade>,
    pub storage: Option<String>,
    /// Overrides the batch tray for this device
    pub tray: Option<String>,
}

/// Body of `POST /goods-in/submit`
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct GoodsInSubmission {
    pub date: NaiveDate,
    #[validate(length(min = 1))]
    pub supplier_id: String,
    #[serde(default)]
    pub qc_required: bool,
    #[serde(default)]
    pub repair_required: bool,
    #[serde(default)]
    pub priority: Option<i32>,
    pub po_ref: Option<String>,
    pub tray_id: Option<String>,
    #[validate(length(min = 1))]
    pub devices: Vec<GoodsInDevice>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceView {
    pub id: i32,
    pub imei: String,
    pub tac: Option<String>,
    pub color: Option<String>,
    /// Grade letter, null when ungraded
    pub grade: Option<String>,
    pub storage: Option<String>,
    pub status: StockStatus,
    pub purchase_id: Option<i32>,
    pub tray_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<device::Model> for DeviceView {
    fn from(d: device::Model) -> Self {
        Self {
            id: d.id,
            grade: stored_grade_letter(d.grade).map(str::to_string),
            imei: d.imei,
            tac: d.tac,
            color: d.color,
            storage: d.storage,
            status: d.status,
            purchase_id: d.purchase_id,
            tray_id: d.tray_id,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurchaseLineView {
    pub id: i32,
    pub purchase_id: i32,
    pub imei: String,
    pub qc_required: bool,
    pub qc_completed: bool,
    pub repair_required: bool,
    pub repair_completed: bool,
    pub priority: i32,
    pub tray_id: Option<String>,
}

impl From<purchase_line::Model> for PurchaseLineView {
    fn from(l: purchase_line::Model) -> Self {
        Self {
            id: l.id,
            purchase_id: l.purchase_id,
            imei: l.imei,
            qc_required: l.qc_required,
            qc_completed: l.qc_completed,
            repair_required: l.repair_required,
            repair_completed: l.repair_completed,
            priority: l.priority,
            tray_id: l.tray_id,
        }
    }
}

/// Result of a goods-in submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GoodsInReceipt {
    pub purchase_id: i32,
    pub devices: Vec<DeviceView>,
    pub lines: Vec<PurchaseLineView>,
}

/// Columns overwritten when a known IMEI is received again. Attributes the
/// submission leaves out keep their stored values.
fn refreshed_columns(device: &GoodsInDevice) -> Vec<device::Column> {
    let mut columns = vec![
        device::Column::Tac,
        device::Column::Status,
        device::Column::PurchaseId,
        device::Column::TrayId,
        device::Column::UpdatedAt,
    ];
    if device.color.is_some() {
        columns.push(device::Column::Color);
    }
    if device.grade.is_some() {
        columns.push(device::Column::Grade);
    }
    if device.storage.is_some() {
        columns.push(device::Column::Storage);
    }
    columns
}

/// Receiving: creates purchase orders and their device rows
#[derive(Clone)]
pub struct GoodsInService {
    db_pool: Arc<DbPool>,
    audit: AuditLog,
}

impl GoodsInService {
    pub fn new(db_pool: Arc<DbPool>, audit: AuditLog) -> Self {
        Self { db_pool, audit }
    }

    #[instrument(skip(self))]
    pub async fn list_purchases(
        &self,
        filter: PurchaseFilter,
        page: PageRequest,
    ) -> Result<Page<PurchaseSummary>, ServiceError> {
        purchases::consolidate(&*self.db_pool, &filter, page).await
    }

    /// Receives a batch of devices under a new purchase id.
    ///
    /// Header, device upserts and lines are written in one transaction.
    #[instrument(skip(self, submission), fields(supplier_id = %submission.supplier_id, devices = submission.devices.len()))]
    pub async fn submit(
        &self,
        submission: GoodsInSubmission,
        actor: &str,
    ) -> Result<GoodsInReceipt, ServiceError> {
        submission.validate()?;

        let mut seen = HashSet::new();
        let mut devices = Vec::with_capacity(submission.devices.len());
        for device in &submission.devices {
            let imei = normalize_device_code(&device.imei)?;
            if !seen.insert(imei.clone()) {
                return Err(ServiceError::BadRequest(format!(
                    "IMEI {imei} appears more than once in the submission"
                )));
            }
            devices.push((imei, device));
        }

        let supplier_id = submission.supplier_id.trim().to_string();
        let txn = self.db_pool.begin().await?;

        if supplier::Entity::find_by_id(supplier_id.clone())
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!("supplier {supplier_id}")));
        }

        let now = Utc::now();
        let header = purchase_order::ActiveModel {
            date: Set(submission.date),
            supplier_id: Set(supplier_id.clone()),
            po_ref: Set(submission.po_ref.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        let purchase_id = header.id;

        let mut lines = Vec::with_capacity(devices.len());
        let mut imeis = Vec::with_capacity(devices.len());
        for (imei, device) in devices {
            let tray_id = device.tray.clone().or_else(|| submission.tray_id.clone());

            device::Entity::insert(device::ActiveModel {
                imei: Set(imei.clone()),
                tac: Set(tac_of(&imei)),
                color: Set(device.color.clone()),
                grade: Set(device.grade.map(Grade::code).unwrap_or(0)),
                storage: Set(device.storage.clone()),
                status: Set(StockStatus::In),
                purchase_id: Set(Some(purchase_id)),
                tray_id: Set(tray_id.clone()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            })
            .on_conflict(
                OnConflict::column(device::Column::Imei)
                    .update_columns(refreshed_columns(device))
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

            let line = purchase_line::ActiveModel {
                purchase_id: Set(purchase_id),
                imei: Set(imei.clone()),
                qc_required: Set(submission.qc_required),
                qc_completed: Set(false),
                repair_required: Set(submission.repair_required),
                repair_completed: Set(false),
                priority: Set(submission.priority.unwrap_or(0)),
                tray_id: Set(tray_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            lines.push(PurchaseLineView::from(line));
            imeis.push(imei);
        }

        let mut stored = device::Entity::find()
            .filter(device::Column::Imei.is_in(imeis.clone()))
            .all(&txn)
            .await?;
        stored.sort_by_key(|d| imeis.iter().position(|i| *i == d.imei));

        txn.commit().await?;

        info!(purchase_id, devices = lines.len(), "goods-in submitted");
        self.audit
            .record(
                AuditEntry::new(
                    "goods-in",
                    format!(
                        "Received {} device(s) from supplier {} on {}",
                        lines.len(),
                        supplier_id,
                        submission.date
                    ),
                    actor,
                )
                .with_ref(purchase_id),
            )
            .await;

        Ok(GoodsInReceipt {
            purchase_id,
            devices: stored.into_iter().map(DeviceView::from).collect(),
            lines,
        })
    }
}
