use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// QC outcome for one device within one purchase order; unique per
/// (`device_code`, `purchase_id`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = QcRecord)]
#[sea_orm(table_name = "qc_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub purchase_id: i32,
    /// IMEI or item code
    pub device_code: String,
    pub cosmetic_passed: bool,
    pub functional_passed: bool,
    pub comments: Option<String>,
    pub flashed: bool,
    pub eu: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn passed(&self) -> bool {
        self.cosmetic_passed && self.functional_passed
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
