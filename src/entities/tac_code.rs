use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tac_codes")]
pub struct Model {
    /// First eight digits of an IMEI
    #[sea_orm(primary_key, auto_increment = false)]
    pub tac: String,
    /// Category code of the manufacturer
    pub brand: String,
    pub model: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
