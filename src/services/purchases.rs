//! Purchase-order consolidation
//!
//! A purchase order is viewed through its lines: one grouped query per page
//! yields the header columns plus aggregates over the lines, so the device
//! count always equals the number of lines carrying that purchase id.

use crate::{
    entities::{purchase_line, purchase_order, supplier},
    errors::ServiceError,
    pagination::{Page, PageRequest},
};
use chrono::NaiveDate;
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, str::FromStr};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Aggregated QC state used by the QC queue filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum QcStatus {
    Pending,
    Completed,
}

impl QcStatus {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        QcStatus::from_str(raw.trim()).map_err(|_| {
            ServiceError::BadRequest(format!(
                "qcStatus must be 'pending' or 'completed', got '{raw}'"
            ))
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PurchaseFilter {
    pub purchase_id: Option<i32>,
    pub supplier_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Keep only orders with at least one QC-required line
    pub qc_only: bool,
    pub qc_status: Option<QcStatus>,
}

/// One purchase order as seen by goods-in and the QC queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseSummary {
    pub purchase_id: i32,
    pub date: NaiveDate,
    pub supplier_id: String,
    pub supplier_name: Option<String>,
    pub po_ref: Option<String>,
    pub device_count: i64,
    /// Any line requires QC
    pub qc_required: bool,
    /// Every line has completed QC
    pub qc_completed: bool,
    pub repair_required: bool,
    pub priority: i32,
}

#[derive(Debug, FromQueryResult)]
struct PurchaseGroupRow {
    id: i32,
    date: NaiveDate,
    supplier_id: String,
    po_ref: Option<String>,
    device_count: i64,
    qc_required_lines: Option<i64>,
    qc_completed_lines: Option<i64>,
    repair_required_lines: Option<i64>,
    priority: Option<i32>,
}

impl PurchaseGroupRow {
    fn into_summary(self, supplier_names: &HashMap<String, String>) -> PurchaseSummary {
        PurchaseSummary {
            purchase_id: self.id,
            date: self.date,
            supplier_name: supplier_names.get(&self.supplier_id).cloned(),
            supplier_id: self.supplier_id,
            po_ref: self.po_ref,
            device_count: self.device_count,
            qc_required: self.qc_required_lines.unwrap_or(0) > 0,
            qc_completed: self.device_count > 0
                && self.qc_completed_lines.unwrap_or(0) == self.device_count,
            repair_required: self.repair_required_lines.unwrap_or(0) > 0,
            priority: self.priority.unwrap_or(0),
        }
    }
}

fn line_col(column: purchase_line::Column) -> Expr {
    Expr::col((purchase_line::Entity, column))
}

/// `SUM(CASE WHEN <flag> THEN 1 ELSE 0 END)`
fn count_flag(column: purchase_line::Column) -> SimpleExpr {
    Func::sum(Expr::case(line_col(column).eq(true), 1).finally(0)).into()
}

fn device_count() -> SimpleExpr {
    Func::count(line_col(purchase_line::Column::Id)).into()
}

fn grouped_query(filter: &PurchaseFilter) -> Select<purchase_order::Entity> {
    let mut query = purchase_order::Entity::find()
        .select_only()
        .column(purchase_order::Column::Id)
        .column(purchase_order::Column::Date)
        .column(purchase_order::Column::SupplierId)
        .column(purchase_order::Column::PoRef)
        .column_as(device_count(), "device_count")
        .column_as(count_flag(purchase_line::Column::QcRequired), "qc_required_lines")
        .column_as(count_flag(purchase_line::Column::QcCompleted), "qc_completed_lines")
        .column_as(
            count_flag(purchase_line::Column::RepairRequired),
            "repair_required_lines",
        )
        .column_as(
            SimpleExpr::from(Func::max(line_col(purchase_line::Column::Priority))),
            "priority",
        )
        .join(JoinType::InnerJoin, purchase_order::Relation::Lines.def());

    if let Some(id) = filter.purchase_id {
        query = query.filter(purchase_order::Column::Id.eq(id));
    }
    if let Some(supplier_id) = filter.supplier_id.as_deref() {
        query = query.filter(purchase_order::Column::SupplierId.eq(supplier_id));
    }
    if let Some(from) = filter.date_from {
        query = query.filter(purchase_order::Column::Date.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(purchase_order::Column::Date.lte(to));
    }

    query = query
        .group_by(purchase_order::Column::Id)
        .group_by(purchase_order::Column::Date)
        .group_by(purchase_order::Column::SupplierId)
        .group_by(purchase_order::Column::PoRef);

    if filter.qc_only {
        query = query.having(Expr::expr(count_flag(purchase_line::Column::QcRequired)).gt(0));
    }
    match filter.qc_status {
        Some(QcStatus::Completed) => {
            query = query.having(
                Expr::expr(count_flag(purchase_line::Column::QcCompleted)).eq(device_count()),
            );
        }
        Some(QcStatus::Pending) => {
            query = query.having(
                Expr::expr(count_flag(purchase_line::Column::QcCompleted)).lt(device_count()),
            );
        }
        None => {}
    }

    query
        .order_by_desc(purchase_order::Column::Date)
        .order_by_desc(purchase_order::Column::Id)
}

/// Looks up supplier names for the given ids in one query.
pub async fn supplier_names<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<String>,
) -> Result<HashMap<String, String>, ServiceError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = supplier::Entity::find()
        .filter(supplier::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|s| (s.id, s.name)).collect())
}

/// Consolidates purchase lines into one summary per purchase id.
///
/// `totalCount` counts the groups, not the lines.
pub async fn consolidate<C: ConnectionTrait>(
    conn: &C,
    filter: &PurchaseFilter,
    page: PageRequest,
) -> Result<Page<PurchaseSummary>, ServiceError> {
    let paginator = grouped_query(filter)
        .into_model::<PurchaseGroupRow>()
        .paginate(conn, page.limit);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page.index()).await?;

    let mut supplier_ids: Vec<String> = rows.iter().map(|r| r.supplier_id.clone()).collect();
    supplier_ids.sort();
    supplier_ids.dedup();
    let names = supplier_names(conn, supplier_ids).await?;

    let items = rows
        .into_iter()
        .map(|row| row.into_summary(&names))
        .collect();
    Ok(Page::new(items, page, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn row(device_count: i64, completed: i64) -> PurchaseGroupRow {
        PurchaseGroupRow {
            id: 7,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            supplier_id: "SUP1".into(),
            po_ref: None,
            device_count,
            qc_required_lines: Some(1),
            qc_completed_lines: Some(completed),
            repair_required_lines: Some(0),
            priority: Some(2),
        }
    }

    #[test]
    fn order_is_completed_only_when_every_line_is() {
        let names = HashMap::from([("SUP1".to_string(), "Acme".to_string())]);
        let partial = row(3, 2).into_summary(&names);
        assert!(!partial.qc_completed);
        assert!(partial.qc_required);
        assert_eq!(partial.supplier_name.as_deref(), Some("Acme"));

        let done = row(3, 3).into_summary(&HashMap::new());
        assert!(done.qc_completed);
        assert_eq!(done.supplier_name, None);
    }

    #[test]
    fn qc_status_parses_case_insensitively() {
        assert_eq!(QcStatus::parse("Pending").unwrap(), QcStatus::Pending);
        assert_eq!(QcStatus::parse("completed").unwrap(), QcStatus::Completed);
        assert_matches!(QcStatus::parse("done"), Err(ServiceError::BadRequest(_)));
    }
}
