//! Goods-out: sales orders and their line grouping

use crate::{
    db::DbPool,
    entities::{
        customer,
        device::{self, StockStatus},
        sales_order, sales_order_line,
    },
    errors::ServiceError,
    models::{stored_grade_letter, Grade},
    pagination::{Page, PageRequest},
    services::{
        audit::{AuditEntry, AuditLog},
        catalog::category_titles,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    IntoActiveModel, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Default)]
pub struct SalesOrderFilter {
    pub order_id: Option<i32>,
    pub customer_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// One sales order in the goods-out list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesOrderSummary {
    pub order_id: i32,
    /// Earliest line date, or the order's creation date when no line has one
    pub date: NaiveDate,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub customer_ref: Option<String>,
    pub po_ref: Option<String>,
    pub dispatch_id: Option<String>,
    pub item_count: i64,
    pub completed_count: i64,
    pub is_completed: bool,
}

/// Lines sharing brand, details, color, grade and storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineGroup {
    pub brand: Option<String>,
    pub brand_title: Option<String>,
    pub details: Option<String>,
    pub color: Option<String>,
    pub grade: Option<String>,
    pub storage: Option<String>,
    pub quantity: usize,
    pub completed: usize,
    pub item_ids: Vec<i32>,
    pub imeis: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesOrderDetail {
    pub order_id: i32,
    pub date: NaiveDate,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub customer_ref: Option<String>,
    pub po_ref: Option<String>,
    pub dispatch_id: Option<String>,
    pub total_quantity: usize,
    pub completed_quantity: usize,
    pub lines: Vec<LineGroup>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct NewSalesLine {
    /// Category code
    pub brand: Option<String>,
    pub details: Option<String>,
    pub color: Option<String>,
    pub grade: Option<Grade>,
    pub storage: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub quantity: u32,
}

/// Body of `POST /sales-orders`
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateSalesOrderRequest {
    #[validate(length(min = 1))]
    pub customer_id: String,
    pub customer_ref: Option<String>,
    pub po_ref: Option<String>,
    pub dispatch_id: Option<String>,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1))]
    pub lines: Vec<NewSalesLine>,
}

/// Body of `PUT /sales-orders/{id}/items/{itemId}`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateSalesItemRequest {
    /// Device to allocate; omitted keeps the current allocation
    pub imei: Option<String>,
    #[serde(alias = "isCompleted")]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesOrderItemView {
    pub id: i32,
    pub order_id: i32,
    pub date: Option<NaiveDate>,
    pub brand: Option<String>,
    pub details: Option<String>,
    pub color: Option<String>,
    pub grade: Option<String>,
    pub storage: Option<String>,
    pub imei: Option<String>,
    pub is_completed: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<sales_order_line::Model> for SalesOrderItemView {
    fn from(l: sales_order_line::Model) -> Self {
        Self {
            id: l.id,
            order_id: l.order_id,
            date: l.date,
            brand: l.brand,
            details: l.details,
            color: l.color,
            grade: l.grade.and_then(stored_grade_letter).map(str::to_string),
            storage: l.storage,
            imei: l.imei,
            is_completed: l.is_completed,
            updated_at: l.updated_at,
        }
    }
}

/// Normalized grouping key. Text parts are trimmed and lowercased, blanks
/// become `None`; grade 0 counts as ungraded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    brand: Option<String>,
    details: Option<String>,
    color: Option<String>,
    grade: Option<i32>,
    storage: Option<String>,
}

fn normalize(part: Option<&str>) -> Option<String> {
    part.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn display(part: Option<&str>) -> Option<String> {
    part.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl LineKey {
    pub fn of(line: &sales_order_line::Model) -> Self {
        Self {
            brand: normalize(line.brand.as_deref()),
            details: normalize(line.details.as_deref()),
            color: normalize(line.color.as_deref()),
            grade: line.grade.filter(|g| *g != 0),
            storage: normalize(line.storage.as_deref()),
        }
    }
}

/// Groups order lines by [`LineKey`] in first-seen order. Display values
/// come from the first line of each group.
pub fn group_lines(lines: &[sales_order_line::Model]) -> Vec<LineGroup> {
    let mut index: HashMap<LineKey, usize> = HashMap::new();
    let mut groups: Vec<LineGroup> = Vec::new();

    for line in lines {
        let slot = *index.entry(LineKey::of(line)).or_insert_with(|| {
            groups.push(LineGroup {
                brand: display(line.brand.as_deref()),
                brand_title: None,
                details: display(line.details.as_deref()),
                color: display(line.color.as_deref()),
                grade: line
                    .grade
                    .and_then(stored_grade_letter)
                    .map(str::to_string),
                storage: display(line.storage.as_deref()),
                quantity: 0,
                completed: 0,
                item_ids: Vec::new(),
                imeis: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.quantity += 1;
        if line.is_completed {
            group.completed += 1;
        }
        group.item_ids.push(line.id);
        if let Some(imei) = &line.imei {
            group.imeis.push(imei.clone());
        }
    }

    groups
}

#[derive(Debug, FromQueryResult)]
struct SalesOrderGroupRow {
    id: i32,
    customer_id: String,
    customer_ref: Option<String>,
    po_ref: Option<String>,
    dispatch_id: Option<String>,
    created_at: DateTime<Utc>,
    order_date: Option<NaiveDate>,
    item_count: i64,
    completed_count: Option<i64>,
}

fn line_col(column: sales_order_line::Column) -> Expr {
    Expr::col((sales_order_line::Entity, column))
}

fn order_date() -> SimpleExpr {
    Func::min(line_col(sales_order_line::Column::Date)).into()
}

fn grouped_query(filter: &SalesOrderFilter) -> Select<sales_order::Entity> {
    let mut query = sales_order::Entity::find()
        .select_only()
        .column(sales_order::Column::Id)
        .column(sales_order::Column::CustomerId)
        .column(sales_order::Column::CustomerRef)
        .column(sales_order::Column::PoRef)
        .column(sales_order::Column::DispatchId)
        .column(sales_order::Column::CreatedAt)
        .column_as(order_date(), "order_date")
        .column_as(
            SimpleExpr::from(Func::count(line_col(sales_order_line::Column::Id))),
            "item_count",
        )
        .column_as(
            SimpleExpr::from(Func::sum(
                Expr::case(line_col(sales_order_line::Column::IsCompleted).eq(true), 1).finally(0),
            )),
            "completed_count",
        )
        .join(JoinType::LeftJoin, sales_order::Relation::Lines.def());

    if let Some(id) = filter.order_id {
        query = query.filter(sales_order::Column::Id.eq(id));
    }
    if let Some(customer_id) = filter.customer_id.as_deref() {
        query = query.filter(sales_order::Column::CustomerId.eq(customer_id));
    }

    query = query
        .group_by(sales_order::Column::Id)
        .group_by(sales_order::Column::CustomerId)
        .group_by(sales_order::Column::CustomerRef)
        .group_by(sales_order::Column::PoRef)
        .group_by(sales_order::Column::DispatchId)
        .group_by(sales_order::Column::CreatedAt);

    // Date filters apply to the derived order date
    let created_at = Expr::col((sales_order::Entity, sales_order::Column::CreatedAt));
    if let Some(from) = filter.date_from {
        let from_ts = from.and_time(chrono::NaiveTime::MIN).and_utc();
        query = query.having(
            Condition::any()
                .add(Expr::expr(order_date()).gte(from))
                .add(
                    Condition::all()
                        .add(Expr::expr(order_date()).is_null())
                        .add(created_at.clone().gte(from_ts)),
                ),
        );
    }
    if let Some(to) = filter.date_to {
        let until = to
            .succ_opt()
            .unwrap_or(to)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        query = query.having(
            Condition::any()
                .add(Expr::expr(order_date()).lte(to))
                .add(
                    Condition::all()
                        .add(Expr::expr(order_date()).is_null())
                        .add(created_at.lt(until)),
                ),
        );
    }

    query
        .order_by_desc(sales_order::Column::CreatedAt)
        .order_by_desc(sales_order::Column::Id)
}

async fn customer_names<C: ConnectionTrait>(
    conn: &C,
    mut ids: Vec<String>,
) -> Result<HashMap<String, String>, ServiceError> {
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = customer::Entity::find()
        .filter(customer::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|c| (c.id, c.name)).collect())
}

/// Category titles keyed by lowercased code, so line brands match
/// regardless of case.
async fn brand_titles<C: ConnectionTrait>(
    conn: &C,
    groups: &[LineGroup],
) -> Result<HashMap<String, String>, ServiceError> {
    let codes = groups
        .iter()
        .filter_map(|g| g.brand.as_deref())
        .flat_map(|b| [b.to_string(), b.to_uppercase()]);
    let titles = category_titles(conn, codes).await?;
    Ok(titles
        .into_iter()
        .map(|(code, title)| (code.to_lowercase(), title))
        .collect())
}

async fn set_device_status<C: ConnectionTrait>(
    conn: &C,
    imei: &str,
    status: StockStatus,
) -> Result<(), ServiceError> {
    device::Entity::update_many()
        .col_expr(device::Column::Status, Expr::value(status.to_string()))
        .col_expr(device::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(device::Column::Imei.eq(imei))
        .exec(conn)
        .await?;
    Ok(())
}

/// Service for sales orders and their fulfilment
#[derive(Clone)]
pub struct SalesOrderService {
    db_pool: Arc<DbPool>,
    audit: AuditLog,
}

impl SalesOrderService {
    pub fn new(db_pool: Arc<DbPool>, audit: AuditLog) -> Self {
        Self { db_pool, audit }
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: SalesOrderFilter,
        page: PageRequest,
    ) -> Result<Page<SalesOrderSummary>, ServiceError> {
        let db = &*self.db_pool;
        let paginator = grouped_query(&filter)
            .into_model::<SalesOrderGroupRow>()
            .paginate(db, page.limit);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.index()).await?;

        let names = customer_names(db, rows.iter().map(|r| r.customer_id.clone()).collect()).await?;
        let items = rows
            .into_iter()
            .map(|row| {
                let completed_count = row.completed_count.unwrap_or(0);
                SalesOrderSummary {
                    order_id: row.id,
                    date: row.order_date.unwrap_or_else(|| row.created_at.date_naive()),
                    customer_name: names.get(&row.customer_id).cloned(),
                    customer_id: row.customer_id,
                    customer_ref: row.customer_ref,
                    po_ref: row.po_ref,
                    dispatch_id: row.dispatch_id,
                    item_count: row.item_count,
                    completed_count,
                    is_completed: row.item_count > 0 && completed_count == row.item_count,
                }
            })
            .collect();

        Ok(Page::new(items, page, total))
    }

    /// Order-level view with lines merged by characteristics.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i32) -> Result<SalesOrderDetail, ServiceError> {
        let db = &*self.db_pool;
        let header = sales_order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("sales order {order_id}")))?;

        let lines = sales_order_line::Entity::find()
            .filter(sales_order_line::Column::OrderId.eq(order_id))
            .order_by_asc(sales_order_line::Column::Id)
            .all(db)
            .await?;

        let mut groups = group_lines(&lines);
        let titles = brand_titles(db, &groups).await?;
        for group in &mut groups {
            group.brand_title = group.brand.as_deref().map(|b| {
                titles
                    .get(&b.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| b.to_string())
            });
        }

        let customer_name = customer::Entity::find_by_id(header.customer_id.clone())
            .one(db)
            .await?
            .map(|c| c.name);
        let date = lines
            .iter()
            .filter_map(|l| l.date)
            .min()
            .unwrap_or_else(|| header.created_at.date_naive());

        Ok(SalesOrderDetail {
            order_id: header.id,
            date,
            customer_id: header.customer_id,
            customer_name,
            customer_ref: header.customer_ref,
            po_ref: header.po_ref,
            dispatch_id: header.dispatch_id,
            total_quantity: lines.len(),
            completed_quantity: lines.iter().filter(|l| l.is_completed).count(),
            lines: groups,
        })
    }

    /// Creates the order header and `quantity` lines per entry.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_order(
        &self,
        request: CreateSalesOrderRequest,
        actor: &str,
    ) -> Result<SalesOrderDetail, ServiceError> {
        request.validate()?;
        for line in &request.lines {
            line.validate()?;
        }

        let customer_id = request.customer_id.trim().to_string();
        let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
        let txn = self.db_pool.begin().await?;

        if customer::Entity::find_by_id(customer_id.clone())
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!("customer {customer_id}")));
        }

        let now = Utc::now();
        let header = sales_order::ActiveModel {
            customer_id: Set(customer_id.clone()),
            customer_ref: Set(request.customer_ref),
            po_ref: Set(request.po_ref),
            dispatch_id: Set(request.dispatch_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut rows = Vec::new();
        for line in &request.lines {
            for _ in 0..line.quantity {
                rows.push(sales_order_line::ActiveModel {
                    order_id: Set(header.id),
                    date: Set(Some(date)),
                    brand: Set(display(line.brand.as_deref())),
                    details: Set(display(line.details.as_deref())),
                    color: Set(display(line.color.as_deref())),
                    grade: Set(line.grade.map(Grade::code)),
                    storage: Set(display(line.storage.as_deref())),
                    imei: Set(None),
                    is_completed: Set(false),
                    updated_at: Set(now),
                    ..Default::default()
                });
            }
        }
        let quantity = rows.len();
        sales_order_line::Entity::insert_many(rows)
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        info!(order_id = header.id, quantity, "sales order created");
        self.audit
            .record(
                AuditEntry::new(
                    "sales-order",
                    format!("Created sales order for {customer_id} with {quantity} item(s)"),
                    actor,
                )
                .with_ref(header.id),
            )
            .await;

        self.get_order(header.id).await
    }

    /// Allocates a device to an order item and/or toggles its completion.
    ///
    /// Completing an item takes its device out of stock; reopening it puts
    /// the device back.
    #[instrument(skip(self, request), fields(is_completed = request.is_completed))]
    pub async fn update_item(
        &self,
        order_id: i32,
        item_id: i32,
        request: UpdateSalesItemRequest,
        actor: &str,
    ) -> Result<SalesOrderItemView, ServiceError> {
        let requested_imei = request
            .imei
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let txn = self.db_pool.begin().await?;

        let line = sales_order_line::Entity::find_by_id(item_id)
            .filter(sales_order_line::Column::OrderId.eq(order_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("item {item_id} on sales order {order_id}"))
            })?;

        let previous = line.imei.clone();
        let allocated = requested_imei.clone().or_else(|| previous.clone());
        if request.is_completed && allocated.is_none() {
            return Err(ServiceError::BadRequest(
                "an IMEI must be allocated before the item can be completed".into(),
            ));
        }

        if let Some(imei) = &allocated {
            let device = device::Entity::find()
                .filter(device::Column::Imei.eq(imei.as_str()))
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("device {imei}")))?;

            // Open lines reserve their device
            let held_by = sales_order_line::Entity::find()
                .filter(sales_order_line::Column::Imei.eq(imei.as_str()))
                .filter(sales_order_line::Column::Id.ne(item_id))
                .filter(sales_order_line::Column::IsCompleted.eq(false))
                .one(&txn)
                .await?;
            if let Some(other) = held_by {
                return Err(ServiceError::Conflict(format!(
                    "device {imei} is already allocated to item {} on sales order {}",
                    other.id, other.order_id
                )));
            }

            let shipped_here = line.is_completed && previous.as_deref() == Some(imei.as_str());
            if device.status == StockStatus::Out && !shipped_here {
                return Err(ServiceError::Conflict(format!(
                    "device {imei} is not in stock"
                )));
            }
        }

        // A replaced device that had been shipped on this line returns to stock
        if let (Some(prev), Some(new)) = (&previous, &requested_imei) {
            if prev != new && line.is_completed {
                set_device_status(&txn, prev, StockStatus::In).await?;
            }
        }

        let was_completed = line.is_completed;
        let mut active = line.into_active_model();
        active.imei = Set(allocated.clone());
        active.is_completed = Set(request.is_completed);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        if let Some(imei) = &allocated {
            let status = if request.is_completed {
                StockStatus::Out
            } else {
                StockStatus::In
            };
            set_device_status(&txn, imei, status).await?;
        }

        txn.commit().await?;

        info!(order_id, item_id, "sales order item updated");
        let action = match (was_completed, request.is_completed) {
            (false, true) => "completed",
            (true, false) => "reopened",
            _ => "updated",
        };
        self.audit
            .record(
                AuditEntry::new(
                    "goods-out",
                    format!(
                        "Item {item_id} {action}{}",
                        allocated
                            .as_deref()
                            .map(|imei| format!(" with device {imei}"))
                            .unwrap_or_default()
                    ),
                    actor,
                )
                .with_ref(order_id),
            )
            .await;

        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, storage: &str, color: Option<&str>) -> sales_order_line::Model {
        sales_order_line::Model {
            id,
            order_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 2, 1),
            brand: Some("APL".into()),
            details: Some("iPhone 12".into()),
            color: color.map(str::to_string),
            grade: Some(2),
            storage: Some(storage.into()),
            imei: None,
            is_completed: false,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn identical_lines_collapse_and_storage_splits() {
        let lines = vec![
            line(1, "64GB", Some("Black")),
            line(2, "64GB", Some("Black")),
            line(3, "128GB", Some("Black")),
        ];
        let groups = group_lines(&lines);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].quantity, 2);
        assert_eq!(groups[0].item_ids, vec![1, 2]);
        assert_eq!(groups[1].quantity, 1);
        assert_eq!(groups[1].storage.as_deref(), Some("128GB"));
        assert_eq!(groups[0].grade.as_deref(), Some("B"));
        assert_eq!(
            groups.iter().map(|g| g.quantity).sum::<usize>(),
            lines.len()
        );
    }

    #[test]
    fn formatting_differences_do_not_split_groups() {
        let lines = vec![
            line(1, "64GB", Some("Black")),
            line(2, " 64gb ", Some("black")),
            line(3, "64GB", Some("  ")),
            line(4, "64GB", None),
        ];
        let groups = group_lines(&lines);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].quantity, 2);
        assert_eq!(groups[0].color.as_deref(), Some("Black"));
        assert_eq!(groups[1].quantity, 2);
        assert_eq!(groups[1].color, None);
    }

    #[test]
    fn ungraded_matches_missing_grade() {
        let mut zero = line(1, "64GB", None);
        zero.grade = Some(0);
        let mut none = line(2, "64GB", None);
        none.grade = None;
        assert_eq!(LineKey::of(&zero), LineKey::of(&none));
    }

    #[test]
    fn completed_lines_are_counted_per_group() {
        let mut done = line(1, "64GB", None);
        done.is_completed = true;
        done.imei = Some("356938035643809".into());
        let groups = group_lines(&[done, line(2, "64GB", None)]);
        assert_eq!(groups[0].completed, 1);
        assert_eq!(groups[0].imeis, vec!["356938035643809".to_string()]);
    }
}
