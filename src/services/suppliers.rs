use crate::{
    db::DbPool,
    entities::supplier,
    errors::ServiceError,
    pagination::{Page, PageRequest},
    services::{
        audit::{AuditEntry, AuditLog},
        filters::{contains_ci, search_term},
    },
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateSupplierRequest {
    /// Natural supplier id, e.g. `SUP1`
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
    audit: AuditLog,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>, audit: AuditLog) -> Self {
        Self { db_pool, audit }
    }

    /// Lists suppliers matching `search` on id, name or email, by name.
    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<supplier::Model>, ServiceError> {
        let mut query = supplier::Entity::find();
        if let Some(term) = search_term(search) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci((supplier::Entity, supplier::Column::Id), term))
                    .add(contains_ci((supplier::Entity, supplier::Column::Name), term))
                    .add(contains_ci((supplier::Entity, supplier::Column::Email), term)),
            );
        }

        let paginator = query
            .order_by_asc(supplier::Column::Name)
            .order_by_asc(supplier::Column::Id)
            .paginate(&*self.db_pool, page.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;

        Ok(Page::new(items, page, total))
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(&self, id: &str) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(id.to_string())
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("supplier {id}")))
    }

    /// Creates a supplier; an existing id is a conflict.
    #[instrument(skip(self, request), fields(supplier_id = %request.id))]
    pub async fn create_supplier(
        &self,
        request: CreateSupplierRequest,
        actor: &str,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;
        let id = request.id.trim().to_string();
        let db = &*self.db_pool;

        if supplier::Entity::find_by_id(id.clone()).one(db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("supplier {id} already exists")));
        }

        let model = supplier::ActiveModel {
            id: Set(id.clone()),
            name: Set(request.name.trim().to_string()),
            contact_name: Set(request.contact_name),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::conflict_or_db(e, format!("supplier {id} already exists")))?;

        info!(supplier_id = %model.id, "supplier created");
        self.audit
            .record(
                AuditEntry::new("supplier", format!("Created supplier {}", model.name), actor)
                    .with_ref(&model.id),
            )
            .await;

        Ok(model)
    }
}
