use crate::{
    db::DbPool,
    entities::customer,
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
pub struct CreateCustomerRequest {
    /// Natural customer id, e.g. `CUST001`
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

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    audit: AuditLog,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, audit: AuditLog) -> Self {
        Self { db_pool, audit }
    }

    /// Lists customers matching `search` on id, name or email, by name.
    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<customer::Model>, ServiceError> {
        let mut query = customer::Entity::find();
        if let Some(term) = search_term(search) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci((customer::Entity, customer::Column::Id), term))
                    .add(contains_ci((customer::Entity, customer::Column::Name), term))
                    .add(contains_ci((customer::Entity, customer::Column::Email), term)),
            );
        }

        let paginator = query
            .order_by_asc(customer::Column::Name)
            .order_by_asc(customer::Column::Id)
            .paginate(&*self.db_pool, page.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.index()).await?;

        Ok(Page::new(items, page, total))
    }

    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: &str) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id.to_string())
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("customer {id}")))
    }

    /// Creates a customer; an existing id is a conflict.
    #[instrument(skip(self, request), fields(customer_id = %request.id))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
        actor: &str,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let id = request.id.trim().to_string();
        let db = &*self.db_pool;

        if customer::Entity::find_by_id(id.clone()).one(db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("customer {id} already exists")));
        }

        let model = customer::ActiveModel {
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
        .map_err(|e| ServiceError::conflict_or_db(e, format!("customer {id} already exists")))?;

        info!(customer_id = %model.id, "customer created");
        self.audit
            .record(
                AuditEntry::new("customer", format!("Created customer {}", model.name), actor)
                    .with_ref(&model.id),
            )
            .await;

        Ok(model)
    }
}
