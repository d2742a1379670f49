use crate::{
    db::DbPool,
    entities::{category, tac_code, tray},
    errors::ServiceError,
    models::imei::require_tac,
    services::filters::{contains_ci, search_term},
};
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::instrument;
use utoipa::ToSchema;

/// Manufacturer and model resolved from an IMEI
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TacLookup {
    pub tac: String,
    /// Category code of the manufacturer
    pub brand: String,
    /// Category title, or the raw code when no category matches
    pub brand_title: String,
    pub model: String,
}

/// Read-only reference data: categories, trays and TAC codes
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<category::Model>, ServiceError> {
        let mut query = category::Entity::find();
        if let Some(term) = search_term(search) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci((category::Entity, category::Column::Code), term))
                    .add(contains_ci((category::Entity, category::Column::Title), term)),
            );
        }
        let categories = query
            .order_by_asc(category::Column::Title)
            .order_by_asc(category::Column::Code)
            .all(&*self.db_pool)
            .await?;
        Ok(categories)
    }

    #[instrument(skip(self))]
    pub async fn list_trays(&self, search: Option<&str>) -> Result<Vec<tray::Model>, ServiceError> {
        let mut query = tray::Entity::find();
        if let Some(term) = search_term(search) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci((tray::Entity, tray::Column::Id), term))
                    .add(contains_ci((tray::Entity, tray::Column::Name), term)),
            );
        }
        let trays = query
            .order_by_asc(tray::Column::Id)
            .all(&*self.db_pool)
            .await?;
        Ok(trays)
    }

    #[instrument(skip(self))]
    pub async fn lookup_tac(&self, imei: &str) -> Result<TacLookup, ServiceError> {
        let tac = require_tac(imei)?;
        let db = &*self.db_pool;

        let row = tac_code::Entity::find_by_id(tac.clone())
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("TAC {tac} is not known")))?;

        let titles = category_titles(db, [row.brand.clone()]).await?;
        Ok(TacLookup {
            brand_title: resolve_title(&titles, &row.brand),
            tac: row.tac,
            brand: row.brand,
            model: row.model,
        })
    }
}

/// Maps category codes to titles for the given codes.
pub async fn category_titles<C, I>(conn: &C, codes: I) -> Result<HashMap<String, String>, ServiceError>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = String>,
{
    let mut codes: Vec<String> = codes.into_iter().collect();
    codes.sort();
    codes.dedup();
    if codes.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = category::Entity::find()
        .filter(category::Column::Code.is_in(codes))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|c| (c.code, c.title)).collect())
}

/// Loads TAC rows keyed by TAC.
pub async fn tac_models<C, I>(conn: &C, tacs: I) -> Result<HashMap<String, tac_code::Model>, ServiceError>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = String>,
{
    let mut tacs: Vec<String> = tacs.into_iter().collect();
    tacs.sort();
    tacs.dedup();
    if tacs.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = tac_code::Entity::find()
        .filter(tac_code::Column::Tac.is_in(tacs))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|t| (t.tac.clone(), t)).collect())
}

/// Unresolved codes pass through unchanged.
pub fn resolve_title(titles: &HashMap<String, String>, code: &str) -> String {
    titles
        .get(code)
        .cloned()
        .unwrap_or_else(|| code.to_string())
}
