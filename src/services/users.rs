use crate::{
    db::DbPool,
    entities::user,
    errors::ServiceError,
    services::audit::{AuditEntry, AuditLog},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Body of `POST /user/change-password`
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub user_id: i32,
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Hashes a password into an argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, phc: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| ServiceError::InternalError(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    audit: AuditLog,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>, audit: AuditLog) -> Self {
        Self { db_pool, audit }
    }

    #[instrument(skip(self, request), fields(user_id = request.user_id))]
    pub async fn change_password(
        &self,
        request: ChangePasswordRequest,
        actor: &str,
    ) -> Result<(), ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        let user = user::Entity::find_by_id(request.user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", request.user_id)))?;

        if !verify_password(&request.current_password, &user.password_hash)? {
            warn!(user_id = user.id, "password change rejected: wrong current password");
            return Err(ServiceError::Unauthorized(
                "current password is incorrect".into(),
            ));
        }

        let username = user.username.clone();
        let mut active = user.into_active_model();
        active.password_hash = Set(hash_password(&request.new_password)?);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        info!(user_id = request.user_id, "password changed");
        self.audit
            .record(
                AuditEntry::new("user", format!("Password changed for {username}"), actor)
                    .with_ref(request.user_id),
            )
            .await;
        Ok(())
    }
}
