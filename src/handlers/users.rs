use super::common::{Actor, ApiJson};
use crate::{errors::ServiceError, services::users::ChangePasswordRequest, AppState};
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordResponse {
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/user/change-password",
    summary = "Change password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ChangePasswordResponse),
        (status = 400, description = "New password does not meet the length rules", body = crate::errors::ErrorResponse),
        (status = 401, description = "Current password is incorrect", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, ServiceError> {
    state
        .services
        .users
        .change_password(payload, actor.as_str())
        .await?;
    Ok(Json(ChangePasswordResponse {
        message: "Password updated".to_string(),
    }))
}
