use crate::{errors::ServiceError, services::audit::SYSTEM_ACTOR};
use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use std::convert::Infallible;

/// Header naming the operator on whose behalf a write is made
pub const ACTOR_HEADER: &str = "x-user";

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// JSON body extractor whose rejections render as `{error}` 400 responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| ApiJson(value))
            .map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))
    }
}

/// Query-string extractor whose rejections render as `{error}` 400 responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection: QueryRejection| ServiceError::BadRequest(rejection.body_text()))
    }
}

/// Path extractor whose rejections render as `{error}` 400 responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection: PathRejection| ServiceError::BadRequest(rejection.body_text()))
    }
}

/// Operator recorded in the audit log, from the `x-user` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(SYSTEM_ACTOR);
        Ok(Actor(actor.to_string()))
    }
}

/// Blank query values count as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Filter {
        #[serde(rename = "purchaseId")]
        purchase_id: Option<i32>,
    }

    #[tokio::test]
    async fn actor_defaults_to_system() {
        let (mut parts, _) = HttpRequest::new(Body::empty()).into_parts();
        let Actor(actor) = Actor::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(actor, "system");

        let (mut parts, _) = HttpRequest::builder()
            .header(ACTOR_HEADER, "alice")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let Actor(actor) = Actor::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(actor, "alice");
    }

    #[tokio::test]
    async fn malformed_query_is_a_bad_request() {
        let (mut parts, _) = HttpRequest::builder()
            .uri("/goods-in?purchaseId=abc")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let err = ApiQuery::<Filter>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let (mut parts, _) = HttpRequest::builder()
            .uri("/goods-in?purchaseId=12")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let ApiQuery(filter) = ApiQuery::<Filter>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(filter.purchase_id, Some(12));
    }

    #[test]
    fn blank_values_are_dropped() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" SUP1 ".into())), Some("SUP1".into()));
    }
}
