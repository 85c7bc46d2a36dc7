//! Request extractors whose rejections render as [`ApiError`] bodies.

use crate::error::ApiError;
use axum::async_trait;
use axum::extract::{FromRequestParts, Path, Query};
use axum::http::request::Parts;
use log::info;
use serde::de::DeserializeOwned;

/// `Query<T>` that answers malformed query strings with a JSON 400.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

/// `Path<T>` that answers unparsable path segments with a JSON 400.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected(parts, rejection.body_text())),
        }
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected(parts, rejection.body_text())),
        }
    }
}

fn rejected(parts: &Parts, message: String) -> ApiError {
    info!(
        "event=http_request module=api path={} status=error code=400 reason=bad_params",
        parts.uri.path()
    );
    ApiError::BadRequest(message)
}
