//! JSON envelope shared by every handler
//!
//! Success: `{"success": true, ...payload}`. Failure:
//! `{"success": false, "message": ...}`, plus `"error"` for persistence failures.

use axum::{
    Json, async_trait,
    extract::{
        FromRequest, FromRequestParts, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::domain::{DomainError, ErrorKind};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::StateConflict => StatusCode::BAD_REQUEST,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = status_for(self.kind());
        let mut body = json!({
            "success": false,
            "message": self.message(),
        });

        if let DomainError::Database(detail) = &self {
            tracing::error!("Database error: {}", detail);
            body["error"] = Value::String(detail.clone());
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self.message());
        }

        (status, Json(body)).into_response()
    }
}

/// Wrap a payload object in the success envelope
pub fn success(status: StatusCode, payload: Value) -> Response {
    let mut body = json!({ "success": true });
    if let (Some(target), Value::Object(fields)) = (body.as_object_mut(), payload) {
        target.extend(fields);
    }
    (status, Json(body)).into_response()
}

pub fn ok(payload: Value) -> Response {
    success(StatusCode::OK, payload)
}

/// JSON body whose rejections come back in the failure envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(DomainError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(DomainError))]
pub struct AppPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(DomainError))]
pub struct AppQuery<T>(pub T);

/// Optional JSON body: a request without a JSON content type yields `T::default()`
pub struct JsonOrDefault<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonOrDefault<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = DomainError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => Ok(Self(T::default())),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

impl From<JsonRejection> for DomainError {
    fn from(rejection: JsonRejection) -> Self {
        DomainError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for DomainError {
    fn from(rejection: PathRejection) -> Self {
        DomainError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for DomainError {
    fn from(rejection: QueryRejection) -> Self {
        DomainError::Validation(rejection.body_text())
    }
}
