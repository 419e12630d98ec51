use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use serde_json::json;

use super::response::ok;
use crate::domain::DomainError;

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Database unreachable")
    )
)]
pub async fn health_check(State(db): State<DatabaseConnection>) -> Response {
    if let Err(e) = db.ping().await {
        return DomainError::from(e).into_response();
    }

    ok(json!({
        "status": "ok",
        "service": "biblioteca",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
