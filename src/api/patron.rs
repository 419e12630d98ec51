//! Patron API handlers using repository pattern

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use serde::Deserialize;
use serde_json::json;

use super::response::{AppJson, AppPath, AppQuery, ok, success};
use super::today;
use crate::domain::policy::PatronStatus;
use crate::domain::{DomainError, NewPatron, PatronFilter, PatronPatch};
use crate::infrastructure::AppState;
use crate::services::report_service;

/// Request DTO for registering a patron
#[derive(Debug, Deserialize)]
pub struct RegisterPatronRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub registration_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub registration_number: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/patrons",
    params(
        ("search" = Option<String>, Query, description = "Substring of name, email or registration number"),
        ("status" = Option<String>, Query, description = "ACTIVE, SUSPENDED or INACTIVE")
    ),
    responses((status = 200, description = "Patrons ordered by name"))
)]
pub async fn list_patrons(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<PatronFilter>,
) -> Response {
    match state.patron_repo.find_all(filter).await {
        Ok(patrons) => ok(json!({ "total": patrons.len(), "patrons": patrons })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/patrons",
    responses(
        (status = 201, description = "Patron registered"),
        (status = 400, description = "Missing field"),
        (status = 409, description = "Registration number or email already in use")
    )
)]
pub async fn register_patron(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterPatronRequest>,
) -> Response {
    let input = NewPatron {
        full_name: payload.full_name.unwrap_or_default(),
        email: payload.email.unwrap_or_default(),
        registration_number: payload.registration_number.unwrap_or_default(),
    };

    match state.patron_repo.create(input).await {
        Ok(patron) => success(
            StatusCode::CREATED,
            json!({ "patron": patron, "message": "Patron registered successfully" }),
        ),
        Err(e) => e.into_response(),
    }
}

/// Sign in by registration number. Only ACTIVE accounts may enter.
#[utoipa::path(
    post,
    path = "/api/patrons/login",
    responses(
        (status = 200, description = "Patron found and active"),
        (status = 403, description = "Account suspended or inactive"),
        (status = 404, description = "Unknown registration number")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Response {
    let result = async {
        let number = payload
            .registration_number
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| DomainError::Validation("Registration number is required".to_string()))?;

        let patron = state
            .patron_repo
            .find_by_registration_number(&number)
            .await?
            .ok_or_else(|| DomainError::NotFound("Patron".to_string()))?;

        if patron.status != PatronStatus::Active.as_str() {
            return Err(DomainError::PatronInactive(patron.status));
        }
        Ok(patron)
    }
    .await;

    match result {
        Ok(patron) => {
            tracing::info!("Patron {} signed in", patron.id);
            ok(json!({ "patron": patron }))
        }
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/patrons/{id}",
    params(("id" = i32, Path, description = "Patron id")),
    responses(
        (status = 200, description = "Patron"),
        (status = 404, description = "Patron not found")
    )
)]
pub async fn get_patron(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> Response {
    match state.patron_repo.find_by_id(id).await {
        Ok(Some(patron)) => ok(json!({ "patron": patron })),
        Ok(None) => DomainError::NotFound("Patron".to_string()).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/patrons/{id}",
    params(("id" = i32, Path, description = "Patron id")),
    responses(
        (status = 200, description = "Patron updated"),
        (status = 400, description = "Empty or invalid patch"),
        (status = 404, description = "Patron not found"),
        (status = 409, description = "Registration number or email already in use")
    )
)]
pub async fn update_patron(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(patch): AppJson<PatronPatch>,
) -> Response {
    match state.patron_repo.update(id, patch).await {
        Ok(patron) => ok(json!({ "patron": patron, "message": "Patron updated successfully" })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/patrons/{id}/loans",
    params(("id" = i32, Path, description = "Patron id")),
    responses((status = 200, description = "Active loans of the patron"))
)]
pub async fn patron_loans(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> Response {
    let result = async {
        state
            .patron_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Patron".to_string()))?;

        report_service::patron_active_loans(state.db(), id, today())
            .await?
            .try_collect::<Vec<_>>()
            .await
    }
    .await;

    match result {
        Ok(loans) => ok(json!({ "total": loans.len(), "loans": loans })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/patrons/{id}/history",
    params(("id" = i32, Path, description = "Patron id")),
    responses((status = 200, description = "Checkout and return events, newest first"))
)]
pub async fn patron_history(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> Response {
    match report_service::patron_timeline(state.db(), id).await {
        Ok(history) => ok(json!({ "history": history })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/patrons/{id}/stats",
    params(("id" = i32, Path, description = "Patron id")),
    responses((status = 200, description = "Reading statistics"))
)]
pub async fn patron_stats(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> Response {
    match report_service::patron_stats(state.db(), id, today()).await {
        Ok(stats) => ok(json!({ "stats": stats })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/patrons/stats",
    responses((status = 200, description = "Reading statistics of every patron"))
)]
pub async fn list_patron_stats(State(state): State<AppState>) -> Response {
    match report_service::all_patron_stats(state.db(), today()).await {
        Ok(stats) => ok(json!({ "total": stats.len(), "stats": stats })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/patrons/report",
    responses((status = 200, description = "Reader levels over the last six months"))
)]
pub async fn readers_report(State(state): State<AppState>) -> Response {
    match report_service::readers_report(state.db(), today()).await {
        Ok(report) => ok(json!({ "total": report.len(), "report": report })),
        Err(e) => e.into_response(),
    }
}
