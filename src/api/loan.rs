//! Loan API handlers: checkout, renewal, return and circulation listings

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use serde_json::json;

use super::response::{AppJson, AppPath, JsonOrDefault, ok, success};
use super::today;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::models::loan::{CreateLoanDto, ReturnLoanDto};
use crate::services::{loan_service, report_service};

#[utoipa::path(
    post,
    path = "/api/loans",
    responses(
        (status = 201, description = "Loan created"),
        (status = 400, description = "Missing ids, copy unavailable or already held"),
        (status = 403, description = "Patron account not active"),
        (status = 404, description = "Patron or book not found")
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    AppJson(dto): AppJson<CreateLoanDto>,
) -> Response {
    let result = async {
        let (Some(patron_id), Some(book_id)) = (dto.patron_id, dto.book_id) else {
            return Err(DomainError::Validation(
                "patron_id and book_id are required".to_string(),
            ));
        };
        loan_service::create_loan(state.db(), patron_id, book_id, today()).await
    }
    .await;

    match result {
        Ok(loan) => success(
            StatusCode::CREATED,
            json!({ "loan": loan, "message": "Loan created successfully" }),
        ),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/loans/{id}/renew",
    params(("id" = i32, Path, description = "Loan id")),
    responses(
        (status = 200, description = "Loan renewed for another period"),
        (status = 400, description = "Loan not active or renewal limit reached"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn renew_loan(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> Response {
    match loan_service::renew_loan(state.db(), id, today()).await {
        Ok(renewal) => ok(json!({ "renewal": renewal, "message": "Loan renewed successfully" })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/loans/{id}/return",
    params(("id" = i32, Path, description = "Loan id")),
    responses(
        (status = 200, description = "Loan returned and archived"),
        (status = 400, description = "Loan already returned"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    JsonOrDefault(dto): JsonOrDefault<ReturnLoanDto>,
) -> Response {
    match loan_service::return_loan(state.db(), id, dto.condition, dto.notes, today()).await {
        Ok(receipt) => ok(json!({ "return": receipt, "message": "Book returned successfully" })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/loans/active",
    responses((status = 200, description = "Active loans, soonest due first"))
)]
pub async fn list_active_loans(State(state): State<AppState>) -> Response {
    let result = async {
        report_service::active_loans(state.db(), today())
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
    path = "/api/loans/overdue",
    responses((status = 200, description = "Overdue loans, most overdue first"))
)]
pub async fn list_overdue_loans(State(state): State<AppState>) -> Response {
    let result = async {
        report_service::overdue_loans(state.db(), today())
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
    path = "/api/loans/history",
    responses((status = 200, description = "Archived loans, latest return first"))
)]
pub async fn list_history(State(state): State<AppState>) -> Response {
    let result = async {
        report_service::loan_history(state.db())
            .await?
            .try_collect::<Vec<_>>()
            .await
    }
    .await;

    match result {
        Ok(history) => ok(json!({ "total": history.len(), "history": history })),
        Err(e) => e.into_response(),
    }
}
