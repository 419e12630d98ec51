//! Catalog API handlers using repository pattern

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use super::response::{AppJson, AppPath, AppQuery, ok, success};
use crate::domain::{BookFilter, BookPatch, DomainError, NewBook};
use crate::infrastructure::AppState;
use crate::services::loan_service;

/// Request DTO for registering a copy
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Category name
    pub category: Option<String>,
    pub synopsis: Option<String>,
    pub page_count: Option<i32>,
    pub copy_code: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(
        ("search" = Option<String>, Query, description = "Substring of title or author"),
        ("category" = Option<String>, Query, description = "Category name"),
        ("status" = Option<String>, Query, description = "Effective copy status")
    ),
    responses((status = 200, description = "Catalog ordered by title"))
)]
pub async fn list_books(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<BookFilter>,
) -> Response {
    match state.book_repo.find_all(filter).await {
        Ok(books) => ok(json!({ "total": books.len(), "books": books })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/books/available",
    responses((status = 200, description = "Copies that can be checked out now"))
)]
pub async fn list_available_books(State(state): State<AppState>) -> Response {
    match state.book_repo.find_available().await {
        Ok(books) => ok(json!({ "total": books.len(), "books": books })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/books",
    responses(
        (status = 201, description = "Copy registered"),
        (status = 400, description = "Missing field or unknown category"),
        (status = 409, description = "Copy code already in use")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBookRequest>,
) -> Response {
    let Some(category) = payload.category.filter(|c| !c.trim().is_empty()) else {
        return DomainError::Validation("Category is required".to_string()).into_response();
    };

    let input = NewBook {
        title: payload.title.unwrap_or_default(),
        author: payload.author.unwrap_or_default(),
        category,
        synopsis: payload.synopsis,
        page_count: payload.page_count,
        copy_code: payload.copy_code,
    };

    match state.book_repo.create(input).await {
        Ok(book) => success(
            StatusCode::CREATED,
            json!({ "book": book, "message": "Book registered successfully" }),
        ),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book copy id")),
    responses(
        (status = 200, description = "Book copy"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> Response {
    match state.book_repo.find_by_id(id).await {
        Ok(Some(book)) => ok(json!({ "book": book })),
        Ok(None) => DomainError::NotFound("Book".to_string()).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book copy id")),
    responses(
        (status = 200, description = "Book updated"),
        (status = 400, description = "Empty or invalid patch"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Copy code already in use")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(patch): AppJson<BookPatch>,
) -> Response {
    match state.book_repo.update(id, patch).await {
        Ok(book) => ok(json!({ "book": book, "message": "Book updated successfully" })),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book copy id")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 400, description = "Copy is out on loan"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> Response {
    match loan_service::delete_book(state.db(), id).await {
        Ok(title) => ok(json!({ "message": format!("Book '{}' deleted", title) })),
        Err(e) => e.into_response(),
    }
}
