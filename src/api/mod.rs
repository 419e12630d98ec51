pub mod book;
pub mod category;
pub mod health;
pub mod loan;
pub mod patron;
pub mod response;

use axum::{
    Router,
    routing::{get, post},
};
use chrono::NaiveDate;

use crate::infrastructure::AppState;

/// Calendar day used for every loan decision made over HTTP
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// API routes, to be nested under `/api`
pub fn api_router_with_state(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Circulation
        .route("/loans", post(loan::create_loan))
        .route("/loans/active", get(loan::list_active_loans))
        .route("/loans/overdue", get(loan::list_overdue_loans))
        .route("/loans/history", get(loan::list_history))
        .route("/loans/:id/renew", post(loan::renew_loan))
        .route("/loans/:id/return", post(loan::return_loan))
        // Patrons
        .route(
            "/patrons",
            get(patron::list_patrons).post(patron::register_patron),
        )
        .route("/patrons/login", post(patron::login))
        .route("/patrons/report", get(patron::readers_report))
        .route("/patrons/stats", get(patron::list_patron_stats))
        .route(
            "/patrons/:id",
            get(patron::get_patron).put(patron::update_patron),
        )
        .route("/patrons/:id/loans", get(patron::patron_loans))
        .route("/patrons/:id/history", get(patron::patron_history))
        .route("/patrons/:id/stats", get(patron::patron_stats))
        // Catalog
        .route("/books", get(book::list_books).post(book::create_book))
        .route("/books/available", get(book::list_available_books))
        .route(
            "/books/:id",
            get(book::get_book)
                .put(book::update_book)
                .delete(book::delete_book),
        )
        .route("/categories", get(category::list_categories))
        .with_state(state)
}
