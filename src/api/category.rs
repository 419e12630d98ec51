use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::response::ok;
use crate::infrastructure::AppState;

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Categories ordered by name"))
)]
pub async fn list_categories(State(state): State<AppState>) -> Response {
    match state.category_repo.find_all().await {
        Ok(categories) => ok(json!({ "categories": categories })),
        Err(e) => e.into_response(),
    }
}
