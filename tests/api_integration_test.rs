use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use biblioteca::db;
use biblioteca::server;
use chrono::NaiveDate;
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

async fn setup_test_app() -> Router {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    server::build_router(db)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().uri(uri).method(method);
    let req = match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    content_type: &str,
    body: &str,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_owned()))
        .unwrap();

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn assert_failure_envelope(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["success"], false, "{}", body);
    assert!(
        body["message"].as_str().is_some_and(|m| !m.is_empty()),
        "{}",
        body
    );
}

async fn register_patron(app: &Router, number: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/patrons",
        Some(json!({
            "full_name": format!("Reader {}", number),
            "email": format!("{}@example.org", number),
            "registration_number": number
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["patron"]["id"].as_i64().unwrap()
}

async fn register_book(app: &Router, title: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/books",
        Some(json!({ "title": title, "author": "Someone", "category": "Fiction" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["book"]["id"].as_i64().unwrap()
}

fn date(value: &Value) -> NaiveDate {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_loan_flow_over_http() {
    let app = setup_test_app().await;
    let patron_id = register_patron(&app, "2024001").await;
    let book_id = register_book(&app, "Dune").await;

    // Checkout
    let (status, body) = send(
        &app,
        "POST",
        "/api/loans",
        Some(json!({ "patron_id": patron_id, "book_id": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let loan = &body["loan"];
    assert_eq!(loan["status"], "ACTIVE");
    assert_eq!(loan["book_title"], "Dune");
    assert_eq!((date(&loan["due_date"]) - date(&loan["loan_date"])).num_days(), 7);
    let loan_id = loan["id"].as_i64().unwrap();

    // Copy now reads LOANED and is off the kiosk list
    let (_, body) = send(&app, "GET", &format!("/api/books/{}", book_id), None).await;
    assert_eq!(body["book"]["status"], "LOANED");
    assert_eq!(body["book"]["available"], false);
    let (_, body) = send(&app, "GET", "/api/books/available", None).await;
    assert_eq!(body["total"], 0);

    // Active listing
    let (status, body) = send(&app, "GET", "/api/loans/active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["loans"][0]["situation"], "ON_TIME");
    assert_eq!(body["loans"][0]["days_overdue"], 0);

    let (_, body) = send(&app, "GET", "/api/loans/overdue", None).await;
    assert_eq!(body["total"], 0);

    let (_, body) = send(&app, "GET", &format!("/api/patrons/{}/loans", patron_id), None).await;
    assert_eq!(body["total"], 1);

    // Renewal
    let (status, body) = send(&app, "POST", &format!("/api/loans/{}/renew", loan_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["renewal"]["renewal_count"], 1);

    // Return without a body
    let (status, body) = send(&app, "POST", &format!("/api/loans/{}/return", loan_id), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["return"]["status"], "RETURNED");
    assert_eq!(body["return"]["condition"], "GOOD");
    assert_eq!(body["return"]["days_held"], 0);

    // Second return
    let (status, body) = send(&app, "POST", &format!("/api/loans/{}/return", loan_id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Loan has already been returned");

    // Archived
    let (_, body) = send(&app, "GET", "/api/loans/history", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["history"][0]["final_status"], "RETURNED");

    let (_, body) = send(&app, "GET", &format!("/api/patrons/{}/history", patron_id), None).await;
    let events = body["history"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], "RETURN");
    assert_eq!(events[1]["event"], "CHECKOUT");

    let (_, body) = send(&app, "GET", &format!("/api/patrons/{}/stats", patron_id), None).await;
    assert_eq!(body["stats"]["total_loans"], 1);
    assert_eq!(body["stats"]["reader_level"], "BEGINNER");

    let (_, body) = send(&app, "GET", "/api/patrons/report", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["report"][0]["loan_count"], 1);

    // Deletable once returned
    let (status, _) = send(&app, "DELETE", &format!("/api/books/{}", book_id), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_loan_error_statuses() {
    let app = setup_test_app().await;
    let patron_id = register_patron(&app, "2024001").await;
    let other_id = register_patron(&app, "2024002").await;
    let book_id = register_book(&app, "Dune").await;

    // Missing field
    let (status, body) = send(&app, "POST", "/api/loans", Some(json!({ "patron_id": patron_id }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Malformed JSON still gets the envelope
    let (status, body) = send_raw(&app, "POST", "/api/loans", "application/json", "{not json").await;
    assert_failure_envelope(status, &body);

    // Unknown patron
    let (status, body) = send(
        &app,
        "POST",
        "/api/loans",
        Some(json!({ "patron_id": 999, "book_id": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Patron not found");

    // Suspended patron
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/patrons/{}", other_id),
        Some(json!({ "status": "SUSPENDED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(
        &app,
        "POST",
        "/api/loans",
        Some(json!({ "patron_id": other_id, "book_id": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    // Copy out with someone else
    send(
        &app,
        "POST",
        "/api/loans",
        Some(json!({ "patron_id": patron_id, "book_id": book_id })),
    )
    .await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/loans",
        Some(json!({ "patron_id": patron_id, "book_id": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Patron already holds this book copy");

    // Delete while loaned
    let (status, body) = send(&app, "DELETE", &format!("/api/books/{}", book_id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_unknown_loan_returns_not_found() {
    let app = setup_test_app().await;

    let (status, body) = send(&app, "POST", "/api/loans/404/renew", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Loan not found");

    let (status, _) = send(&app, "POST", "/api/loans/404/return", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_categories_listed() {
    let app = setup_test_app().await;
    let (status, body) = send(&app, "GET", "/api/categories", None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Fiction"));
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[tokio::test]
async fn test_malformed_bodies_get_failure_envelope() {
    let app = setup_test_app().await;
    let patron_id = register_patron(&app, "2024001").await;
    let book_id = register_book(&app, "Dune").await;
    let payload = json!({ "patron_id": patron_id, "book_id": book_id }).to_string();

    // Right shape, wrong content type
    let (status, body) = send_raw(&app, "POST", "/api/loans", "text/plain", &payload).await;
    assert_failure_envelope(status, &body);

    // Wrong field type
    let (status, body) = send_raw(
        &app,
        "POST",
        "/api/loans",
        "application/json",
        r#"{"patron_id": "one", "book_id": 2}"#,
    )
    .await;
    assert_failure_envelope(status, &body);

    for uri in ["/api/patrons", "/api/books", "/api/patrons/login"] {
        let (status, body) = send_raw(&app, "POST", uri, "application/json", "[1, 2").await;
        assert_failure_envelope(status, &body);
    }

    let (status, body) = send_raw(
        &app,
        "PUT",
        &format!("/api/books/{}", book_id),
        "application/json",
        "{",
    )
    .await;
    assert_failure_envelope(status, &body);

    // Nothing was checked out by the rejected requests
    let (_, body) = send(&app, "GET", "/api/loans/active", None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_return_body_is_optional_but_must_parse() {
    let app = setup_test_app().await;
    let patron_id = register_patron(&app, "2024001").await;
    let book_id = register_book(&app, "Dune").await;
    let (_, body) = send(
        &app,
        "POST",
        "/api/loans",
        Some(json!({ "patron_id": patron_id, "book_id": book_id })),
    )
    .await;
    let loan_id = body["loan"]["id"].as_i64().unwrap();
    let uri = format!("/api/loans/{}/return", loan_id);

    let (status, body) = send_raw(&app, "POST", &uri, "application/json", "{oops").await;
    assert_failure_envelope(status, &body);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({ "condition": "DAMAGED", "notes": "Torn cover" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["return"]["condition"], "DAMAGED");
    assert_eq!(body["return"]["notes"], "Torn cover");
}

#[tokio::test]
async fn test_bad_path_and_query_get_failure_envelope() {
    let app = setup_test_app().await;

    for (method, uri) in [
        ("POST", "/api/loans/abc/renew"),
        ("POST", "/api/loans/abc/return"),
        ("GET", "/api/books/abc"),
        ("DELETE", "/api/books/1.5"),
        ("GET", "/api/patrons/abc"),
        ("GET", "/api/patrons/abc/loans"),
        ("GET", "/api/patrons/abc/history"),
        ("GET", "/api/patrons/abc/stats"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_failure_envelope(status, &body);
    }

    let (status, body) = send(&app, "GET", "/api/patrons?status=NOPE", None).await;
    assert_failure_envelope(status, &body);

    let (status, body) = send(&app, "GET", "/api/books?status=LOST", None).await;
    assert_failure_envelope(status, &body);
}

#[tokio::test]
async fn test_patron_stats_listing() {
    let app = setup_test_app().await;
    let reader = register_patron(&app, "2024001").await;
    register_patron(&app, "2024002").await;
    let book_id = register_book(&app, "Dune").await;
    send(
        &app,
        "POST",
        "/api/loans",
        Some(json!({ "patron_id": reader, "book_id": book_id })),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/patrons/stats", None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 2);
    assert_eq!(body["stats"][0]["patron_id"], reader);
    assert_eq!(body["stats"][0]["active_loans"], 1);
    assert_eq!(body["stats"][1]["active_loans"], 0);
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let app = setup_test_app().await;
    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    let paths = body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/loans"));
    assert!(paths.contains_key("/api/loans/{id}/return"));
    assert!(paths.contains_key("/api/patrons/stats"));
    assert!(paths.contains_key("/api/books/{id}"));
}
