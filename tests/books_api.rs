use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use bookshelf_kernel::settings::{DatabaseSettings, Settings};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    let settings = Settings {
        database: DatabaseSettings::in_memory(),
        ..Settings::default()
    };
    let app = bookshelf_app::bootstrap(&settings).await.unwrap();
    app.router(&settings)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn dune() -> Value {
    json!({
        "title": "Dune",
        "author": "Frank Herbert",
        "isbn": "9780441013593",
        "publicationYear": 1965,
        "genre": "SciFi",
        "description": "Desert planet"
    })
}

async fn create(app: &Router, body: Value) -> Value {
    let response = send(app, "POST", "/api/books", Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

#[tokio::test]
async fn create_then_get_roundtrips() {
    let app = app().await;

    let created = create(&app, dune()).await;
    let id = created["id"].as_i64().unwrap();

    let response = send(&app, "GET", &format!("/api/books/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut expected = dune();
    expected["id"] = json!(id);
    assert_eq!(json_body(response).await, expected);
}

#[tokio::test]
async fn optional_fields_serialize_as_null() {
    let app = app().await;

    let created = create(
        &app,
        json!({"title": "Bare", "author": "Anon", "isbn": "1"}),
    )
    .await;

    assert!(created["publicationYear"].is_null());
    assert!(created["genre"].is_null());
    assert!(created["description"].is_null());
}

#[tokio::test]
async fn duplicate_isbn_is_conflict() {
    let app = app().await;
    create(&app, dune()).await;

    let mut again = dune();
    again["title"] = json!("Dune Messiah");
    let response = send(&app, "POST", "/api/books", Some(again)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"]["code"], "conflict");

    let all = json_body(send(&app, "GET", "/api/books", None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let app = app().await;

    let response = send(
        &app,
        "POST",
        "/api/books",
        Some(json!({"title": " ", "author": "A", "isbn": "97-80"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["isbn", "title"]);

    let response = send(&app, "POST", "/api/books", Some(json!({"title": "Only"}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let all = json_body(send(&app, "GET", "/api/books", None).await).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app().await;

    let request = Request::post("/api/books")
        .header("content-type", "application/json")
        .body(Body::from("{\"title\":"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "bad_request");
}

#[tokio::test]
async fn missing_book_is_not_found() {
    let app = app().await;

    let response = send(&app, "GET", "/api/books/999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"]["code"], "not_found");

    let response = send(&app, "PUT", "/api/books/999", Some(dune())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_json_bad_request() {
    let app = app().await;

    for method in ["GET", "PUT", "DELETE"] {
        let response = send(&app, method, "/api/books/abc", Some(dune())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method}");
        assert_eq!(json_body(response).await["error"]["code"], "bad_request");
    }
}

#[tokio::test]
async fn error_trace_id_matches_request_id() {
    let app = app().await;

    let request = Request::get("/api/books/999")
        .header("x-request-id", "shelf-req-7")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-request-id"], "shelf-req-7");
    assert_eq!(json_body(response).await["error"]["trace_id"], "shelf-req-7");
}

#[tokio::test]
async fn search_ignores_non_ascii_case() {
    let app = app().await;
    create(&app, json!({"title": "Éclair Über", "author": "Ödön", "isbn": "1"})).await;
    create(&app, json!({"title": "Plain", "author": "Bob", "isbn": "2"})).await;

    let found = json_body(send(&app, "GET", "/api/books?search=%C3%89CLAIR", None).await).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["author"], "Ödön");
}

#[tokio::test]
async fn search_filters_by_title_or_author() {
    let app = app().await;
    create(&app, json!({"title": "Title1", "author": "Author1", "isbn": "123"})).await;
    create(&app, json!({"title": "Another Title", "author": "AuthorX", "isbn": "456"})).await;
    create(&app, json!({"title": "Plain", "author": "Bob", "isbn": "789"})).await;

    for uri in ["/api/books", "/api/books?search=", "/api/books?search=%20%20%20"] {
        let all = json_body(send(&app, "GET", uri, None).await).await;
        assert_eq!(all.as_array().unwrap().len(), 3, "{uri}");
    }

    let found = json_body(send(&app, "GET", "/api/books?search=THOR", None).await).await;
    let authors: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["author"].as_str().unwrap())
        .collect();
    assert_eq!(authors, vec!["Author1", "AuthorX"]);
}

#[tokio::test]
async fn update_replaces_every_field() {
    let app = app().await;
    let created = create(&app, dune()).await;
    let id = created["id"].as_i64().unwrap();

    let replacement = json!({
        "id": 12345,
        "title": "Children of Dune",
        "author": "F. Herbert",
        "isbn": "9780441104024",
        "publicationYear": null,
        "genre": null,
        "description": null
    });
    let response = send(&app, "PUT", &format!("/api/books/{id}"), Some(replacement)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = json_body(response).await;
    assert_eq!(
        updated,
        json!({
            "id": id,
            "title": "Children of Dune",
            "author": "F. Herbert",
            "isbn": "9780441104024",
            "publicationYear": null,
            "genre": null,
            "description": null
        })
    );
}

#[tokio::test]
async fn update_to_existing_isbn_is_conflict() {
    let app = app().await;
    create(&app, dune()).await;
    let other = create(&app, json!({"title": "Emma", "author": "Austen", "isbn": "42"})).await;

    let mut clash = dune();
    clash["title"] = json!("Emma");
    let response = send(
        &app,
        "PUT",
        &format!("/api/books/{}", other["id"]),
        Some(clash),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = app().await;
    let created = create(&app, dune()).await;
    let uri = format!("/api/books/{}", created["id"]);

    let response = send(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_fails_once_database_is_closed() {
    let settings = Settings {
        database: DatabaseSettings::in_memory(),
        ..Settings::default()
    };
    let app = bookshelf_app::bootstrap(&settings).await.unwrap();
    let router = app.router(&settings);

    let response = send(&router, "GET", "/healthz", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.db.close().await;
    let response = send(&router, "GET", "/healthz", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn health_and_docs_are_served() {
    let app = app().await;

    let response = send(&app, "GET", "/healthz", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let spec = json_body(response).await;
    assert!(spec["paths"]["/api/books"]["post"].is_object());
    assert!(spec["paths"]["/api/books/{id}"]["delete"].is_object());
    assert!(spec["components"]["schemas"]["Book"].is_object());
}
