//! HTTP handlers for `/api/books`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_http::{ApiPath, AppError, ValidatedJson};
use serde::Deserialize;
use serde_json::json;

use super::models::{Book, BookRequest};
use super::service::{BookService, ServiceError};

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => AppError::not_found(err.to_string()),
            ServiceError::Conflict(ref isbn) => AppError::conflict(
                vec![json!({"field": "isbn", "error": "duplicate", "value": isbn})],
                "ISBN already exists",
            ),
            ServiceError::Repository(repo) => AppError::Internal(anyhow::Error::new(repo)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
}

/// Routes relative to the module mount point.
pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(service)
}

async fn list_books(
    State(service): State<BookService>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(service.get_all(params.search.as_deref()).await?))
}

async fn get_book(
    State(service): State<BookService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(service.get(id).await?))
}

async fn create_book(
    State(service): State<BookService>,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = service.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(service): State<BookService>,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(service.update(id, request).await?))
}

async fn delete_book(
    State(service): State<BookService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
