pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_db::Database;
use bookshelf_kernel::{InitCtx, Migration, Module};

use repository::SqliteBookRepository;
use service::BookService;

/// Book collection module: CRUD and search over the `books` table.
pub struct BooksModule {
    service: BookService,
    db: Database,
}

impl BooksModule {
    pub fn new(db: &Database) -> Self {
        Self {
            service: BookService::new(Arc::new(SqliteBookRepository::new(db))),
            db: db.clone(),
        }
    }

    /// Schema for the `books` table.
    pub fn table_migrations() -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    id               INTEGER PRIMARY KEY AUTOINCREMENT,
                    title            TEXT NOT NULL CHECK (length(trim(title)) > 0),
                    author           TEXT NOT NULL CHECK (length(trim(author)) > 0),
                    isbn             TEXT NOT NULL CHECK (length(isbn) > 0),
                    publication_year INTEGER,
                    genre            TEXT,
                    description      TEXT CHECK (description IS NULL OR length(description) <= 1000),
                    CONSTRAINT books_isbn_unique UNIQUE (isbn)
                );
                "#,
        }]
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let count = self.service.count().await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books = count,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi())
    }

    fn migrations(&self) -> Vec<Migration> {
        Self::table_migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn health(&self) -> anyhow::Result<()> {
        self.db.ping().await
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module backed by the application database
pub fn create_module(db: &Database) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(db))
}

fn error_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn openapi() -> serde_json::Value {
    let id_param = serde_json::json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    });
    let request_body = serde_json::json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookRequest" }
            }
        }
    });

    serde_json::json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books, optionally filtered by title or author",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "search",
                        "in": "query",
                        "required": false,
                        "schema": { "type": "string" }
                    }],
                    "responses": {
                        "200": {
                            "description": "List of books",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": request_body.clone(),
                    "responses": {
                        "201": book_response("Created book"),
                        "400": error_response("Validation error"),
                        "409": error_response("ISBN already exists")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": book_response("Book"),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Replace a book's fields",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "requestBody": request_body,
                    "responses": {
                        "200": book_response("Updated book"),
                        "400": error_response("Validation error"),
                        "404": error_response("Book not found"),
                        "409": error_response("ISBN already exists")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "responses": {
                        "204": { "description": "Deleted (or already absent)" }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string", "pattern": "^[0-9]+$" },
                        "publicationYear": { "type": ["integer", "null"], "format": "int32" },
                        "genre": { "type": ["string", "null"] },
                        "description": { "type": ["string", "null"], "maxLength": 1000 }
                    },
                    "required": ["id", "title", "author", "isbn"]
                },
                "BookRequest": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1 },
                        "author": { "type": "string", "minLength": 1 },
                        "isbn": { "type": "string", "pattern": "^[0-9]+$" },
                        "publicationYear": { "type": ["integer", "null"], "format": "int32" },
                        "genre": { "type": ["string", "null"] },
                        "description": { "type": ["string", "null"], "maxLength": 1000 }
                    },
                    "required": ["title", "author", "isbn"]
                }
            }
        }
    })
}
