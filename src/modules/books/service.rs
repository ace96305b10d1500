//! Book use cases on top of a [`BookRepository`].

use std::sync::Arc;

use thiserror::Error;

use super::models::{Book, BookRequest};
use super::repository::{BookRepository, RepoError};
use crate::utils;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("book {0} not found")]
    NotFound(i64),

    #[error("ISBN {0} already exists")]
    Conflict(String),

    #[error(transparent)]
    Repository(RepoError),
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::DuplicateIsbn(isbn) => ServiceError::Conflict(isbn),
            RepoError::Missing(id) => ServiceError::NotFound(id),
            other => ServiceError::Repository(other),
        }
    }
}

/// Book service; cheap to clone, shares the repository.
#[derive(Clone)]
pub struct BookService {
    repo: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repo: Arc<dyn BookRepository>) -> Self {
        Self { repo }
    }

    /// All books, or those whose title or author contains `search`.
    ///
    /// A missing or blank search returns everything.
    pub async fn get_all(&self, search: Option<&str>) -> ServiceResult<Vec<Book>> {
        match utils::non_blank(search) {
            None => Ok(self.repo.find_all().await?),
            Some(query) => Ok(self.repo.find_by_title_or_author(query).await?),
        }
    }

    pub async fn count(&self) -> ServiceResult<i64> {
        Ok(self.repo.count().await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Book> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Store a new book. Fails with `Conflict` when the ISBN is taken, either
    /// by the upfront lookup or by the storage constraint on a racing insert.
    pub async fn create_book(&self, request: BookRequest) -> ServiceResult<Book> {
        if self.repo.find_by_isbn(&request.isbn).await?.is_some() {
            return Err(ServiceError::Conflict(request.isbn));
        }

        let book = self.repo.save(Book::from_request(request)).await?;
        tracing::info!(id = ?book.id, isbn = %book.isbn, "book created");
        Ok(book)
    }

    /// Overwrite every field of an existing book.
    ///
    /// ISBN uniqueness is left to the storage constraint, which surfaces as
    /// `Conflict`.
    pub async fn update(&self, id: i64, request: BookRequest) -> ServiceResult<Book> {
        let mut book = self.get(id).await?;
        book.apply(request);

        let book = self.repo.save(book).await?;
        tracing::info!(id, isbn = %book.isbn, "book updated");
        Ok(book)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.repo.delete_by_id(id).await?;
        tracing::info!(id, "book deleted");
        Ok(())
    }
}
