//! Book persistence.
//!
//! The `books` table carries a unique constraint on `isbn`; that constraint,
//! not any service-level check, is what keeps ISBNs unique under concurrent
//! writers.

use async_trait::async_trait;
use bookshelf_db::Database;
use sqlx::SqlitePool;
use thiserror::Error;

use super::models::Book;

const BOOK_COLUMNS: &str = "id, title, author, isbn, publication_year, genre, description";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    /// The storage unique constraint rejected the ISBN.
    #[error("isbn {0} is already stored")]
    DuplicateIsbn(String),

    /// An update targeted a row that no longer exists.
    #[error("book {0} does not exist")]
    Missing(i64),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Data-access contract for books.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Every stored book, ordered by id.
    async fn find_all(&self) -> RepoResult<Vec<Book>>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> RepoResult<Option<Book>>;

    /// Books whose title or author contains `query` literally, ignoring case.
    async fn find_by_title_or_author(&self, query: &str) -> RepoResult<Vec<Book>>;

    async fn count(&self) -> RepoResult<i64>;

    /// Insert when `book.id` is `None`, otherwise overwrite the row with that id.
    async fn save(&self, book: Book) -> RepoResult<Book>;

    /// Remove the book if present; absent ids are not an error.
    async fn delete_by_id(&self, id: i64) -> RepoResult<()>;
}

/// SQLite-backed book repository.
#[derive(Debug, Clone)]
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    async fn insert(&self, book: &Book) -> RepoResult<Book> {
        let sql = format!(
            "INSERT INTO books (title, author, isbn, publication_year, genre, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {BOOK_COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(book.publication_year)
            .bind(&book.genre)
            .bind(&book.description)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_write_error(err, &book.isbn))
    }

    async fn update(&self, id: i64, book: &Book) -> RepoResult<Book> {
        let sql = format!(
            "UPDATE books
             SET title = ?1, author = ?2, isbn = ?3, publication_year = ?4, genre = ?5, description = ?6
             WHERE id = ?7
             RETURNING {BOOK_COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(book.publication_year)
            .bind(&book.genre)
            .bind(&book.description)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_write_error(err, &book.isbn))?
            .ok_or(RepoError::Missing(id))
    }
}

fn map_write_error(err: sqlx::Error, isbn: &str) -> RepoError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepoError::DuplicateIsbn(isbn.to_string())
        }
        _ => RepoError::Database(err),
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn find_all(&self) -> RepoResult<Vec<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id");
        Ok(sqlx::query_as::<_, Book>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1");
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_isbn(&self, isbn: &str) -> RepoResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE isbn = ?1");
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_title_or_author(&self, query: &str) -> RepoResult<Vec<Book>> {
        // SQLite's lower() only folds ASCII, so case folding happens in Rust
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|book| book.mentions(query))
            .collect())
    }

    async fn count(&self) -> RepoResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn save(&self, book: Book) -> RepoResult<Book> {
        let saved = match book.id {
            None => self.insert(&book).await?,
            Some(id) => self.update(id, &book).await?,
        };
        tracing::debug!(id = ?saved.id, isbn = %saved.isbn, "book saved");
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(id, removed = result.rows_affected(), "book delete");
        Ok(())
    }
}
