use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Longest accepted description, matching the column check in `001_init`.
pub const DESCRIPTION_MAX_LEN: u64 = 1000;

/// ISBNs are stored as plain ASCII digit strings.
static ISBN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));

/// A catalog entry as stored in the `books` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Storage-assigned identifier; `None` until the book is first saved
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
}

impl Book {
    /// Build an unsaved book from a request payload.
    pub fn from_request(request: BookRequest) -> Self {
        let mut book = Self {
            id: None,
            title: String::new(),
            author: String::new(),
            isbn: String::new(),
            publication_year: None,
            genre: None,
            description: None,
        };
        book.apply(request);
        book
    }

    /// Whether title or author contains `query`, ignoring Unicode case.
    pub fn mentions(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.author.to_lowercase().contains(&query)
    }

    /// Overwrite every field except `id` with the request's values.
    pub fn apply(&mut self, request: BookRequest) {
        self.title = request.title;
        self.author = request.author;
        self.isbn = request.isbn;
        self.publication_year = request.publication_year;
        self.genre = request.genre;
        self.description = request.description;
    }
}

/// Create/update payload.
///
/// Missing string fields default to empty so they fail `not_blank`
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct BookRequest {
    #[validate(custom(function = "not_blank", message = "title must not be blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank", message = "author must not be blank"))]
    pub author: String,
    #[validate(
        custom(function = "not_blank", message = "isbn must not be blank"),
        regex(path = *ISBN_PATTERN, code = "numeric", message = "ISBN must be numeric")
    )]
    pub isbn: String,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    #[validate(length(max = DESCRIPTION_MAX_LEN, message = "description is too long"))]
    pub description: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BookRequest {
        BookRequest {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: "9780441013593".to_string(),
            publication_year: Some(1965),
            genre: Some("SciFi".to_string()),
            description: None,
        }
    }

    fn failing_fields(request: &BookRequest) -> Vec<String> {
        let errors = request.validate().unwrap_err();
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        fields
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let blank = BookRequest {
            title: "   ".to_string(),
            author: String::new(),
            isbn: String::new(),
            ..request()
        };

        assert_eq!(failing_fields(&blank), vec!["author", "isbn", "title"]);
    }

    #[test]
    fn non_numeric_isbn_is_rejected() {
        for isbn in ["978-0441", "ISBN", "12 34", "١٢٣"] {
            let bad = BookRequest {
                isbn: isbn.to_string(),
                ..request()
            };
            assert_eq!(failing_fields(&bad), vec!["isbn"], "isbn {isbn:?}");
        }
    }

    #[test]
    fn description_length_is_bounded() {
        let long = BookRequest {
            description: Some("x".repeat(DESCRIPTION_MAX_LEN as usize + 1)),
            ..request()
        };
        assert_eq!(failing_fields(&long), vec!["description"]);

        let at_limit = BookRequest {
            description: Some("x".repeat(DESCRIPTION_MAX_LEN as usize)),
            ..request()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn missing_json_fields_deserialize_as_blank() {
        let parsed: BookRequest =
            serde_json::from_str(r#"{"title":"Dune","id":12,"publicationYear":1965}"#).unwrap();

        assert_eq!(parsed.title, "Dune");
        assert_eq!(parsed.publication_year, Some(1965));
        assert_eq!(failing_fields(&parsed), vec!["author", "isbn"]);
    }

    #[test]
    fn book_serializes_camel_case() {
        let book = Book {
            id: Some(3),
            ..Book::from_request(request())
        };
        let json = serde_json::to_value(&book).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["publicationYear"], 1965);
        assert!(json["description"].is_null());
    }

    #[test]
    fn mentions_folds_unicode_case() {
        let book = Book {
            title: "Éclair Über".to_string(),
            author: "Ödön".to_string(),
            ..Book::from_request(request())
        };

        assert!(book.mentions("éclair"));
        assert!(book.mentions("ÜBER"));
        assert!(book.mentions("ödön"));
        assert!(!book.mentions("eclair"));
    }

    #[test]
    fn apply_keeps_id() {
        let mut book = Book {
            id: Some(5),
            ..Book::from_request(request())
        };
        book.apply(BookRequest {
            title: "Updated".to_string(),
            ..request()
        });

        assert_eq!(book.id, Some(5));
        assert_eq!(book.title, "Updated");
    }
}
