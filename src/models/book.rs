//! Book model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::author::Author;

/// Book entity with its associated authors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    /// Assigned by the store on first save
    pub id: Option<i64>,
    #[serde(rename = "titulo")]
    pub title: String,
    /// Author names joined by ", ", derived from `authors`
    #[serde(rename = "autor")]
    pub author_display: String,
    /// Loaded from the `book_author` join table
    #[sqlx(skip)]
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(rename = "paginas")]
    pub page_count: i32,
    #[serde(rename = "disponivel")]
    pub available: bool,
    #[serde(rename = "dataPublicacao")]
    pub publication_date: NaiveDate,
    /// Location in the file store, once a PDF has been uploaded
    #[serde(rename = "pdfPath")]
    pub pdf_path: Option<String>,
}

impl Book {
    /// Build a new, not yet persisted book without authors
    pub fn from_input(input: &BookInput) -> Self {
        Self {
            id: None,
            title: input.title.clone(),
            author_display: String::new(),
            authors: Vec::new(),
            page_count: input.page_count,
            available: input.available,
            publication_date: input.publication_date,
            pdf_path: None,
        }
    }

    /// Overwrite the scalar fields; authors are handled by the caller
    pub fn apply_scalars(&mut self, input: &BookInput) {
        self.title = input.title.clone();
        self.page_count = input.page_count;
        self.available = input.available;
        self.publication_date = input.publication_date;
    }

    /// Replace the author set and recompute the display string
    pub fn set_authors(&mut self, authors: Vec<Author>) {
        self.author_display = display_names(&authors);
        self.authors = authors;
    }

    /// Identifiers of the associated authors
    pub fn author_ids(&self) -> Vec<i64> {
        self.authors.iter().filter_map(|a| a.id).collect()
    }
}

/// Join author names with ", " in the given order
pub fn display_names(authors: &[Author]) -> String {
    authors
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create / update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[serde(rename = "titulo")]
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,
    #[serde(rename = "paginas")]
    #[validate(range(min = 0, message = "Page count must not be negative"))]
    pub page_count: i32,
    #[serde(rename = "disponivel")]
    pub available: bool,
    #[serde(rename = "dataPublicacao")]
    pub publication_date: NaiveDate,
    /// Authors to associate; absent or empty leaves an update's authors untouched
    #[serde(rename = "authorIds", default)]
    pub author_ids: Option<Vec<i64>>,
}

impl BookInput {
    /// Requested author IDs without duplicates, first occurrence first.
    ///
    /// `None` when the request carries no author IDs at all.
    pub fn requested_author_ids(&self) -> Option<Vec<i64>> {
        let ids = self.author_ids.as_ref().filter(|ids| !ids.is_empty())?;
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        Some(unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(id: i64, name: &str) -> Author {
        Author {
            id: Some(id),
            name: name.to_string(),
            birth_date: None,
            nationality: None,
            biography: None,
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_names(&[]), "");
        assert_eq!(
            display_names(&[author(1, "Jorge Amado"), author(2, "Clarice Lispector")]),
            "Jorge Amado, Clarice Lispector"
        );
    }

    #[test]
    fn test_requested_author_ids() {
        let mut input: BookInput = serde_json::from_str(
            r#"{"titulo":"T","paginas":10,"disponivel":true,"dataPublicacao":"2020-01-31"}"#,
        )
        .unwrap();
        assert_eq!(input.requested_author_ids(), None);

        input.author_ids = Some(vec![]);
        assert_eq!(input.requested_author_ids(), None);

        input.author_ids = Some(vec![3, 1, 3, 2, 1]);
        assert_eq!(input.requested_author_ids(), Some(vec![3, 1, 2]));
    }

    #[test]
    fn test_negative_pages_rejected() {
        let input: BookInput = serde_json::from_str(
            r#"{"titulo":"T","paginas":-1,"disponivel":false,"dataPublicacao":"2020-01-31"}"#,
        )
        .unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_title_length_bounds() {
        let titled = |title: String| BookInput {
            title,
            page_count: 1,
            available: true,
            publication_date: NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
            author_ids: None,
        };
        assert!(titled(String::new()).validate().is_err());
        assert!(titled("é".repeat(255)).validate().is_ok());
        assert!(titled("x".repeat(256)).validate().is_err());
    }

    #[test]
    fn test_wire_representation() {
        let mut book = Book {
            id: Some(7),
            title: "Dom Casmurro".into(),
            author_display: String::new(),
            authors: vec![],
            page_count: 256,
            available: true,
            publication_date: NaiveDate::from_ymd_opt(1899, 1, 1).unwrap(),
            pdf_path: None,
        };
        book.set_authors(vec![author(1, "Machado de Assis")]);

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["titulo"], "Dom Casmurro");
        assert_eq!(json["autor"], "Machado de Assis");
        assert_eq!(json["paginas"], 256);
        assert_eq!(json["disponivel"], true);
        assert_eq!(json["dataPublicacao"], "1899-01-01");
        assert!(json["pdfPath"].is_null());
        assert_eq!(json["authors"][0]["name"], "Machado de Assis");
        assert_eq!(book.author_ids(), vec![1]);
    }
}
