//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Author entity.
///
/// The books written by an author live only in the `book_author` join table
/// and are never part of the wire representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    /// Assigned by the store on first save
    pub id: Option<i64>,
    /// Unique across all authors
    pub name: String,
    #[serde(rename = "dataNascimento")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "nacionalidade")]
    pub nationality: Option<String>,
    #[serde(rename = "biografia")]
    pub biography: Option<String>,
}

impl Author {
    /// Build a new, not yet persisted author from a request
    pub fn from_input(input: &AuthorInput) -> Self {
        Self {
            id: None,
            name: input.name.clone(),
            birth_date: input.birth_date,
            nationality: input.nationality.clone(),
            biography: input.biography.clone(),
        }
    }

    /// Full replace of every mutable field
    pub fn apply(&mut self, input: &AuthorInput) {
        self.name = input.name.clone();
        self.birth_date = input.birth_date;
        self.nationality = input.nationality.clone();
        self.biography = input.biography.clone();
    }
}

/// Create / update author request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AuthorInput {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[serde(rename = "dataNascimento", default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "nacionalidade", default)]
    pub nationality: Option<String>,
    #[serde(rename = "biografia", default)]
    pub biography: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let input: AuthorInput = serde_json::from_str(
            r#"{"name":"Machado de Assis","dataNascimento":"1839-06-21","nacionalidade":"Brasileira"}"#,
        )
        .unwrap();
        assert_eq!(input.birth_date, NaiveDate::from_ymd_opt(1839, 6, 21));
        assert_eq!(input.biography, None);

        let author = Author::from_input(&input);
        let json = serde_json::to_value(&author).unwrap();
        assert_eq!(json["nacionalidade"], "Brasileira");
        assert_eq!(json["dataNascimento"], "1839-06-21");
        assert!(json.get("books").is_none());
    }

    #[test]
    fn test_apply_replaces_all_fields() {
        let mut author = Author {
            id: Some(1),
            name: "Old".into(),
            birth_date: NaiveDate::from_ymd_opt(1900, 1, 1),
            nationality: Some("X".into()),
            biography: Some("bio".into()),
        };
        let input = AuthorInput {
            name: "New".into(),
            birth_date: None,
            nationality: None,
            biography: None,
        };
        author.apply(&input);
        assert_eq!(author.id, Some(1));
        assert_eq!(author.name, "New");
        assert_eq!(author.birth_date, None);
        assert_eq!(author.nationality, None);
        assert_eq!(author.biography, None);
    }

    #[test]
    fn test_empty_name_rejected() {
        let input = AuthorInput {
            name: String::new(),
            birth_date: None,
            nationality: None,
            biography: None,
        };
        assert!(input.validate().is_err());
    }
}
