//! Book instance (physical copy) model and form

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{self, Collector, FieldError, FormInput};

use super::{format_date, Book};

/// Availability of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookInstanceStatus {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl BookInstanceStatus {
    pub const ALL: [BookInstanceStatus; 4] = [
        BookInstanceStatus::Available,
        BookInstanceStatus::Maintenance,
        BookInstanceStatus::Loaned,
        BookInstanceStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookInstanceStatus::Available => "Available",
            BookInstanceStatus::Maintenance => "Maintenance",
            BookInstanceStatus::Loaned => "Loaned",
            BookInstanceStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for BookInstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookInstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookInstanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid book instance status: {}", s))
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for BookInstanceStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BookInstanceStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookInstanceStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Full book instance record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BookInstance {
    pub id: Uuid,
    pub book: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: NaiveDate,
}

impl BookInstance {
    pub fn url(&self) -> String {
        format!("/catalog/bookinstance/{}", self.id)
    }

    pub fn due_back_formatted(&self) -> String {
        format_date(self.due_back)
    }

    /// Value for a date input
    pub fn due_back_yyyy_mm_dd(&self) -> String {
        self.due_back.format("%Y-%m-%d").to_string()
    }

    pub fn view(&self) -> BookInstanceView<'_> {
        BookInstanceView {
            instance: self,
            url: self.url(),
            due_back_formatted: self.due_back_formatted(),
            due_back_yyyy_mm_dd: self.due_back_yyyy_mm_dd(),
            book: None,
        }
    }

    /// View with the referenced book populated
    pub fn view_with<'a>(&'a self, book: Option<&'a Book>) -> BookInstanceView<'a> {
        BookInstanceView {
            book: book.map(Book::view),
            ..self.view()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookInstanceView<'a> {
    #[serde(flatten)]
    pub instance: &'a BookInstance,
    pub url: String,
    pub due_back_formatted: String,
    pub due_back_yyyy_mm_dd: String,
    /// Populated book, replacing the bare id when present
    #[serde(rename = "book_detail", skip_serializing_if = "Option::is_none")]
    pub book: Option<super::book::BookView<'a>>,
}

/// Validated book instance data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookInstance {
    pub book: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: NaiveDate,
}

impl NewBookInstance {
    pub fn into_instance(self, id: Uuid) -> BookInstance {
        BookInstance {
            id,
            book: self.book,
            imprint: self.imprint,
            status: self.status,
            due_back: self.due_back,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BookInstanceForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Book must not be empty"))]
    pub book: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Imprint must not be empty"))]
    pub imprint: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Status must not empty"))]
    pub status: String,
    #[serde(default)]
    pub due_back: String,
}

impl BookInstanceForm {
    pub fn from_instance(instance: &BookInstance) -> Self {
        Self {
            book: instance.book.to_string(),
            imprint: instance.imprint.clone(),
            status: instance.status.to_string(),
            due_back: instance.due_back_yyyy_mm_dd(),
        }
    }
}

impl FormInput for BookInstanceForm {
    type Output = NewBookInstance;

    const FIELDS: &'static [&'static str] = &["book", "imprint", "status", "due_back"];

    fn trim(mut self) -> Self {
        self.book = validation::trimmed(self.book);
        self.imprint = validation::trimmed(self.imprint);
        self.status = validation::trimmed(self.status);
        self.due_back = validation::trimmed(self.due_back);
        self
    }

    fn escape(mut self) -> Self {
        self.book = validation::escaped(self.book);
        self.imprint = validation::escaped(self.imprint);
        self.status = validation::escaped(self.status);
        self
    }

    /// An empty due date means today
    fn build(&self) -> Result<NewBookInstance, Vec<FieldError>> {
        let mut errors = Collector::default();
        let book = errors.take(validation::reference("book", &self.book, "Book is not valid."));
        let due_back = errors
            .take(validation::optional_date("due_back", &self.due_back, "Not a valid date"))
            .unwrap_or_else(|| Utc::now().date_naive());

        // An empty status is already reported by the length rule
        let status = if self.status.is_empty() {
            BookInstanceStatus::default()
        } else {
            match self.status.parse() {
                Ok(status) => status,
                Err(_) => {
                    errors.push(FieldError::new("status", "Status is not valid."));
                    BookInstanceStatus::default()
                }
            }
        };

        errors.finish(NewBookInstance {
            book: book.unwrap_or_default(),
            imprint: self.imprint.clone(),
            status,
            due_back,
        })
    }
}
