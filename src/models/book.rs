//! Book model and form

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{self, Collector, FieldError, FormInput};

use super::{Author, Genre};

/// Full book record; `author` and `genre` hold references only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: Uuid,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<Uuid>,
}

impl Book {
    pub fn url(&self) -> String {
        format!("/catalog/book/{}", self.id)
    }

    pub fn view(&self) -> BookView<'_> {
        BookView {
            book: self,
            url: self.url(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookView<'a> {
    #[serde(flatten)]
    pub book: &'a Book,
    pub url: String,
}

/// A book with its author populated, for list pages
#[derive(Debug, Clone)]
pub struct BookListing {
    pub book: Book,
    pub author: Option<Author>,
}

impl Serialize for BookListing {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Listing<'a> {
            id: Uuid,
            title: &'a str,
            url: String,
            author: Option<super::author::AuthorView<'a>>,
        }
        Listing {
            id: self.book.id,
            title: &self.book.title,
            url: self.book.url(),
            author: self.author.as_ref().map(Author::view),
        }
        .serialize(serializer)
    }
}

/// A book with author and genres populated
#[derive(Debug, Clone)]
pub struct BookDetail {
    pub book: Book,
    pub author: Option<Author>,
    pub genres: Vec<Genre>,
}

impl Serialize for BookDetail {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Detail<'a> {
            id: Uuid,
            title: &'a str,
            summary: &'a str,
            isbn: &'a str,
            url: String,
            author: Option<super::author::AuthorView<'a>>,
            genre: Vec<super::genre::GenreView<'a>>,
        }
        Detail {
            id: self.book.id,
            title: &self.book.title,
            summary: &self.book.summary,
            isbn: &self.book.isbn,
            url: self.book.url(),
            author: self.author.as_ref().map(Author::view),
            genre: self.genres.iter().map(Genre::view).collect(),
        }
        .serialize(serializer)
    }
}

/// Validated book data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: Uuid,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<Uuid>,
}

impl NewBook {
    pub fn into_book(self, id: Uuid) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            summary: self.summary,
            isbn: self.isbn,
            genre: self.genre,
        }
    }
}

/// Book create/update form. `genre` may be submitted any number of times.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BookForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title must not be empty."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Author must not be empty."))]
    pub author: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Summary must not be empty."))]
    pub summary: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "ISBN must not be empty"))]
    pub isbn: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Genre must not be empty"))]
    pub genre: Vec<String>,
}

impl BookForm {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.to_string(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre: book.genre.iter().map(Uuid::to_string).collect(),
        }
    }
}

impl FormInput for BookForm {
    type Output = NewBook;

    const FIELDS: &'static [&'static str] = &["title", "author", "summary", "isbn", "genre"];

    /// Blank genre entries count as missing
    fn trim(mut self) -> Self {
        self.title = validation::trimmed(self.title);
        self.author = validation::trimmed(self.author);
        self.summary = validation::trimmed(self.summary);
        self.isbn = validation::trimmed(self.isbn);
        self.genre = self
            .genre
            .into_iter()
            .map(validation::trimmed)
            .filter(|g| !g.is_empty())
            .collect();
        self
    }

    fn escape(mut self) -> Self {
        self.title = validation::escaped(self.title);
        self.author = validation::escaped(self.author);
        self.summary = validation::escaped(self.summary);
        self.isbn = validation::escaped(self.isbn);
        self.genre = self.genre.into_iter().map(validation::escaped).collect();
        self
    }

    fn build(&self) -> Result<NewBook, Vec<FieldError>> {
        let mut errors = Collector::default();
        let author = errors.take(validation::reference("author", &self.author, "Author is not valid."));
        let mut genre = Vec::with_capacity(self.genre.len());
        for value in &self.genre {
            match errors.take(validation::reference("genre", value, "Genre is not valid.")) {
                Some(id) if !genre.contains(&id) => genre.push(id),
                _ => {}
            }
        }

        errors.finish(NewBook {
            title: self.title.clone(),
            author: author.unwrap_or_default(),
            summary: self.summary.clone(),
            isbn: self.isbn.clone(),
            genre,
        })
    }
}
