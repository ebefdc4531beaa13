//! Catalog management service: authors, genres, books and their copies

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::NewAuthor,
        book::{BookDetail, BookListing, NewBook},
        book_instance::NewBookInstance,
        Author, Book, BookInstance, BookInstanceStatus, Genre,
    },
    repository::Repository,
    validation::FieldError,
};

/// Record counts shown on the catalog home page
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogCounts {
    pub book_count: i64,
    pub book_instance_count: i64,
    pub book_instance_available_count: i64,
    pub author_count: i64,
    pub genre_count: i64,
}

/// Result of a guarded delete
#[derive(Debug)]
pub enum Removal<T> {
    Deleted,
    /// Dependents still reference the record; nothing was deleted
    Blocked(T),
}

#[derive(Debug)]
pub enum GenreCreation {
    Created(Genre),
    /// A genre with the same name, ignoring case, was already there
    Existing(Genre),
}

impl GenreCreation {
    pub fn genre(&self) -> &Genre {
        match self {
            GenreCreation::Created(genre) | GenreCreation::Existing(genre) => genre,
        }
    }
}

#[derive(Debug)]
pub struct AuthorDetail {
    pub author: Author,
    pub books: Vec<Book>,
}

#[derive(Debug)]
pub struct GenreDetail {
    pub genre: Genre,
    pub books: Vec<Book>,
}

#[derive(Debug)]
pub struct BookPage {
    pub detail: BookDetail,
    pub instances: Vec<BookInstance>,
}

/// A copy with its book populated
#[derive(Debug)]
pub struct InstanceDetail {
    pub instance: BookInstance,
    pub book: Option<Book>,
}

/// Option lists for the book form
#[derive(Debug)]
pub struct BookFormOptions {
    pub authors: Vec<Author>,
    pub genres: Vec<Genre>,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        let repo = &self.repository;
        let (book_count, book_instance_count, book_instance_available_count, author_count, genre_count) =
            tokio::try_join!(
                repo.books.count(),
                repo.book_instances.count(),
                repo.book_instances.count_by_status(BookInstanceStatus::Available),
                repo.authors.count(),
                repo.genres.count(),
            )?;

        Ok(CatalogCounts {
            book_count,
            book_instance_count,
            book_instance_available_count,
            author_count,
            genre_count,
        })
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn get_author(&self, id: Uuid) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn author_detail(&self, id: Uuid) -> AppResult<AuthorDetail> {
        let (author, books) = tokio::try_join!(
            self.repository.authors.get_by_id(id),
            self.repository.books.list_by_author(id),
        )?;
        Ok(AuthorDetail { author, books })
    }

    pub async fn create_author(&self, data: NewAuthor) -> AppResult<Author> {
        let author = data.into_author(Uuid::new_v4());
        self.repository.authors.create(&author).await?;
        debug!(author_id = %author.id, "Author created");
        Ok(author)
    }

    pub async fn update_author(&self, id: Uuid, data: NewAuthor) -> AppResult<Author> {
        let author = data.into_author(id);
        self.repository.authors.update(&author).await?;
        debug!(author_id = %id, "Author updated");
        Ok(author)
    }

    /// Refused while any book references the author
    pub async fn delete_author(&self, id: Uuid) -> AppResult<Removal<AuthorDetail>> {
        let detail = self.author_detail(id).await?;
        if !detail.books.is_empty() {
            return Ok(Removal::Blocked(detail));
        }

        self.repository.authors.delete(id).await?;
        debug!(author_id = %id, "Author deleted");
        Ok(Removal::Deleted)
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get_genre(&self, id: Uuid) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await
    }

    pub async fn genre_detail(&self, id: Uuid) -> AppResult<GenreDetail> {
        let (genre, books) = tokio::try_join!(
            self.repository.genres.get_by_id(id),
            self.repository.books.list_by_genre(id),
        )?;
        Ok(GenreDetail { genre, books })
    }

    /// Reuses an existing genre whose name matches ignoring case
    pub async fn create_genre(&self, name: String) -> AppResult<GenreCreation> {
        if let Some(existing) = self.repository.genres.find_by_name(&name).await? {
            return Ok(GenreCreation::Existing(existing));
        }

        let genre = Genre {
            id: Uuid::new_v4(),
            name,
        };
        self.repository.genres.create(&genre).await?;
        debug!(genre_id = %genre.id, "Genre created");
        Ok(GenreCreation::Created(genre))
    }

    pub async fn update_genre(&self, id: Uuid, name: String) -> AppResult<Genre> {
        if let Some(existing) = self.repository.genres.find_by_name(&name).await? {
            if existing.id != id {
                return Err(AppError::Conflict(format!("Genre '{}' already exists", existing.name)));
            }
        }

        let genre = Genre { id, name };
        self.repository.genres.update(&genre).await?;
        debug!(genre_id = %id, "Genre updated");
        Ok(genre)
    }

    /// Refused while any book is filed under the genre
    pub async fn delete_genre(&self, id: Uuid) -> AppResult<Removal<GenreDetail>> {
        let detail = self.genre_detail(id).await?;
        if !detail.books.is_empty() {
            return Ok(Removal::Blocked(detail));
        }

        self.repository.genres.delete(id).await?;
        debug!(genre_id = %id, "Genre deleted");
        Ok(Removal::Deleted)
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    /// All books with their author populated
    pub async fn list_books(&self) -> AppResult<Vec<BookListing>> {
        let books = self.repository.books.list().await?;

        let mut author_ids: Vec<Uuid> = books.iter().map(|b| b.author).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors: HashMap<Uuid, Author> = self
            .repository
            .authors
            .get_many(&author_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        Ok(books
            .into_iter()
            .map(|book| BookListing {
                author: authors.get(&book.author).cloned(),
                book,
            })
            .collect())
    }

    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// A book with author and genres populated
    pub async fn book_detail(&self, id: Uuid) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;
        let author_ids = [book.author];
        let (mut authors, genres) = tokio::try_join!(
            self.repository.authors.get_many(&author_ids),
            self.repository.genres.get_many(&book.genre),
        )?;

        Ok(BookDetail {
            author: authors.pop(),
            book,
            genres,
        })
    }

    pub async fn book_page(&self, id: Uuid) -> AppResult<BookPage> {
        let (detail, instances) = tokio::try_join!(
            self.book_detail(id),
            self.repository.book_instances.list_by_book(id),
        )?;
        Ok(BookPage { detail, instances })
    }

    pub async fn book_form_options(&self) -> AppResult<BookFormOptions> {
        let (authors, genres) =
            tokio::try_join!(self.repository.authors.list(), self.repository.genres.list())?;
        Ok(BookFormOptions { authors, genres })
    }

    /// Field errors for an author or genre that does not exist
    pub async fn book_reference_errors(&self, data: &NewBook) -> AppResult<Vec<FieldError>> {
        let author_ids = [data.author];
        let (authors, genres) = tokio::try_join!(
            self.repository.authors.get_many(&author_ids),
            self.repository.genres.get_many(&data.genre),
        )?;

        let mut errors = Vec::new();
        if authors.is_empty() {
            errors.push(FieldError::new("author", "Author is not valid."));
        }
        if genres.len() != data.genre.len() {
            errors.push(FieldError::new("genre", "Genre is not valid."));
        }
        Ok(errors)
    }

    pub async fn create_book(&self, data: NewBook) -> AppResult<Book> {
        let book = data.into_book(Uuid::new_v4());
        self.repository.books.create(&book).await?;
        debug!(book_id = %book.id, "Book created");
        Ok(book)
    }

    pub async fn update_book(&self, id: Uuid, data: NewBook) -> AppResult<Book> {
        let book = data.into_book(id);
        self.repository.books.update(&book).await?;
        debug!(book_id = %id, "Book updated");
        Ok(book)
    }

    /// Refused while copies of the book exist
    pub async fn delete_book(&self, id: Uuid) -> AppResult<Removal<BookPage>> {
        let page = self.book_page(id).await?;
        if !page.instances.is_empty() {
            return Ok(Removal::Blocked(page));
        }

        self.repository.books.delete(id).await?;
        debug!(book_id = %id, "Book deleted");
        Ok(Removal::Deleted)
    }

    // =========================================================================
    // BOOK INSTANCES
    // =========================================================================

    /// All copies with their book populated
    pub async fn list_instances(&self) -> AppResult<Vec<InstanceDetail>> {
        let instances = self.repository.book_instances.list().await?;

        let mut book_ids: Vec<Uuid> = instances.iter().map(|i| i.book).collect();
        book_ids.sort();
        book_ids.dedup();
        let books: HashMap<Uuid, Book> = self
            .repository
            .books
            .get_many(&book_ids)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        Ok(instances
            .into_iter()
            .map(|instance| InstanceDetail {
                book: books.get(&instance.book).cloned(),
                instance,
            })
            .collect())
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.book_instances.get_by_id(id).await
    }

    pub async fn instance_detail(&self, id: Uuid) -> AppResult<InstanceDetail> {
        let instance = self.repository.book_instances.get_by_id(id).await?;
        let book = self.repository.books.get_many(&[instance.book]).await?.pop();
        Ok(InstanceDetail { instance, book })
    }

    /// Books to choose from in the copy form
    pub async fn instance_form_options(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn instance_reference_errors(&self, data: &NewBookInstance) -> AppResult<Vec<FieldError>> {
        let books = self.repository.books.get_many(&[data.book]).await?;
        if books.is_empty() {
            Ok(vec![FieldError::new("book", "Book is not valid.")])
        } else {
            Ok(Vec::new())
        }
    }

    pub async fn create_instance(&self, data: NewBookInstance) -> AppResult<BookInstance> {
        let instance = data.into_instance(Uuid::new_v4());
        self.repository.book_instances.create(&instance).await?;
        debug!(instance_id = %instance.id, "Book copy created");
        Ok(instance)
    }

    pub async fn update_instance(&self, id: Uuid, data: NewBookInstance) -> AppResult<BookInstance> {
        let instance = data.into_instance(id);
        self.repository.book_instances.update(&instance).await?;
        debug!(instance_id = %id, "Book copy updated");
        Ok(instance)
    }

    pub async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.book_instances.delete(id).await?;
        debug!(instance_id = %id, "Book copy deleted");
        Ok(())
    }
}
