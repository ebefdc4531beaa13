//! Process-local store used by tests and `database.url = "memory"`

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, BookInstance, BookInstanceStatus, Genre, User},
};

use super::{
    authors::AuthorsStore, book_instances::BookInstancesStore, books::BooksStore,
    genres::GenresStore, users::UsersStore,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    authors: HashMap<Uuid, Author>,
    genres: HashMap<Uuid, Genre>,
    books: HashMap<Uuid, Book>,
    book_instances: HashMap<Uuid, BookInstance>,
}

/// All entity tables behind one lock. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{} not found", what))
}

fn sorted<T: Clone, K: Ord>(values: impl Iterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut out: Vec<T> = values.collect();
    out.sort_by_key(key);
    out
}

#[async_trait]
impl UsersStore for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn username_exists(&self, username: &str, exclude_id: Option<Uuid>) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .any(|u| u.username == username && Some(u.id) != exclude_id))
    }

    async fn create(&self, user: &User) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("User already exist".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(AppError::Conflict("User already exist".to_string()));
        }
        match tables.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("User with id {} not found", user.id))),
        }
    }
}

#[async_trait]
impl AuthorsStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Author>> {
        let tables = self.tables.read().await;
        Ok(sorted(tables.authors.values().cloned(), |a| {
            (a.family_name.clone(), a.first_name.clone())
        }))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Author> {
        let tables = self.tables.read().await;
        tables.authors.get(&id).cloned().ok_or_else(|| not_found("Author"))
    }

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Author>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.authors.get(id).cloned()).collect())
    }

    async fn create(&self, author: &Author) -> AppResult<()> {
        self.tables.write().await.authors.insert(author.id, author.clone());
        Ok(())
    }

    async fn update(&self, author: &Author) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let existing = tables.authors.get_mut(&author.id).ok_or_else(|| not_found("Author"))?;
        *existing = author.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.authors.remove(&id).map(|_| ()).ok_or_else(|| not_found("Author"))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.authors.len() as i64)
    }
}

#[async_trait]
impl GenresStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        Ok(sorted(tables.genres.values().cloned(), |g| g.name.clone()))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Genre> {
        let tables = self.tables.read().await;
        tables.genres.get(&id).cloned().ok_or_else(|| not_found("Genre"))
    }

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            ids.iter().filter_map(|id| tables.genres.get(id).cloned()),
            |g| g.name.clone(),
        ))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Genre>> {
        let wanted = name.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .genres
            .values()
            .find(|g| g.name.to_lowercase() == wanted)
            .cloned())
    }

    async fn create(&self, genre: &Genre) -> AppResult<()> {
        self.tables.write().await.genres.insert(genre.id, genre.clone());
        Ok(())
    }

    async fn update(&self, genre: &Genre) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let existing = tables.genres.get_mut(&genre.id).ok_or_else(|| not_found("Genre"))?;
        *existing = genre.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.genres.remove(&id).map(|_| ()).ok_or_else(|| not_found("Genre"))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.genres.len() as i64)
    }
}

#[async_trait]
impl BooksStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(sorted(tables.books.values().cloned(), |b| b.title.clone()))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        let tables = self.tables.read().await;
        tables.books.get(&id).cloned().ok_or_else(|| not_found("Book"))
    }

    async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.books.get(id).cloned()).collect())
    }

    async fn list_by_author(&self, author: Uuid) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables.books.values().filter(|b| b.author == author).cloned(),
            |b| b.title.clone(),
        ))
    }

    async fn list_by_genre(&self, genre: Uuid) -> AppResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables.books.values().filter(|b| b.genre.contains(&genre)).cloned(),
            |b| b.title.clone(),
        ))
    }

    async fn create(&self, book: &Book) -> AppResult<()> {
        self.tables.write().await.books.insert(book.id, book.clone());
        Ok(())
    }

    async fn update(&self, book: &Book) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let existing = tables.books.get_mut(&book.id).ok_or_else(|| not_found("Book"))?;
        *existing = book.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.books.remove(&id).map(|_| ()).ok_or_else(|| not_found("Book"))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.books.len() as i64)
    }
}

#[async_trait]
impl BookInstancesStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<BookInstance>> {
        let tables = self.tables.read().await;
        Ok(sorted(tables.book_instances.values().cloned(), |i| {
            (i.imprint.clone(), i.id)
        }))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        let tables = self.tables.read().await;
        tables
            .book_instances
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Book copy"))
    }

    async fn list_by_book(&self, book: Uuid) -> AppResult<Vec<BookInstance>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables.book_instances.values().filter(|i| i.book == book).cloned(),
            |i| (i.imprint.clone(), i.id),
        ))
    }

    async fn create(&self, instance: &BookInstance) -> AppResult<()> {
        self.tables
            .write()
            .await
            .book_instances
            .insert(instance.id, instance.clone());
        Ok(())
    }

    async fn update(&self, instance: &BookInstance) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .book_instances
            .get_mut(&instance.id)
            .ok_or_else(|| not_found("Book copy"))?;
        *existing = instance.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .book_instances
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Book copy"))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.book_instances.len() as i64)
    }

    async fn count_by_status(&self, status: BookInstanceStatus) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .book_instances
            .values()
            .filter(|i| i.status == status)
            .count() as i64)
    }
}
