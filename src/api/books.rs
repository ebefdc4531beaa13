//! Book pages

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;

use crate::{
    error::AppResult,
    models::{book::BookForm, Author, BookInstance, Genre},
    services::catalog::{BookPage, Removal},
    validation::{check, sanitize, FieldError, Invalid},
    views::Page,
    AppState,
};

use super::EntityId;

pub async fn list(State(state): State<AppState>) -> AppResult<Page> {
    let books = state.services.catalog.list_books().await?;
    Ok(Page::new("book_list")
        .title("Book List")
        .with("book_list", &books))
}

fn detail_page(view: &'static str, title: &str, page: &BookPage) -> Page {
    let instances: Vec<_> = page.instances.iter().map(BookInstance::view).collect();
    Page::new(view)
        .title(title)
        .with("book", &page.detail)
        .with("book_instances", &instances)
}

pub async fn detail(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Page> {
    let page = state.services.catalog.book_page(id).await?;
    Ok(detail_page("book_detail", &page.detail.book.title, &page))
}

/// Book form with author and genre option lists
async fn form_page(
    state: &AppState,
    title: &str,
    form: &BookForm,
    errors: &[FieldError],
) -> AppResult<Page> {
    let options = state.services.catalog.book_form_options().await?;
    let authors: Vec<_> = options.authors.iter().map(Author::view).collect();
    let genres: Vec<_> = options.genres.iter().map(Genre::view).collect();
    Ok(Page::new("book_form")
        .title(title)
        .with("authors", &authors)
        .with("genres", &genres)
        .with("book", form)
        .errors(errors))
}

pub async fn create_get(State(state): State<AppState>) -> AppResult<Page> {
    form_page(&state, "Create Book", &BookForm::default(), &[]).await
}

pub async fn create_post(
    State(state): State<AppState>,
    Form(form): Form<BookForm>,
) -> AppResult<Response> {
    let data = match check(form.clone()) {
        Ok(data) => data,
        Err(Invalid { form, errors }) => {
            return Ok(form_page(&state, "Create Book", &form, &errors).await?.into_response());
        }
    };

    let errors = state.services.catalog.book_reference_errors(&data).await?;
    if !errors.is_empty() {
        let form = sanitize(form);
        return Ok(form_page(&state, "Create Book", &form, &errors).await?.into_response());
    }

    let book = state.services.catalog.create_book(data).await?;
    Ok(Redirect::to(&book.url()).into_response())
}

pub async fn update_get(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Page> {
    let book = state.services.catalog.get_book(id).await?;
    form_page(&state, "Update Book", &BookForm::from_book(&book), &[]).await
}

pub async fn update_post(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    Form(form): Form<BookForm>,
) -> AppResult<Response> {
    state.services.catalog.get_book(id).await?;

    let data = match check(form.clone()) {
        Ok(data) => data,
        Err(Invalid { form, errors }) => {
            return Ok(form_page(&state, "Update Book", &form, &errors).await?.into_response());
        }
    };

    let errors = state.services.catalog.book_reference_errors(&data).await?;
    if !errors.is_empty() {
        let form = sanitize(form);
        return Ok(form_page(&state, "Update Book", &form, &errors).await?.into_response());
    }

    let book = state.services.catalog.update_book(id, data).await?;
    Ok(Redirect::to(&book.url()).into_response())
}

pub async fn delete_get(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Page> {
    let page = state.services.catalog.book_page(id).await?;
    Ok(detail_page("book_delete", "Delete Book", &page))
}

/// Refuses while copies of the book exist, listing them instead
pub async fn delete_post(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    match state.services.catalog.delete_book(id).await? {
        Removal::Deleted => Ok(Redirect::to("/catalog/books").into_response()),
        Removal::Blocked(page) => {
            Ok(detail_page("book_delete", "Delete Book", &page).into_response())
        }
    }
}
