//! Author pages

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;

use crate::{
    error::AppResult,
    models::{author::AuthorForm, Author},
    services::catalog::{AuthorDetail, Removal},
    validation::{check, FieldError, Invalid},
    views::Page,
};

use super::EntityId;

pub async fn list(State(state): State<crate::AppState>) -> AppResult<Page> {
    let authors = state.services.catalog.list_authors().await?;
    let views: Vec<_> = authors.iter().map(Author::view).collect();
    Ok(Page::new("author_list")
        .title("Author List")
        .with("author_list", &views))
}

pub async fn detail(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Page> {
    let detail = state.services.catalog.author_detail(id).await?;
    Ok(detail_page("author_detail", "Author Detail", &detail))
}

fn detail_page(view: &'static str, title: &str, detail: &AuthorDetail) -> Page {
    let books: Vec<_> = detail.books.iter().map(|b| b.view()).collect();
    Page::new(view)
        .title(title)
        .with("author", &detail.author.view())
        .with("books", &books)
}

fn form_page(title: &str, form: &AuthorForm, errors: &[FieldError]) -> Page {
    Page::new("author_form")
        .title(title)
        .with("author", form)
        .errors(errors)
}

pub async fn create_get() -> Page {
    form_page("Create Author", &AuthorForm::default(), &[])
}

pub async fn create_post(
    State(state): State<crate::AppState>,
    Form(form): Form<AuthorForm>,
) -> AppResult<Response> {
    match check(form) {
        Ok(data) => {
            let author = state.services.catalog.create_author(data).await?;
            Ok(Redirect::to(&author.url()).into_response())
        }
        Err(Invalid { form, errors }) => {
            Ok(form_page("Create Author", &form, &errors).into_response())
        }
    }
}

pub async fn update_get(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Page> {
    let author = state.services.catalog.get_author(id).await?;
    let form = AuthorForm {
        first_name: author.first_name.clone(),
        family_name: author.family_name.clone(),
        date_of_birth: author.date_of_birth.map(|d| d.to_string()).unwrap_or_default(),
        date_of_death: author.date_of_death.map(|d| d.to_string()).unwrap_or_default(),
    };
    Ok(form_page("Update Author", &form, &[]))
}

pub async fn update_post(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
    Form(form): Form<AuthorForm>,
) -> AppResult<Response> {
    match check(form) {
        Ok(data) => {
            let author = state.services.catalog.update_author(id, data).await?;
            Ok(Redirect::to(&author.url()).into_response())
        }
        Err(Invalid { form, errors }) => {
            Ok(form_page("Update Author", &form, &errors).into_response())
        }
    }
}

pub async fn delete_get(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Page> {
    let detail = state.services.catalog.author_detail(id).await?;
    Ok(detail_page("author_delete", "Delete Author", &detail))
}

/// Refuses while the author still has books, showing them instead
pub async fn delete_post(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    match state.services.catalog.delete_author(id).await? {
        Removal::Deleted => Ok(Redirect::to("/catalog/authors").into_response()),
        Removal::Blocked(detail) => {
            Ok(detail_page("author_delete", "Delete Author", &detail).into_response())
        }
    }
}
