//! Genre pages

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;

use crate::{
    error::AppResult,
    models::{genre::GenreForm, Genre},
    services::catalog::{GenreDetail, Removal},
    validation::{check, FieldError, Invalid},
    views::Page,
};

use super::EntityId;

pub async fn list(State(state): State<crate::AppState>) -> AppResult<Page> {
    let genres = state.services.catalog.list_genres().await?;
    let views: Vec<_> = genres.iter().map(Genre::view).collect();
    Ok(Page::new("genre_list")
        .title("Genre List")
        .with("genre_list", &views))
}

fn detail_page(view: &'static str, title: &str, detail: &GenreDetail) -> Page {
    let books: Vec<_> = detail.books.iter().map(|b| b.view()).collect();
    Page::new(view)
        .title(title)
        .with("genre", &detail.genre.view())
        .with("books", &books)
}

pub async fn detail(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Page> {
    let detail = state.services.catalog.genre_detail(id).await?;
    Ok(detail_page("genre_detail", "Genre Detail", &detail))
}

fn form_page(title: &str, form: &GenreForm, errors: &[FieldError]) -> Page {
    Page::new("genre_form")
        .title(title)
        .with("genre", form)
        .errors(errors)
}

pub async fn create_get() -> Page {
    form_page("Create Genre", &GenreForm::default(), &[])
}

/// A name that already exists, ignoring case, redirects to that genre
pub async fn create_post(
    State(state): State<crate::AppState>,
    Form(form): Form<GenreForm>,
) -> AppResult<Response> {
    match check(form) {
        Ok(name) => {
            let created = state.services.catalog.create_genre(name).await?;
            Ok(Redirect::to(&created.genre().url()).into_response())
        }
        Err(Invalid { form, errors }) => {
            Ok(form_page("Create Genre", &form, &errors).into_response())
        }
    }
}

pub async fn update_get(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Page> {
    let genre = state.services.catalog.get_genre(id).await?;
    Ok(form_page("Update Genre", &GenreForm { name: genre.name }, &[]))
}

pub async fn update_post(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
    Form(form): Form<GenreForm>,
) -> AppResult<Response> {
    match check(form) {
        Ok(name) => {
            state.services.catalog.get_genre(id).await?;
            let genre = state.services.catalog.update_genre(id, name).await?;
            Ok(Redirect::to(&genre.url()).into_response())
        }
        Err(Invalid { form, errors }) => {
            Ok(form_page("Update Genre", &form, &errors).into_response())
        }
    }
}

pub async fn delete_get(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Page> {
    let detail = state.services.catalog.genre_detail(id).await?;
    Ok(detail_page("genre_delete", "Delete Genre", &detail))
}

pub async fn delete_post(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    match state.services.catalog.delete_genre(id).await? {
        Removal::Deleted => Ok(Redirect::to("/catalog/genres").into_response()),
        Removal::Blocked(detail) => {
            Ok(detail_page("genre_delete", "Delete Genre", &detail).into_response())
        }
    }
}
