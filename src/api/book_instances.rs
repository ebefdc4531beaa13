//! Book copy pages

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;

use crate::{
    error::AppResult,
    models::{book_instance::BookInstanceForm, Book, BookInstanceStatus},
    services::catalog::InstanceDetail,
    validation::{check, sanitize, FieldError, Invalid},
    views::Page,
    AppState,
};

use super::EntityId;

pub async fn list(State(state): State<AppState>) -> AppResult<Page> {
    let instances = state.services.catalog.list_instances().await?;
    let views: Vec<_> = instances
        .iter()
        .map(|i| i.instance.view_with(i.book.as_ref()))
        .collect();
    Ok(Page::new("bookinstance_list")
        .title("Book Instance List")
        .with("book_instances", &views))
}

fn detail_page(view: &'static str, title: &str, detail: &InstanceDetail) -> Page {
    Page::new(view)
        .title(title)
        .with("book_instance", &detail.instance.view_with(detail.book.as_ref()))
}

pub async fn detail(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Page> {
    let detail = state.services.catalog.instance_detail(id).await?;
    Ok(detail_page("bookinstance_detail", "Book Instance Detail", &detail))
}

/// Copy form with the book list and status values
async fn form_page(
    state: &AppState,
    title: &str,
    form: &BookInstanceForm,
    errors: &[FieldError],
) -> AppResult<Page> {
    let books = state.services.catalog.instance_form_options().await?;
    let books: Vec<_> = books.iter().map(Book::view).collect();
    Ok(Page::new("bookinstance_form")
        .title(title)
        .with("books", &books)
        .with("possible_status", &BookInstanceStatus::ALL)
        .with("book_instance", form)
        .errors(errors))
}

pub async fn create_get(State(state): State<AppState>) -> AppResult<Page> {
    form_page(&state, "Create Book Instance", &BookInstanceForm::default(), &[]).await
}

pub async fn create_post(
    State(state): State<AppState>,
    Form(form): Form<BookInstanceForm>,
) -> AppResult<Response> {
    let data = match check(form.clone()) {
        Ok(data) => data,
        Err(Invalid { form, errors }) => {
            return Ok(form_page(&state, "Create Book Instance", &form, &errors)
                .await?
                .into_response());
        }
    };

    let errors = state.services.catalog.instance_reference_errors(&data).await?;
    if !errors.is_empty() {
        let form = sanitize(form);
        return Ok(form_page(&state, "Create Book Instance", &form, &errors)
            .await?
            .into_response());
    }

    let instance = state.services.catalog.create_instance(data).await?;
    Ok(Redirect::to(&instance.url()).into_response())
}

pub async fn update_get(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Page> {
    let instance = state.services.catalog.get_instance(id).await?;
    form_page(
        &state,
        "Update Book Instance",
        &BookInstanceForm::from_instance(&instance),
        &[],
    )
    .await
}

pub async fn update_post(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    Form(form): Form<BookInstanceForm>,
) -> AppResult<Response> {
    state.services.catalog.get_instance(id).await?;

    let data = match check(form.clone()) {
        Ok(data) => data,
        Err(Invalid { form, errors }) => {
            return Ok(form_page(&state, "Update Book Instance", &form, &errors)
                .await?
                .into_response());
        }
    };

    let errors = state.services.catalog.instance_reference_errors(&data).await?;
    if !errors.is_empty() {
        let form = sanitize(form);
        return Ok(form_page(&state, "Update Book Instance", &form, &errors)
            .await?
            .into_response());
    }

    let instance = state.services.catalog.update_instance(id, data).await?;
    Ok(Redirect::to(&instance.url()).into_response())
}

pub async fn delete_get(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Page> {
    let detail = state.services.catalog.instance_detail(id).await?;
    Ok(detail_page("bookinstance_delete", "Delete Book Instance", &detail))
}

pub async fn delete_post(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Redirect> {
    state.services.catalog.delete_instance(id).await?;
    Ok(Redirect::to("/catalog/bookinstances"))
}
