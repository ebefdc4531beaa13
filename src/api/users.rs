//! Account endpoints: login, logout, registration, profile

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginForm, RegisterForm, UpdateUserForm},
    services::sessions::{FlashKind, Flashes, Session},
    validation::{check, FieldError, Invalid},
    views::Page,
};

use super::{AuthenticatedUser, CurrentUser, EntityId};

/// Login page. Shows the first pending error and success messages.
pub async fn login_get(CurrentUser(current): CurrentUser, flashes: Flashes) -> Response {
    if current.is_some() {
        return Redirect::to("/").into_response();
    }

    let error = flashes.of(FlashKind::Error).next();
    let success = flashes.of(FlashKind::Success).next();
    let messages: Vec<&str> = error.into_iter().chain(success).collect();

    Page::new("user_login")
        .title("Login")
        .with("messages", &messages)
        .into_response()
}

pub async fn login_post(
    State(state): State<crate::AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Redirect> {
    match state
        .services
        .auth
        .login(&session, &form.username, &form.password)
        .await
    {
        Ok(_) => Ok(Redirect::to("/")),
        Err(AppError::Authentication(message)) => {
            session.flash(FlashKind::Error, message).await;
            Ok(Redirect::to("/users/login"))
        }
        Err(e) => Err(e),
    }
}

pub async fn logout(State(state): State<crate::AppState>, session: Session) -> Redirect {
    state.services.auth.logout(&session).await;
    Redirect::to("/")
}

pub async fn register_get() -> Page {
    Page::new("user_form").title("Create User")
}

fn register_form_page(status: StatusCode, form: &RegisterForm, errors: &[FieldError]) -> Response {
    Page::new("user_form")
        .status(status)
        .title("Create User")
        .with("user", form)
        .errors(errors)
        .into_response()
}

pub async fn register_post(
    State(state): State<crate::AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let data = match check(form) {
        Ok(data) => data,
        Err(Invalid { form, errors }) => {
            return Ok(register_form_page(StatusCode::BAD_REQUEST, &form, &errors));
        }
    };

    let shown = RegisterForm {
        username: data.username.clone(),
        fullname: data.fullname.clone(),
        email: data.email.clone(),
        ..Default::default()
    };
    match state.services.auth.register(data).await {
        Ok(_) => {
            session
                .flash(FlashKind::Success, "Successfully registered. You can log in now!")
                .await;
            Ok(Redirect::to("/users/login").into_response())
        }
        Err(AppError::Conflict(message)) => Ok(register_form_page(
            StatusCode::CONFLICT,
            &shown,
            &[FieldError::new("username", message)],
        )),
        Err(e) => Err(e),
    }
}

pub async fn profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    flashes: Flashes,
    EntityId(id): EntityId,
) -> AppResult<Page> {
    let user = state.services.auth.get_user(&actor, id).await?;
    let messages: Vec<&str> = flashes.of(FlashKind::Success).collect();

    Ok(Page::new("user_profile")
        .title(&user.fullname)
        .with("user", &user.principal())
        .with("messages", &messages))
}

fn update_form_page(status: StatusCode, form: &UpdateUserForm, errors: &[FieldError]) -> Response {
    Page::new("user_form")
        .status(status)
        .title("Update User")
        .with("user", form)
        .errors(errors)
        .into_response()
}

pub async fn update_get(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    let user = state.services.auth.get_user(&actor, id).await?;
    Ok(update_form_page(StatusCode::OK, &UpdateUserForm::from_user(&user), &[]))
}

pub async fn update_post(
    State(state): State<crate::AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    session: Session,
    EntityId(id): EntityId,
    Form(form): Form<UpdateUserForm>,
) -> AppResult<Response> {
    state.services.auth.authorize_account(&actor, id)?;

    let data = match check(form) {
        Ok(data) => data,
        Err(Invalid { form, errors }) => {
            return Ok(update_form_page(StatusCode::BAD_REQUEST, &form, &errors));
        }
    };

    let shown = UpdateUserForm {
        username: data.username.clone(),
        fullname: data.fullname.clone(),
        email: data.email.clone(),
        role: data.role.map(|r| i16::from(r).to_string()).unwrap_or_default(),
        ..Default::default()
    };
    match state.services.auth.update_user(&actor, id, data).await {
        Ok(user) => {
            session.flash(FlashKind::Success, "Update user succesfully").await;
            Ok(Redirect::to(&user.url()).into_response())
        }
        Err(AppError::Conflict(message)) => Ok(update_form_page(
            StatusCode::CONFLICT,
            &shown,
            &[FieldError::new("username", message)],
        )),
        Err(e) => Err(e),
    }
}
