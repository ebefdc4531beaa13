//! Access gate for `/catalog`: login check, then role check per operation

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;

use crate::{
    error::AppError,
    services::{
        access::Operation,
        sessions::{FlashKind, Session},
    },
    views::Page,
    AppState,
};

use super::CurrentUser;

pub const LOGIN_FIRST: &str = "You need to login first!";

/// Flash and redirect for requests that need a logged-in user
pub async fn login_required(session: &Session) -> Response {
    session.flash(FlashKind::Error, LOGIN_FIRST).await;
    Redirect::to("/users/login").into_response()
}

pub async fn access_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(session) = req.extensions().get::<Session>().cloned() else {
        return AppError::Internal("Session layer is not installed".to_string()).into_response();
    };

    let principal = match req.extensions().get::<CurrentUser>() {
        Some(CurrentUser(Some(principal))) => principal.clone(),
        _ => return login_required(&session).await,
    };

    let operation = Operation::classify(req.uri().path());
    if !state.config.auth.permissions.allows(principal.role, operation) {
        warn!(
            user = %principal.username,
            role = principal.role,
            %operation,
            path = %req.uri().path(),
            "Access denied"
        );
        let message = format!("You are not allowed to {} catalog records", operation);
        session.flash(FlashKind::Error, message.clone()).await;
        return Page::new("warning")
            .status(StatusCode::FORBIDDEN)
            .title("Forbidden")
            .with("message", &message)
            .into_response();
    }

    next.run(req).await
}
