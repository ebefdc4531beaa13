//! Renders pending views into HTML responses

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};

use crate::{error::ErrorReport, services::sessions::Flashes, views::PendingView, AppState};

use super::CurrentUser;

/// Adds `current_user`, `is_authenticated` and the flashed `messages` to
/// every view, plus the error detail outside production, then renders it.
pub async fn render_views(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let Some(view) = response.extensions_mut().remove::<PendingView>() else {
        return response;
    };

    let mut context = view.context;
    let current_user = response
        .extensions()
        .get::<CurrentUser>()
        .and_then(|c| c.0.clone());
    context.insert("is_authenticated".into(), Value::Bool(current_user.is_some()));
    context.insert(
        "current_user".into(),
        serde_json::to_value(&current_user).unwrap_or(Value::Null),
    );

    if !context.contains_key("messages") {
        let messages = response
            .extensions()
            .get::<Flashes>()
            .map(Flashes::messages)
            .unwrap_or_default();
        context.insert("messages".into(), json!(messages));
    }

    if !state.config.server.is_production() {
        if let Some(report) = response.extensions().get::<ErrorReport>() {
            context.insert("error".into(), json!({ "detail": report.detail }));
        }
    }

    let html = state.renderer.render(view.name, &context);
    let (mut parts, _) = response.into_parts();
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}
