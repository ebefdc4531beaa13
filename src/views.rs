//! View rendering.
//!
//! Handlers never produce HTML themselves: they return a [`Page`] naming a
//! view and carrying its data context. The responder middleware adds the
//! per-request locals (current user, error detail) and hands the result to
//! the configured [`ViewRenderer`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::validation::FieldError;

/// A view waiting to be rendered, stored in the response extensions.
#[derive(Debug, Clone)]
pub struct PendingView {
    pub name: &'static str,
    pub context: Map<String, Value>,
}

/// Builder for a rendered page response
#[derive(Debug, Clone)]
pub struct Page {
    status: StatusCode,
    view: PendingView,
}

impl Page {
    pub fn new(name: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            view: PendingView {
                name,
                context: Map::new(),
            },
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn title(self, title: &str) -> Self {
        self.with("title", title)
    }

    pub fn errors(self, errors: &[FieldError]) -> Self {
        self.with("errors", errors)
    }

    /// Add a value to the view context. Values that fail to serialize are
    /// rendered as null.
    pub fn with<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.view.context.insert(key.to_string(), value);
        self
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let mut response = self.status.into_response();
        response.extensions_mut().insert(self.view);
        response
    }
}

/// Turns a view name and its data context into an HTML document.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &str, context: &Map<String, Value>) -> String;
}

/// Renders a minimal HTML shell that embeds the view context as JSON, for
/// a client-side template layer to pick up.
#[derive(Debug, Default, Clone)]
pub struct JsonShellRenderer;

impl ViewRenderer for JsonShellRenderer {
    fn render(&self, view: &str, context: &Map<String, Value>) -> String {
        let title = context
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Local Library");
        // "<" only ever appears inside JSON strings, where < is equivalent
        let json = Value::Object(context.clone())
            .to_string()
            .replace('<', "\\u003c");

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body data-view=\"{}\">\n<script type=\"application/json\" id=\"view-context\">{}</script>\n</body>\n</html>\n",
            html_escape::encode_text(title),
            html_escape::encode_double_quoted_attribute(view),
            json
        )
    }
}
