//! HTTP handlers and router for the Local Library

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod gate;
pub mod genres;
pub mod health;
pub mod responder;
pub mod session;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{header, request::Parts, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::Principal,
    services::sessions::{Flashes, Session},
    views::Page,
    AppState,
};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' code.jquery.com cdn.jsdelivr.net; \
    style-src 'self' 'unsafe-inline' cdn.jsdelivr.net; \
    object-src 'none'; base-uri 'self'; frame-ancestors 'self'";

/// Build the application router with all routes and middleware
pub fn router(state: AppState) -> Router {
    let users = Router::new()
        .route("/login", get(users::login_get).post(users::login_post))
        .route("/logout", get(users::logout))
        .route("/register", get(users::register_get).post(users::register_post))
        .route("/:id", get(users::profile))
        .route("/:id/update", get(users::update_get).post(users::update_post));

    let catalog = Router::new()
        .route("/", get(catalog::index))
        // Books
        .route("/books", get(books::list))
        .route("/book/create", get(books::create_get).post(books::create_post))
        .route("/book/:id", get(books::detail))
        .route("/book/:id/update", get(books::update_get).post(books::update_post))
        .route("/book/:id/delete", get(books::delete_get).post(books::delete_post))
        // Authors
        .route("/authors", get(authors::list))
        .route("/author/create", get(authors::create_get).post(authors::create_post))
        .route("/author/:id", get(authors::detail))
        .route("/author/:id/update", get(authors::update_get).post(authors::update_post))
        .route("/author/:id/delete", get(authors::delete_get).post(authors::delete_post))
        // Genres
        .route("/genres", get(genres::list))
        .route("/genre/create", get(genres::create_get).post(genres::create_post))
        .route("/genre/:id", get(genres::detail))
        .route("/genre/:id/update", get(genres::update_get).post(genres::update_post))
        .route("/genre/:id/delete", get(genres::delete_get).post(genres::delete_post))
        // Book instances
        .route("/bookinstances", get(book_instances::list))
        .route(
            "/bookinstance/create",
            get(book_instances::create_get).post(book_instances::create_post),
        )
        .route("/bookinstance/:id", get(book_instances::detail))
        .route(
            "/bookinstance/:id/update",
            get(book_instances::update_get).post(book_instances::update_post),
        )
        .route(
            "/bookinstance/:id/delete",
            get(book_instances::delete_get).post(book_instances::delete_post),
        )
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), gate::access_gate));

    Router::new()
        .route("/", get(|| async { Redirect::to("/catalog") }))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/users", users)
        .nest("/catalog", catalog)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), session::session_layer))
        .layer(middleware::from_fn_with_state(state.clone(), responder::render_views))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> Response {
    Page::new("error")
        .status(StatusCode::NOT_FOUND)
        .title("Not Found")
        .with("message", "Not Found")
        .with("status", &404)
        .into_response()
}

/// Entity id from the `:id` path segment. Anything that is not a UUID
/// cannot name a record, so it is reported as not found.
pub struct EntityId(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for EntityId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound("Not Found".to_string()))?;

        Uuid::parse_str(&raw)
            .map(EntityId)
            .map_err(|_| AppError::NotFound("Not Found".to_string()))
    }
}

/// Principal resolved from the session cookie, if any
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<Principal>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default())
    }
}

/// Messages flashed by the previous request
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Flashes {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Flashes>().cloned().unwrap_or_default())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session layer is not installed".to_string()))
    }
}

/// Extractor for a logged-in user. Anonymous requests are sent to the
/// login page with a flash message.
pub struct AuthenticatedUser(pub Principal);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(principal) = CurrentUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match principal {
            Some(principal) => Ok(AuthenticatedUser(principal)),
            None => {
                let session = Session::from_request_parts(parts, state)
                    .await
                    .map_err(IntoResponse::into_response)?;
                Err(gate::login_required(&session).await)
            }
        }
    }
}
