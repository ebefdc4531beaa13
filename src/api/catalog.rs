//! Catalog home page

use axum::extract::State;

use crate::{error::AppResult, views::Page};

/// Record counts for books, copies, authors and genres
pub async fn index(State(state): State<crate::AppState>) -> AppResult<Page> {
    let counts = state.services.catalog.counts().await?;
    Ok(Page::new("index")
        .title("Local Library Home")
        .with("counts", &counts))
}
