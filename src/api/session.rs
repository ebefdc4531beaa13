//! Session middleware: cookie in, principal resolved, pending flashes
//! handed to this request, record written back

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use uuid::Uuid;

use crate::{
    error::AppResult,
    services::sessions::{Commit, Session, SessionData},
    AppState,
};

use super::CurrentUser;

pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let (session, principal) = match open(&state, &jar).await {
        Ok(opened) => opened,
        Err(e) => return e.into_response(),
    };
    let flashes = session.take_flashes().await;
    let user_before = principal.0.as_ref().map(|p| p.id);
    let may_write = !req.method().is_safe();

    req.extensions_mut().insert(session.clone());
    req.extensions_mut().insert(principal.clone());
    req.extensions_mut().insert(flashes.clone());

    let mut response = next.run(req).await;

    // Login, logout or an account update may have changed who is shown
    let user_after = session.user_id().await;
    let principal = if user_after != user_before || (may_write && user_after.is_some()) {
        match resolve(&state, user_after).await {
            Ok(principal) => principal,
            Err(e) => return e.into_response(),
        }
    } else {
        principal
    };
    response.extensions_mut().insert(principal);
    response.extensions_mut().insert(flashes);

    match write_back(&state, session.commit().await).await {
        Ok(Some(cookie)) => (jar.add(cookie), response).into_response(),
        Ok(None) => response,
        Err(e) => e.into_response(),
    }
}

/// Load the session record named by the cookie and resolve its user.
/// Unknown or expired tokens start an empty session.
async fn open(state: &AppState, jar: &CookieJar) -> AppResult<(Session, CurrentUser)> {
    let cookie_name = &state.config.session.cookie_name;
    let stored = match jar.get(cookie_name).map(|c| c.value().to_string()) {
        Some(token) => state
            .services
            .sessions
            .load(&token)
            .await?
            .map(|data| (token, data)),
        None => None,
    };

    let (token, data) = match stored {
        Some((token, data)) => (Some(token), data),
        None => (None, SessionData::default()),
    };

    let principal = resolve(state, data.user_id).await?;
    Ok((Session::new(token, data), principal))
}

async fn resolve(state: &AppState, user_id: Option<Uuid>) -> AppResult<CurrentUser> {
    let principal = match user_id {
        Some(id) => state.services.auth.find_principal(id).await?,
        None => None,
    };
    Ok(CurrentUser(principal))
}

/// Apply the session commit, returning the cookie to send, if any
async fn write_back(state: &AppState, commit: Commit) -> AppResult<Option<Cookie<'static>>> {
    let store = &state.services.sessions;
    let config = &state.config.session;

    if let Some(old) = &commit.remove {
        store.destroy(old).await?;
    }

    if let Some((token, data)) = &commit.save {
        store.save(token, data, config.ttl()).await?;
        let cookie = Cookie::build((config.cookie_name.clone(), token.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::hours(config.ttl_hours as i64))
            .build();
        return Ok(Some(cookie));
    }

    if commit.clear_cookie {
        let expired = Cookie::build((config.cookie_name.clone(), ""))
            .path("/")
            .http_only(true)
            .max_age(time::Duration::ZERO)
            .build();
        return Ok(Some(expired));
    }

    Ok(None)
}
