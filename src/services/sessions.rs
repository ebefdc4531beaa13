//! Server-side sessions.
//!
//! The client only ever holds an opaque token. Everything else (the bound
//! user id and pending flash messages) lives in a [`SessionStore`] record
//! that expires with the configured TTL.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::AppResult;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub message: String,
}

/// Messages flashed by the previous request, available to the current one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flashes(pub Vec<FlashMessage>);

impl Flashes {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn of(&self, kind: FlashKind) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(move |f| f.kind == kind)
            .map(|f| f.message.as_str())
    }

    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|f| f.message.as_str()).collect()
    }
}

/// Stored session record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub flash: Vec<FlashMessage>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.flash.is_empty()
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, token: &str) -> AppResult<Option<SessionData>>;

    async fn save(&self, token: &str, data: &SessionData, ttl: Duration) -> AppResult<()>;

    async fn destroy(&self, token: &str) -> AppResult<()>;
}

/// Fresh random session token, URL-safe base64
pub fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Session records kept in process memory
#[derive(Default)]
pub struct MemorySessionStore {
    records: RwLock<HashMap<String, (SessionData, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> AppResult<Option<SessionData>> {
        let mut records = self.records.write().await;
        match records.get(token) {
            Some((_, expires)) if *expires <= Instant::now() => {
                records.remove(token);
                Ok(None)
            }
            Some((data, _)) => Ok(Some(data.clone())),
            None => Ok(None),
        }
    }

    async fn save(&self, token: &str, data: &SessionData, ttl: Duration) -> AppResult<()> {
        self.records
            .write()
            .await
            .insert(token.to_string(), (data.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn destroy(&self, token: &str) -> AppResult<()> {
        self.records.write().await.remove(token);
        Ok(())
    }
}

#[derive(Debug)]
struct SessionState {
    token: Option<String>,
    data: SessionData,
    dirty: bool,
    rotate: bool,
}

/// What has to happen to the stored record once the request is done
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Commit {
    /// Record to delete
    pub remove: Option<String>,
    /// Record to write, and the token the cookie should carry
    pub save: Option<(String, SessionData)>,
    /// Drop the client cookie
    pub clear_cookie: bool,
}

/// Per-request handle on the session. Cloned into the request extensions.
#[derive(Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new(token: Option<String>, data: SessionData) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                token,
                data,
                dirty: false,
                rotate: false,
            })),
        }
    }

    pub async fn user_id(&self) -> Option<Uuid> {
        self.state.lock().await.data.user_id
    }

    /// Bind the session to `user_id` under a fresh token
    pub async fn establish(&self, user_id: Uuid) {
        let mut state = self.state.lock().await;
        state.data.user_id = Some(user_id);
        state.dirty = true;
        state.rotate = true;
    }

    /// Forget the user and any pending messages
    pub async fn destroy(&self) {
        let mut state = self.state.lock().await;
        state.data = SessionData::default();
        state.dirty = true;
        state.rotate = true;
    }

    pub async fn flash(&self, kind: FlashKind, message: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.data.flash.push(FlashMessage {
            kind,
            message: message.into(),
        });
        state.dirty = true;
    }

    /// Remove every pending message. Called once per request, so messages
    /// flashed while handling one request are shown by the next.
    pub async fn take_flashes(&self) -> Flashes {
        let mut state = self.state.lock().await;
        let taken = std::mem::take(&mut state.data.flash);
        if !taken.is_empty() {
            state.dirty = true;
        }
        Flashes(taken)
    }

    /// Work out the store writes for this request
    pub async fn commit(&self) -> Commit {
        let state = self.state.lock().await;
        if !state.dirty {
            return Commit::default();
        }

        let old = state.token.clone();
        if state.data.is_empty() {
            return Commit {
                clear_cookie: old.is_some(),
                remove: old,
                save: None,
            };
        }

        match old {
            Some(token) if !state.rotate => Commit {
                remove: None,
                save: Some((token, state.data.clone())),
                clear_cookie: false,
            },
            old => Commit {
                remove: old,
                save: Some((new_token(), state.data.clone())),
                clear_cookie: false,
            },
        }
    }
}
