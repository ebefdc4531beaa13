//! Business logic services

pub mod access;
pub mod auth;
pub mod catalog;
pub mod credentials;
pub mod redis;
pub mod sessions;

use std::sync::Arc;

use crate::repository::Repository;

use self::sessions::SessionStore;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::Authenticator,
    pub catalog: catalog::CatalogService,
    pub sessions: Arc<dyn SessionStore>,
}

impl Services {
    /// Create all services with the given repository and session store
    pub fn new(repository: Repository, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            auth: auth::Authenticator::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository),
            sessions,
        }
    }
}
