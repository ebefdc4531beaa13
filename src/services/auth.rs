//! Authenticator: login, logout, registration and account updates

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::BootstrapAdmin,
    error::{AppError, AppResult},
    models::{
        user::{RegisterUser, UpdateUser},
        Principal, Role, User,
    },
    repository::Repository,
};

use super::sessions::Session;

pub const WRONG_USERNAME: &str = "Wrong username";
pub const WRONG_PASSWORD: &str = "Wrong password";
pub const USER_EXISTS: &str = "User already exist";

#[derive(Clone)]
pub struct Authenticator {
    repository: Repository,
}

impl Authenticator {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Check `username`/`password` and bind the session to the user.
    /// Nothing is written to the session on failure.
    pub async fn login(&self, session: &Session, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication(WRONG_USERNAME.to_string()))?;

        if !user.validate_password(password) {
            return Err(AppError::Authentication(WRONG_PASSWORD.to_string()));
        }

        session.establish(user.id).await;
        info!(user = %user.username, "User logged in");
        Ok(user)
    }

    /// Safe to call without an active session
    pub async fn logout(&self, session: &Session) {
        if let Some(id) = session.user_id().await {
            info!(user_id = %id, "User logged out");
        }
        session.destroy().await;
    }

    /// Create a reader account
    pub async fn register(&self, data: RegisterUser) -> AppResult<User> {
        if self.repository.users.username_exists(&data.username, None).await? {
            return Err(AppError::Conflict(USER_EXISTS.to_string()));
        }

        let user = User::new(data.username, data.fullname, data.email, Role::Reader, &data.password);
        self.repository.users.create(&user).await?;

        info!(user = %user.username, "User registered");
        Ok(user)
    }

    /// Owners may see and edit their own account; admins any account
    pub fn authorize_account(&self, actor: &Principal, id: Uuid) -> AppResult<()> {
        if actor.id == id || actor.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You can only manage your own account".to_string(),
            ))
        }
    }

    pub async fn get_user(&self, actor: &Principal, id: Uuid) -> AppResult<User> {
        self.authorize_account(actor, id)?;
        self.repository.users.get_by_id(id).await
    }

    /// Apply a profile update. The password is always re-set, which also
    /// regenerates the salt. Only admins can change roles.
    pub async fn update_user(&self, actor: &Principal, id: Uuid, data: UpdateUser) -> AppResult<User> {
        self.authorize_account(actor, id)?;

        let mut user = self.repository.users.get_by_id(id).await?;
        if self
            .repository
            .users
            .username_exists(&data.username, Some(id))
            .await?
        {
            return Err(AppError::Conflict(USER_EXISTS.to_string()));
        }

        user.username = data.username;
        user.fullname = data.fullname;
        user.email = data.email;
        user.set_password(&data.password);
        if let Some(role) = data.role {
            if actor.is_admin() {
                user.role = role.into();
            }
        }

        self.repository.users.update(&user).await?;
        debug!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Resolve a session's user id. Accounts that no longer exist yield `None`.
    pub async fn find_principal(&self, id: Uuid) -> AppResult<Option<Principal>> {
        match self.repository.users.get_by_id(id).await {
            Ok(user) => Ok(Some(user.principal())),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create the configured admin account if its username is free
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdmin) -> AppResult<()> {
        if self
            .repository
            .users
            .get_by_username(&admin.username)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let user = User::new(
            admin.username.clone(),
            admin.fullname.clone(),
            admin.email.clone(),
            Role::Admin,
            &admin.password,
        );
        self.repository.users.create(&user).await?;
        info!(user = %user.username, "Bootstrap admin account created");
        Ok(())
    }
}
