//! User model and account forms

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::{
    services::credentials::Credentials,
    validation::{Collector, FieldError, FormInput, ALPHANUMERIC},
};

/// Account roles, stored as a small integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i16)]
pub enum Role {
    Reader = 0,
    Editor = 1,
    Admin = 2,
}

impl TryFrom<i16> for Role {
    type Error = i16;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Role::Reader),
            1 => Ok(Role::Editor),
            2 => Ok(Role::Admin),
            other => Err(other),
        }
    }
}

impl From<Role> for i16 {
    fn from(r: Role) -> Self {
        r as i16
    }
}

/// Full user record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub fullname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub salt: String,
    #[serde(skip_serializing)]
    pub hash: String,
    /// Raw stored value; see [`Role`]
    pub role: i16,
}

impl User {
    /// New account with credentials derived from `password`
    pub fn new(username: String, fullname: String, email: String, role: Role, password: &str) -> Self {
        let mut user = Self {
            id: Uuid::new_v4(),
            username,
            fullname,
            email,
            salt: String::new(),
            hash: String::new(),
            role: role.into(),
        };
        user.set_password(password);
        user
    }

    /// Replace salt and hash. Always regenerates the salt.
    pub fn set_password(&mut self, password: &str) {
        let creds = Credentials::generate(password);
        self.salt = creds.salt;
        self.hash = creds.hash;
    }

    pub fn validate_password(&self, candidate: &str) -> bool {
        Credentials {
            salt: self.salt.clone(),
            hash: self.hash.clone(),
        }
        .verify(candidate)
    }

    pub fn url(&self) -> String {
        format!("/users/{}", self.id)
    }

    /// The user as exposed to views and session-derived state
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            username: self.username.clone(),
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            role: self.role,
            url: self.url(),
        }
    }
}

/// Authenticated user without credential material
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub role: i16,
    pub url: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin as i16
    }
}

/// Login form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Validated registration data
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub password: String,
}

/// Registration form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        length(min = 3, message = "Username must be at least 3 characters long."),
        regex(path = *ALPHANUMERIC, message = "User name contains non-alphanumeric character")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 3, message = "Full name must be at least 3 characters long."))]
    pub fullname: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 4, max = 32, message = "Password must be between 4-32 characters long."))]
    pub password: String,
    #[serde(default, rename = "passwordConfirm", skip_serializing)]
    pub password_confirm: String,
}

/// Password confirmation rules shared by registration and profile update
fn check_password_confirm(password: &str, confirm: &str, errors: &mut Collector) {
    if !(4..=32).contains(&confirm.chars().count()) {
        errors.push(FieldError::new(
            "passwordConfirm",
            "Password confirm must be between 4-32 characters long.",
        ));
    }
    if confirm != password {
        errors.push(FieldError::new("passwordConfirm", "Confirm password wrong"));
    }
}

impl FormInput for RegisterForm {
    type Output = RegisterUser;

    const FIELDS: &'static [&'static str] =
        &["username", "fullname", "email", "password", "passwordConfirm"];

    // Passwords are taken verbatim
    fn trim(mut self) -> Self {
        self.username = crate::validation::trimmed(self.username);
        self.fullname = crate::validation::trimmed(self.fullname);
        self.email = crate::validation::trimmed(self.email);
        self
    }

    fn build(&self) -> Result<RegisterUser, Vec<FieldError>> {
        let mut errors = Collector::default();
        check_password_confirm(&self.password, &self.password_confirm, &mut errors);
        errors.finish(RegisterUser {
            username: self.username.clone(),
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        })
    }
}

/// Validated profile update
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub password: String,
    /// `None` keeps the current role
    pub role: Option<Role>,
}

/// Profile update form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserForm {
    #[serde(default)]
    #[validate(
        length(min = 3, message = "Username must be at least 3 characters long."),
        regex(path = *ALPHANUMERIC, message = "User name contains non-alphanumeric character")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 3, message = "Full name must be at least 3 characters long."))]
    pub fullname: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[serde(default, skip_serializing)]
    #[validate(length(min = 4, max = 32, message = "Password must be between 4-32 characters long."))]
    pub password: String,
    #[serde(default, rename = "passwordConfirm", skip_serializing)]
    pub password_confirm: String,
    #[serde(default)]
    pub role: String,
}

impl UpdateUserForm {
    /// Prefill from an existing account
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            role: user.role.to_string(),
            ..Default::default()
        }
    }
}

impl FormInput for UpdateUserForm {
    type Output = UpdateUser;

    const FIELDS: &'static [&'static str] =
        &["username", "fullname", "email", "password", "passwordConfirm", "role"];

    fn trim(mut self) -> Self {
        self.username = crate::validation::trimmed(self.username);
        self.fullname = crate::validation::trimmed(self.fullname);
        self.email = crate::validation::trimmed(self.email);
        self.role = crate::validation::trimmed(self.role);
        self
    }

    fn build(&self) -> Result<UpdateUser, Vec<FieldError>> {
        let mut errors = Collector::default();
        check_password_confirm(&self.password, &self.password_confirm, &mut errors);

        let role = if self.role.is_empty() {
            None
        } else {
            let parsed = self
                .role
                .parse::<i16>()
                .ok()
                .and_then(|v| Role::try_from(v).ok());
            if parsed.is_none() {
                errors.push(FieldError::new("role", "Role must be a number"));
            }
            parsed
        };

        errors.finish(UpdateUser {
            username: self.username.clone(),
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::check;

    fn register_form(username: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            fullname: "Alice Liddell".to_string(),
            email: "alice@example.com".to_string(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
        }
    }

    #[test]
    fn test_new_user_has_valid_credentials() {
        let user = User::new(
            "alice".into(),
            "Alice Liddell".into(),
            "alice@example.com".into(),
            Role::Reader,
            "secret1",
        );
        assert!(user.validate_password("secret1"));
        assert!(!user.validate_password("wrong"));
        assert_eq!(user.role, 0);
    }

    #[test]
    fn test_set_password_regenerates_salt() {
        let mut user = User::new(
            "alice".into(),
            "Alice Liddell".into(),
            "alice@example.com".into(),
            Role::Reader,
            "secret1",
        );
        let old_salt = user.salt.clone();
        user.set_password("secret2");

        assert_ne!(user.salt, old_salt);
        assert!(user.validate_password("secret2"));
        assert!(!user.validate_password("secret1"));
    }

    #[test]
    fn test_serialized_user_has_no_credentials() {
        let user = User::new(
            "alice".into(),
            "Alice Liddell".into(),
            "alice@example.com".into(),
            Role::Editor,
            "secret1",
        );
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("salt").is_none());
        assert!(json.get("hash").is_none());

        let principal = serde_json::to_string(&user.principal()).unwrap();
        assert!(!principal.contains(&user.hash));
        assert!(!principal.contains(&user.salt));
    }

    #[test]
    fn test_role_conversion() {
        assert_eq!(Role::try_from(2), Ok(Role::Admin));
        assert_eq!(Role::try_from(7), Err(7));
    }

    #[test]
    fn test_register_form_valid() {
        let user = check(register_form("  alice ", "secret1", "secret1")).unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.password, "secret1");
    }

    #[test]
    fn test_register_form_rules() {
        let invalid = check(register_form("a!", "abc", "abd")).unwrap_err();
        let messages: Vec<&str> = invalid.errors.iter().map(|e| e.message.as_str()).collect();

        assert!(messages.contains(&"Username must be at least 3 characters long."));
        assert!(messages.contains(&"User name contains non-alphanumeric character"));
        assert!(messages.contains(&"Password must be between 4-32 characters long."));
        assert!(messages.contains(&"Confirm password wrong"));
        assert_eq!(invalid.errors[0].field, "username");
    }

    #[test]
    fn test_register_form_does_not_echo_password() {
        let json = serde_json::to_value(register_form("alice", "secret1", "secret1")).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("passwordConfirm").is_none());
    }

    #[test]
    fn test_update_form_role() {
        let mut form = UpdateUserForm {
            username: "alice".into(),
            fullname: "Alice Liddell".into(),
            email: "alice@example.com".into(),
            password: "secret1".into(),
            password_confirm: "secret1".into(),
            role: "1".into(),
        };
        assert_eq!(check(form.clone()).unwrap().role, Some(Role::Editor));

        form.role = String::new();
        assert_eq!(check(form.clone()).unwrap().role, None);

        form.role = "5".into();
        let invalid = check(form).unwrap_err();
        assert_eq!(invalid.errors, vec![FieldError::new("role", "Role must be a number")]);
    }
}
