use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

use crate::validation::{validate_ascii_email, validate_not_blank, validate_roles};

/// Coarse-grained capability label
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Moderator,
}

impl Role {
    /// Parse role labels into a sorted, de-duplicated set.
    ///
    /// Unknown labels are skipped (inputs are validated beforehand); an empty
    /// result falls back to `[user]`.
    pub fn parse_set<S: AsRef<str>>(labels: &[S]) -> Vec<Role> {
        let mut roles: Vec<Role> = labels
            .iter()
            .filter_map(|label| label.as_ref().parse().ok())
            .collect();
        roles.sort();
        roles.dedup();

        if roles.is_empty() {
            vec![Role::User]
        } else {
            roles
        }
    }
}

/// Full user record, including the password hash.
///
/// Never serialised; convert to [`UserResponse`] before it leaves the service.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("roles", &self.roles)
            .field("date_of_birth", &self.date_of_birth)
            .field("phone_number", &self.phone_number)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// Overwrite every field present in `update`. The password is applied separately, hashed.
    pub fn apply_update(&mut self, update: UpdateUser) {
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(roles) = update.roles {
            self.roles = Role::parse_set(&roles);
        }
        if let Some(date_of_birth) = update.date_of_birth {
            self.date_of_birth = Some(date_of_birth);
        }
        if let Some(phone_number) = update.phone_number {
            self.phone_number = Some(phone_number);
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
    }

    /// Bump `updated_at` to now, never moving it backwards.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// A validated user ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewUser {
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            roles: self.roles,
            date_of_birth: self.date_of_birth,
            phone_number: self.phone_number,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public view of a user; carries no password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Vec<Role>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            roles: user.roles,
            date_of_birth: user.date_of_birth,
            phone_number: user.phone_number,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Input for creating a user.
///
/// Password strength is checked separately so that every unmet requirement can be reported.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 2, max = 100), custom(function = "validate_not_blank"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 100), custom(function = "validate_not_blank"))]
    pub last_name: String,
    #[validate(email, length(max = 255), custom(function = "validate_ascii_email"))]
    pub email: String,
    #[validate(length(max = 128))]
    pub password: String,
    #[serde(default)]
    #[validate(custom(function = "validate_roles"))]
    pub roles: Vec<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 2, max = 100), custom(function = "validate_not_blank"))]
    pub first_name: Option<String>,
    #[validate(length(min = 2, max = 100), custom(function = "validate_not_blank"))]
    pub last_name: Option<String>,
    #[validate(email, length(max = 255), custom(function = "validate_ascii_email"))]
    pub email: Option<String>,
    #[validate(length(max = 128))]
    pub password: Option<String>,
    #[validate(custom(function = "validate_roles"))]
    pub roles: Option<Vec<String>>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct UserFilter {
    pub is_active: Option<bool>,
}

impl UserFilter {
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        self.is_active.is_none_or(|active| user.is_active == active)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmailQuery {
    #[validate(length(min = 1, max = 255))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Self-service sign-up; roles cannot be chosen here.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100), custom(function = "validate_not_blank"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 100), custom(function = "validate_not_blank"))]
    pub last_name: String,
    #[validate(email, length(max = 255), custom(function = "validate_ascii_email"))]
    pub email: String,
    #[validate(length(max = 128))]
    pub password: String,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
}

impl From<RegisterRequest> for CreateUser {
    fn from(req: RegisterRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password: req.password,
            roles: vec![Role::User.to_string()],
            date_of_birth: req.date_of_birth,
            phone_number: req.phone_number,
        }
    }
}
