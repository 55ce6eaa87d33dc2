//! Field rules that the `validator` derive cannot express, plus the password policy.

use serde::Serialize;
use std::borrow::Cow;
use strum::{Display, EnumIter, IntoEnumIterator};
use validator::ValidationError;

use crate::models::Role;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Symbols that satisfy [`PasswordRequirement::Symbol`].
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// One rule of the password policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum PasswordRequirement {
    #[strum(to_string = "at least 8 characters")]
    MinLength,
    #[strum(to_string = "an uppercase letter")]
    Uppercase,
    #[strum(to_string = "a lowercase letter")]
    Lowercase,
    #[strum(to_string = "a digit")]
    Digit,
    #[strum(to_string = "a symbol from !@#$%^&*()_+-=[]{{}}|;:,.<>?")]
    Symbol,
}

impl PasswordRequirement {
    pub fn is_met_by(&self, password: &str) -> bool {
        match self {
            Self::MinLength => password.chars().count() >= MIN_PASSWORD_LENGTH,
            Self::Uppercase => password.chars().any(char::is_uppercase),
            Self::Lowercase => password.chars().any(char::is_lowercase),
            Self::Digit => password.chars().any(|c| c.is_ascii_digit()),
            Self::Symbol => password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)),
        }
    }
}

/// Check `password` against every requirement, returning all that are unmet.
pub fn check_password_strength(password: &str) -> Result<(), Vec<PasswordRequirement>> {
    let unmet: Vec<_> = PasswordRequirement::iter()
        .filter(|req| !req.is_met_by(password))
        .collect();

    if unmet.is_empty() { Ok(()) } else { Err(unmet) }
}

/// Case-folded form used for every email comparison.
///
/// ASCII-only folding matches `LOWER()` in Postgres for the ASCII addresses
/// [`validate_ascii_email`] admits, whatever the database collation.
pub fn normalize_email(email: &str) -> String {
    email.to_ascii_lowercase()
}

/// Reject internationalized addresses so both stores agree on case folding.
pub fn validate_ascii_email(value: &str) -> Result<(), ValidationError> {
    if !value.is_ascii() {
        return Err(ValidationError::new("ascii_email")
            .with_message(Cow::Borrowed("email must contain only ASCII characters")));
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("must not be blank")));
    }
    Ok(())
}

/// Every label must name a known [`Role`].
pub fn validate_roles(roles: &[String]) -> Result<(), ValidationError> {
    let unknown: Vec<&str> = roles
        .iter()
        .map(String::as_str)
        .filter(|label| label.parse::<Role>().is_err())
        .collect();

    if unknown.is_empty() {
        return Ok(());
    }

    let mut error = ValidationError::new("unknown_role").with_message(Cow::Owned(format!(
        "unknown role(s): {}; expected one of user, admin, moderator",
        unknown.join(", ")
    )));
    error.add_param(Cow::Borrowed("unknown"), &unknown);
    Err(error)
}
