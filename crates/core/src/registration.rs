//! Input rules for registration, login, and password changes.
//!
//! Every failure names the offending form field so the caller can render the
//! message inline next to it.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum username length, in characters.
pub const MIN_USERNAME_LENGTH: usize = 3;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("username pattern is valid"));

/// Validate the fields of a registration form.
///
/// Checks run in a fixed order (presence, password, email, username) and the
/// first failure wins.
pub fn validate_registration(
    email: &str,
    username: &str,
    display_name: &str,
    password: &str,
) -> Result<(), CoreError> {
    // Passwords are taken as typed; only an empty one counts as missing.
    let missing = first_blank(email, username, display_name)
        .or_else(|| password.is_empty().then_some("password"));
    if let Some(field) = missing {
        return Err(CoreError::validation(field, REQUIRED_FIELDS_MESSAGE));
    }

    validate_password_strength(password).map_err(|msg| CoreError::validation("password", msg))?;
    validate_identity(email, username)
}

/// Validate an admin edit of a user's identity fields.
///
/// An empty `new_password` leaves the password unchanged; a non-empty one
/// must meet the same minimum length as at registration.
pub fn validate_profile_update(
    email: &str,
    username: &str,
    display_name: &str,
    new_password: &str,
) -> Result<(), CoreError> {
    if let Some(field) = first_blank(email, username, display_name) {
        return Err(CoreError::validation(field, REQUIRED_FIELDS_MESSAGE));
    }
    if !new_password.is_empty() {
        validate_password_strength(new_password)
            .map_err(|msg| CoreError::validation("new_password", msg))?;
    }
    validate_identity(email, username)
}

const REQUIRED_FIELDS_MESSAGE: &str = "All required fields must be filled out";

fn first_blank(email: &str, username: &str, display_name: &str) -> Option<&'static str> {
    [
        ("email", email),
        ("username", username),
        ("display_name", display_name),
    ]
    .into_iter()
    .find(|(_, v)| v.trim().is_empty())
    .map(|(field, _)| field)
}

fn validate_identity(email: &str, username: &str) -> Result<(), CoreError> {
    validate_email(email).map_err(|msg| CoreError::validation("email", msg))?;
    validate_username(username).map_err(|msg| CoreError::validation("username", msg))
}

/// Validate the fields of a login form.
pub fn validate_login(email: &str, password: &str) -> Result<(), CoreError> {
    if email.trim().is_empty() || password.is_empty() {
        let field = if email.trim().is_empty() {
            "email"
        } else {
            "password"
        };
        return Err(CoreError::validation(
            field,
            "Please enter both email and password",
        ));
    }
    validate_email(email).map_err(|msg| CoreError::validation("email", msg))
}

/// Validate a new password and its confirmation.
pub fn validate_new_password(new_password: &str, confirm: &str) -> Result<(), CoreError> {
    if new_password.is_empty() || confirm.is_empty() {
        return Err(CoreError::validation(
            "new_password",
            "Please enter and confirm your new password",
        ));
    }
    validate_password_strength(new_password)
        .map_err(|msg| CoreError::validation("new_password", msg))?;
    if new_password != confirm {
        return Err(CoreError::validation(
            "confirm_password",
            "Passwords do not match",
        ));
    }
    Ok(())
}

/// Validate that a password meets the minimum length.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        ));
    }
    Ok(())
}

/// Validate the (deliberately loose) email shape: it must contain `@`.
pub fn validate_email(email: &str) -> Result<(), String> {
    if !email.contains('@') {
        return Err("Please enter a valid email address".to_string());
    }
    Ok(())
}

/// Validate username length and character set.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(format!(
            "Username must be at least {MIN_USERNAME_LENGTH} characters long"
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err("Username may only contain letters, numbers, and underscores".to_string());
    }
    Ok(())
}
