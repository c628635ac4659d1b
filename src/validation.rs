/// Login form validation
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Field, Result};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"));

pub const EMAIL_FORMAT: &str = "Invalid format. Enter a valid email such as user@example.com.";
pub const PASSWORD_EMPTY: &str = "Password cannot be empty. Please enter your password.";

pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim().to_lowercase();
    if EMAIL_RE.is_match(&email) {
        Ok(())
    } else {
        Err(Error::validation(Field::Email, EMAIL_FORMAT))
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        Err(Error::validation(Field::Password, PASSWORD_EMPTY))
    } else {
        Ok(())
    }
}

/// Every failing field, email first
pub fn validate_login(email: &str, password: &str) -> Vec<Error> {
    [validate_email(email), validate_password(password)]
        .into_iter()
        .filter_map(|r| r.err())
        .collect()
}
