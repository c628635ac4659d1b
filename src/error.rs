/// Error taxonomy shared by the background worker and the popup
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Form or request field a validation error points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
    Url,
    Other,
}

impl Field {
    pub fn code(self) -> &'static str {
        match self {
            Field::Email => "E301",
            Field::Password => "E302",
            Field::Url => "E303",
            Field::Other => "E300",
        }
    }
}

/// Every failure the extension can report.
///
/// `Display` is the user-facing text; `code()` is the short support code shown
/// next to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The request never got a response (offline, DNS, CORS, timeout).
    #[error("{0}")]
    Network(String),

    /// Credentials refused or session no longer valid.
    #[error("{0}")]
    Auth(String),

    #[error("{message}")]
    Validation { field: Field, message: String },

    /// Extension storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// 4xx other than 401.
    #[error("{0}")]
    Rejected(String),

    /// 5xx or a response body we could not make sense of.
    #[error("{0}")]
    Server(String),
}

pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password. Please try again.";
pub const NETWORK_FAILURE: &str =
    "Network error. Please check your connection and try again.";
pub const UNEXPECTED: &str = "An unexpected error occurred. Please try again.";

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Auth(_) => "E101",
            Error::Network(_) => "E202",
            Error::Validation { field, .. } => field.code(),
            Error::Rejected(_) => "E400",
            Error::Storage(_) => "E401",
            Error::Server(_) => "E500",
        }
    }

    pub fn validation(field: Field, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn session_expired() -> Self {
        Error::Auth(SESSION_EXPIRED.to_string())
    }
}

/// Returns true when a support code means the stored session is gone.
pub fn is_auth_code(code: &str) -> bool {
    code == "E101"
}
