/// Messages exchanged between the popup and the background worker
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Popup → background request, discriminated by `action`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    Login {
        credentials: Credentials,
    },
    SaveUrl {
        #[serde(rename = "withImages", default)]
        with_images: bool,
    },
    CheckToken,
    Logout,
}

impl Request {
    pub fn action(&self) -> &'static str {
        match self {
            Request::Login { .. } => "login",
            Request::SaveUrl { .. } => "save_url",
            Request::CheckToken => "check_token",
            Request::Logout => "logout",
        }
    }
}

/// Reply to `login`, `save_url` and `logout`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        ActionResponse {
            success: true,
            message: message.into(),
            code: None,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn failure(error: &Error) -> Self {
        ActionResponse {
            success: false,
            message: error.to_string(),
            code: Some(error.code().to_string()),
            data: None,
        }
    }
}

/// Reply to `check_token`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatus {
    #[serde(rename = "isTokenValid")]
    pub is_token_valid: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    TokenStatus(TokenStatus),
    Action(ActionResponse),
}

impl Response {
    pub fn failure(error: &Error) -> Self {
        Response::Action(ActionResponse::failure(error))
    }

    pub fn is_success(&self) -> bool {
        match self {
            Response::TokenStatus(status) => status.is_token_valid,
            Response::Action(action) => action.success,
        }
    }
}

impl From<ActionResponse> for Response {
    fn from(value: ActionResponse) -> Self {
        Response::Action(value)
    }
}

impl From<TokenStatus> for Response {
    fn from(value: TokenStatus) -> Self {
        Response::TokenStatus(value)
    }
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /my-files/webscraping`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeBody {
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "FetchImages")]
    pub fetch_images: bool,
}
