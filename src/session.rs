/// Bearer token persistence.
///
/// Holds at most one token. A missing token is `Ok(None)`, never an error;
/// only real storage failures surface as `Error::Storage`.
use std::cell::RefCell;

use crate::bridge;
use crate::config::TOKEN_KEY;
use crate::error::{Error, Result};

pub trait SessionStore {
    async fn get(&self) -> Result<Option<String>>;
    async fn set(&self, token: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Token stored in `chrome.storage.local`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeSessionStore;

impl SessionStore for ChromeSessionStore {
    async fn get(&self) -> Result<Option<String>> {
        let value = bridge::get_storage(TOKEN_KEY).await?;
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        let token: String = serde_wasm_bindgen::from_value(value)
            .map_err(|e| Error::Storage(format!("Failed to parse stored token: {:?}", e)))?;
        Ok(Some(token).filter(|t| !t.is_empty()))
    }

    async fn set(&self, token: &str) -> Result<()> {
        bridge::set_storage(TOKEN_KEY, token).await
    }

    async fn clear(&self) -> Result<()> {
        bridge::remove_storage(TOKEN_KEY).await
    }
}

/// In-process token store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RefCell<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        MemorySessionStore {
            token: RefCell::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    async fn get(&self) -> Result<Option<String>> {
        Ok(self.token.borrow().clone().filter(|t| !t.is_empty()))
    }

    async fn set(&self, token: &str) -> Result<()> {
        *self.token.borrow_mut() = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.token.borrow_mut() = None;
        Ok(())
    }
}
