/// Rust side of `bridge.js`: chrome storage, tabs and runtime messaging
use wasm_bindgen::prelude::*;

use crate::error::Error;

#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch, js_name = getStorage)]
    async fn get_storage_js(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = setStorage)]
    async fn set_storage_js(key: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = removeStorage)]
    async fn remove_storage_js(key: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = getActiveTabUrl)]
    async fn get_active_tab_url_js() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = sendMessage)]
    async fn send_message_js(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = onMessage)]
    fn on_message_js(handler: &js_sys::Function);
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

pub async fn get_storage(key: &str) -> Result<JsValue, Error> {
    get_storage_js(key)
        .await
        .map_err(|e| Error::Storage(format!("Failed to read {}: {}", key, describe(&e))))
}

pub async fn set_storage(key: &str, value: &str) -> Result<(), Error> {
    set_storage_js(key, value)
        .await
        .map_err(|e| Error::Storage(format!("Failed to write {}: {}", key, describe(&e))))
}

pub async fn remove_storage(key: &str) -> Result<(), Error> {
    remove_storage_js(key)
        .await
        .map_err(|e| Error::Storage(format!("Failed to remove {}: {}", key, describe(&e))))
}

pub async fn active_tab_url() -> Result<Option<String>, Error> {
    let url = get_active_tab_url_js()
        .await
        .map_err(|e| Error::Server(format!("Failed to query the active tab: {}", describe(&e))))?;
    Ok(url.as_string())
}

/// Send a message to the background worker and wait for its reply.
pub async fn send_message(message: JsValue) -> Result<JsValue, Error> {
    send_message_js(message)
        .await
        .map_err(|e| Error::Network(format!("Background worker unavailable: {}", describe(&e))))
}

/// Register the background message handler.
///
/// The closure is leaked: the listener lives as long as the worker.
pub fn on_message(handler: Closure<dyn FnMut(JsValue) -> js_sys::Promise>) {
    on_message_js(handler.as_ref().unchecked_ref());
    handler.forget();
}
