//! Scrape Saver - browser extension that saves the active tab for scraping
//! Built with Rust + WASM + Yew
#![allow(async_fn_in_trait)]

pub mod api;
pub mod background;
mod bridge;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod messages;
pub mod rate_limit;
pub mod session;
pub mod tabs;
pub mod token;
pub mod ui;
pub mod validation;

use wasm_bindgen::prelude::*;

use crate::config::Config;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

/// Start the popup with a JSON config override
#[wasm_bindgen]
pub fn start_popup_with_config(json: &str) -> Result<(), JsValue> {
    let config = Config::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    yew::Renderer::<ui::popup::App>::with_props(ui::popup::AppProps { config }).render();
    Ok(())
}

// Register the background worker's message handler
#[wasm_bindgen]
pub fn start_background() {
    match Config::built_in() {
        Ok(config) => background::register(config),
        Err(e) => log::error!("Background worker not started, invalid built-in configuration: {}", e),
    }
}

/// Start the background worker with a JSON config override
#[wasm_bindgen]
pub fn start_background_with_config(json: &str) -> Result<(), JsValue> {
    let config = Config::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    background::register(config);
    Ok(())
}
