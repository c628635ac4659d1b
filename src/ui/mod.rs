/// Popup UI: Yew components rendering the controller's effects
pub mod components;
pub mod popup;
pub mod state;
