/// Popup-side state machine.
///
/// Turns UI events into background requests and background replies into
/// typed UI effects. Nothing here touches the DOM or the token; the popup
/// only learns about the session through `check_token` round trips.
use std::cell::RefCell;
use std::time::Duration;

use serde::Serialize;

use crate::bridge;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{self, Error, Field, Result};
use crate::messages::{ActionResponse, Credentials, Request, Response};
use crate::rate_limit::{RateLimiter, Throttle};
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Waiting for the first `check_token` reply
    #[default]
    Checking,
    LoggedOut,
    LoggedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    /// Support code shown with errors
    pub code: Option<String>,
    /// How long the banner stays up
    pub dwell: Duration,
}

impl Notification {
    pub fn text(&self) -> String {
        match &self.code {
            Some(code) => format!("[{}] {}", code, self.message),
            None => self.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Button {
    Login,
    SaveUrl,
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Opened,
    EmailEdited(String),
    PasswordEdited(String),
    LoginSubmitted { email: String, password: String },
    SaveClicked { with_images: bool },
    LogoutClicked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SetView(View),
    ShowNotification(Notification),
    SetFieldError { field: Field, message: String },
    ClearFieldError(Field),
    FocusField(Field),
    SetBusy { button: Button, busy: bool },
    ResetLoginForm,
}

/// Which request a reply belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    CheckToken,
    Login,
    SaveUrl,
    Logout,
}

impl Pending {
    /// Code reported when the background never answered
    fn channel_code(self) -> &'static str {
        match self {
            Pending::Login => "E101",
            Pending::SaveUrl => "E202",
            Pending::CheckToken | Pending::Logout => "E500",
        }
    }

    fn button(self) -> Option<Button> {
        match self {
            Pending::Login => Some(Button::Login),
            Pending::SaveUrl => Some(Button::SaveUrl),
            Pending::Logout => Some(Button::Logout),
            Pending::CheckToken => None,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct Transition {
    pub effects: Vec<Effect>,
    pub request: Option<(Pending, Request)>,
}

impl Transition {
    fn local(effects: Vec<Effect>) -> Self {
        Transition {
            effects,
            request: None,
        }
    }

    fn send(effects: Vec<Effect>, pending: Pending, request: Request) -> Self {
        Transition {
            effects,
            request: Some((pending, request)),
        }
    }
}

/// Channel to the background worker
pub trait Messenger {
    async fn send(&self, request: &Request) -> Result<Response>;
}

/// `chrome.runtime.sendMessage`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeMessenger;

impl Messenger for ChromeMessenger {
    async fn send(&self, request: &Request) -> Result<Response> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let message = request
            .serialize(&serializer)
            .map_err(|e| Error::Server(format!("Failed to encode message: {:?}", e)))?;
        let reply = bridge::send_message(message).await?;
        serde_wasm_bindgen::from_value(reply)
            .map_err(|e| Error::Server(format!("Unexpected reply from background: {:?}", e)))
    }
}

pub struct PopupController<C> {
    config: Config,
    view: View,
    login_limiter: RateLimiter<C>,
    save_throttle: Throttle<C>,
}

impl<C: Clock + Clone> PopupController<C> {
    pub fn new(config: Config, clock: C) -> Self {
        PopupController {
            login_limiter: RateLimiter::new(
                config.max_login_attempts,
                config.login_cooldown(),
                clock.clone(),
            ),
            save_throttle: Throttle::new(config.save_throttle(), clock),
            view: View::Checking,
            config,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn begin(&mut self, event: UiEvent) -> Transition {
        match event {
            UiEvent::Opened => Transition::send(
                vec![Effect::SetView(View::Checking)],
                Pending::CheckToken,
                Request::CheckToken,
            ),
            UiEvent::EmailEdited(email) => {
                Transition::local(vec![field_effect(Field::Email, validation::validate_email(&email))])
            }
            UiEvent::PasswordEdited(password) => Transition::local(vec![field_effect(
                Field::Password,
                validation::validate_password(&password),
            )]),
            UiEvent::LoginSubmitted { email, password } => self.begin_login(email, password),
            UiEvent::SaveClicked { with_images } => {
                if !self.save_throttle.try_pass() {
                    log::debug!("Save click throttled");
                    return Transition::default();
                }
                Transition::send(
                    vec![busy(Button::SaveUrl, true)],
                    Pending::SaveUrl,
                    Request::SaveUrl { with_images },
                )
            }
            UiEvent::LogoutClicked => {
                Transition::send(vec![busy(Button::Logout, true)], Pending::Logout, Request::Logout)
            }
        }
    }

    fn begin_login(&mut self, email: String, password: String) -> Transition {
        let email = email.trim().to_string();
        let errors = validation::validate_login(&email, &password);
        if let Some(first) = errors.first() {
            let mut effects: Vec<Effect> = errors
                .iter()
                .filter_map(|e| match e {
                    Error::Validation { field, .. } => Some(Effect::SetFieldError {
                        field: *field,
                        message: format!("[{}] {}", e.code(), e),
                    }),
                    _ => None,
                })
                .collect();
            if let Error::Validation { field, .. } = first {
                effects.push(Effect::FocusField(*field));
            }
            return Transition::local(effects);
        }

        let mut effects = vec![
            Effect::ClearFieldError(Field::Email),
            Effect::ClearFieldError(Field::Password),
        ];

        if !self.login_limiter.try_acquire() {
            let wait = self.login_limiter.remaining_cooldown().as_secs().max(1);
            log::warn!("Login attempt refused by rate limiter");
            effects.push(Effect::ShowNotification(self.notice(
                format!("Too many login attempts. Please wait {} seconds and try again.", wait),
                NotificationKind::Info,
                None,
            )));
            return Transition::local(effects);
        }

        effects.push(busy(Button::Login, true));
        Transition::send(
            effects,
            Pending::Login,
            Request::Login {
                credentials: Credentials::new(email, password),
            },
        )
    }

    /// Map the background's reply (or the channel failure) onto effects.
    pub fn finish(&mut self, pending: Pending, reply: Result<Response>) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(button) = pending.button() {
            effects.push(busy(button, false));
        }

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("No reply from background for {:?}: {}", pending, e);
                if pending == Pending::CheckToken {
                    effects.extend(self.set_view(View::LoggedOut));
                } else {
                    effects.push(Effect::ShowNotification(self.notice(
                        e.to_string(),
                        NotificationKind::Error,
                        Some(pending.channel_code().to_string()),
                    )));
                }
                return effects;
            }
        };

        match (pending, reply) {
            (Pending::CheckToken, Response::TokenStatus(status)) => {
                let view = if status.is_token_valid {
                    View::LoggedIn
                } else {
                    View::LoggedOut
                };
                effects.extend(self.set_view(view));
            }
            (Pending::CheckToken, Response::Action(_)) => {
                effects.extend(self.set_view(View::LoggedOut));
            }
            (Pending::Login, Response::Action(action)) if action.success => {
                effects.push(Effect::ResetLoginForm);
                effects.extend(self.set_view(View::LoggedIn));
                effects.push(self.success(&action));
            }
            (Pending::SaveUrl, Response::Action(action)) if action.success => {
                effects.push(self.success(&action));
            }
            (Pending::Logout, Response::Action(action)) if action.success => {
                effects.extend(self.set_view(View::LoggedOut));
                effects.push(self.success(&action));
            }
            (_, Response::Action(action)) => {
                let expired = action.code.as_deref().is_some_and(error::is_auth_code);
                effects.push(self.failure(action));
                if expired && pending == Pending::SaveUrl {
                    effects.extend(self.set_view(View::LoggedOut));
                }
            }
            (_, Response::TokenStatus(_)) => {
                effects.push(Effect::ShowNotification(self.notice(
                    error::UNEXPECTED.to_string(),
                    NotificationKind::Error,
                    Some(pending.channel_code().to_string()),
                )));
            }
        }
        effects
    }

    fn set_view(&mut self, view: View) -> Vec<Effect> {
        self.view = view;
        let mut effects = vec![Effect::SetView(view)];
        if view == View::LoggedOut {
            effects.push(Effect::FocusField(Field::Email));
        }
        effects
    }

    fn success(&self, action: &ActionResponse) -> Effect {
        Effect::ShowNotification(self.notice(action.message.clone(), NotificationKind::Success, None))
    }

    fn failure(&self, action: ActionResponse) -> Effect {
        Effect::ShowNotification(self.notice(action.message, NotificationKind::Error, action.code))
    }

    fn notice(&self, message: String, kind: NotificationKind, code: Option<String>) -> Notification {
        let dwell_ms = match kind {
            NotificationKind::Error => self.config.error_dwell_ms,
            NotificationKind::Info | NotificationKind::Success => self.config.success_dwell_ms,
        };
        Notification {
            message,
            kind,
            code,
            dwell: Duration::from_millis(dwell_ms),
        }
    }
}

fn busy(button: Button, busy: bool) -> Effect {
    Effect::SetBusy { button, busy }
}

fn field_effect(field: Field, result: Result<()>) -> Effect {
    match result {
        Ok(()) => Effect::ClearFieldError(field),
        Err(e) => Effect::SetFieldError {
            field,
            message: format!("[{}] {}", e.code(), e),
        },
    }
}

/// Run one UI event through the controller and, if needed, the background.
///
/// The controller is not borrowed while the request is in flight, so other
/// events can be handled meanwhile. `apply` sees the immediate effects before
/// the request is sent.
pub async fn drive<C, M>(
    controller: &RefCell<PopupController<C>>,
    messenger: &M,
    event: UiEvent,
    mut apply: impl FnMut(Effect),
) where
    C: Clock + Clone,
    M: Messenger,
{
    let Transition { effects, request } = controller.borrow_mut().begin(event);
    effects.into_iter().for_each(&mut apply);

    if let Some((pending, request)) = request {
        let reply = messenger.send(&request).await;
        let effects = controller.borrow_mut().finish(pending, reply);
        effects.into_iter().for_each(&mut apply);
    }
}
