/// Render state of the popup, updated by controller effects
use std::collections::BTreeSet;
use std::rc::Rc;

use yew::prelude::*;

use crate::controller::{Button, Effect, Notification, View};
use crate::error::Field;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownNotification {
    pub id: u64,
    pub notification: Notification,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopupState {
    pub view: View,
    pub email: String,
    pub password: String,
    pub with_images: bool,
    pub email_error: Option<String>,
    pub password_error: Option<String>,
    pub focus: Option<Field>,
    pub busy: BTreeSet<Button>,
    pub notification: Option<ShownNotification>,
    next_notification_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    Apply(Effect),
    EmailInput(String),
    PasswordInput(String),
    WithImages(bool),
    /// Banner timer fired or close button clicked
    Dismiss(u64),
}

impl PopupState {
    pub fn is_busy(&self, button: Button) -> bool {
        self.busy.contains(&button)
    }

    pub fn apply(&mut self, change: StateChange) {
        match change {
            StateChange::Apply(effect) => self.apply_effect(effect),
            StateChange::EmailInput(email) => self.email = email,
            StateChange::PasswordInput(password) => self.password = password,
            StateChange::WithImages(with_images) => self.with_images = with_images,
            StateChange::Dismiss(id) => {
                // A newer banner may have replaced the one whose timer fired
                if self.notification.as_ref().is_some_and(|n| n.id == id) {
                    self.notification = None;
                }
            }
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SetView(view) => self.view = view,
            Effect::ShowNotification(notification) => {
                self.next_notification_id += 1;
                self.notification = Some(ShownNotification {
                    id: self.next_notification_id,
                    notification,
                });
            }
            Effect::SetFieldError { field, message } => match field {
                Field::Email => self.email_error = Some(message),
                Field::Password => self.password_error = Some(message),
                Field::Url | Field::Other => {}
            },
            Effect::ClearFieldError(field) => match field {
                Field::Email => self.email_error = None,
                Field::Password => self.password_error = None,
                Field::Url | Field::Other => {}
            },
            Effect::FocusField(field) => self.focus = Some(field),
            Effect::SetBusy { button, busy } => {
                if busy {
                    self.busy.insert(button);
                } else {
                    self.busy.remove(&button);
                }
            }
            Effect::ResetLoginForm => {
                self.email.clear();
                self.password.clear();
                self.email_error = None;
                self.password_error = None;
            }
        }
    }
}

impl Reducible for PopupState {
    type Action = StateChange;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        next.apply(action);
        Rc::new(next)
    }
}
