/// Reusable popup components

use gloo_timers::callback::Timeout;
use patternfly_yew::prelude::*;
use yew::prelude::*;

use crate::controller::NotificationKind;
use crate::ui::state::ShownNotification;

#[derive(Properties, PartialEq)]
pub struct NotificationBannerProps {
    pub shown: ShownNotification,
    pub on_dismiss: Callback<u64>,
}

/// Dismissible banner that removes itself after its dwell time
#[function_component(NotificationBanner)]
pub fn notification_banner(props: &NotificationBannerProps) -> Html {
    let id = props.shown.id;
    let dwell_ms = u32::try_from(props.shown.notification.dwell.as_millis()).unwrap_or(u32::MAX);

    {
        let on_dismiss = props.on_dismiss.clone();
        use_effect_with(id, move |id| {
            let id = *id;
            let timeout = Timeout::new(dwell_ms, move || on_dismiss.emit(id));
            move || drop(timeout)
        });
    }

    let on_close = {
        let on_dismiss = props.on_dismiss.clone();
        Callback::from(move |_: MouseEvent| on_dismiss.emit(id))
    };

    let notification = &props.shown.notification;
    let alert_type = match notification.kind {
        NotificationKind::Info => AlertType::Info,
        NotificationKind::Success => AlertType::Success,
        NotificationKind::Error => AlertType::Danger,
    };

    html! {
        <div class="notification-container" role="alert" aria-live="assertive">
            <Alert r#type={alert_type} title={notification.text()} inline={true}>
            </Alert>
            <Button onclick={on_close} variant={ButtonVariant::Plain}>
                {"✖"}
            </Button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct FieldErrorProps {
    pub id: AttrValue,
    #[prop_or_default]
    pub message: Option<String>,
}

/// Inline error shown under a form field
#[function_component(FieldError)]
pub fn field_error(props: &FieldErrorProps) -> Html {
    match &props.message {
        Some(message) => html! {
            <div id={props.id.clone()} class="error-message" role="alert" aria-live="polite">
                {message}
            </div>
        },
        None => html! {},
    }
}

#[derive(Properties, PartialEq)]
pub struct LoadingProps {
    #[prop_or_default]
    pub message: Option<String>,
}

#[function_component(Loading)]
pub fn loading(props: &LoadingProps) -> Html {
    html! {
        <div class="loading-container">
            <Spinner />
            if let Some(msg) = &props.message {
                <p class="loading-message">{msg}</p>
            }
        </div>
    }
}
