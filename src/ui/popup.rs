/// Popup UI for the Scrape Saver extension

use std::rc::Rc;

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::controller::{self, Button as Action, ChromeMessenger, PopupController, UiEvent, View};
use crate::error::Field;
use crate::ui::components::{FieldError, Loading, NotificationBanner};
use crate::ui::state::{PopupState, StateChange};

#[derive(Properties, PartialEq, Default)]
pub struct AppProps {
    #[prop_or_default]
    pub config: Config,
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
    let config = props.config.clone();
    let controller = use_mut_ref(move || PopupController::new(config, SystemClock));
    let state = use_reducer(PopupState::default);
    let email_ref = use_node_ref();

    // Runs a UI event through the controller and feeds its effects to the state
    let run = {
        let controller = controller.clone();
        let dispatcher = state.dispatcher();
        Callback::from(move |event: UiEvent| {
            let controller = Rc::clone(&controller);
            let dispatcher = dispatcher.clone();
            spawn_local(async move {
                controller::drive(&*controller, &ChromeMessenger, event, |effect| {
                    dispatcher.dispatch(StateChange::Apply(effect))
                })
                .await;
            });
        })
    };

    // Decide the initial view on open
    {
        let run = run.clone();
        use_effect_with((), move |_| {
            run.emit(UiEvent::Opened);
            || ()
        });
    }

    // Focus the email field when the controller asks for it
    {
        let email_ref = email_ref.clone();
        use_effect_with((state.focus, state.view), move |(focus, view)| {
            if *focus == Some(Field::Email) && *view == View::LoggedOut {
                if let Some(input) = email_ref.cast::<HtmlInputElement>() {
                    let _ = input.focus();
                }
            }
            || ()
        });
    }

    let on_email_input = {
        let dispatcher = state.dispatcher();
        let run = run.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                let value = input.value();
                dispatcher.dispatch(StateChange::EmailInput(value.clone()));
                run.emit(UiEvent::EmailEdited(value));
            }
        })
    };

    let on_password_input = {
        let dispatcher = state.dispatcher();
        let run = run.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                let value = input.value();
                dispatcher.dispatch(StateChange::PasswordInput(value.clone()));
                run.emit(UiEvent::PasswordEdited(value));
            }
        })
    };

    let on_submit = {
        let run = run.clone();
        let email = state.email.clone();
        let password = state.password.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            run.emit(UiEvent::LoginSubmitted {
                email: email.clone(),
                password: password.clone(),
            });
        })
    };

    let on_with_images = {
        let dispatcher = state.dispatcher();
        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                dispatcher.dispatch(StateChange::WithImages(input.checked()));
            }
        })
    };

    let on_save = {
        let run = run.clone();
        let with_images = state.with_images;
        Callback::from(move |_: MouseEvent| run.emit(UiEvent::SaveClicked { with_images }))
    };

    let on_logout = {
        let run = run.clone();
        Callback::from(move |_: MouseEvent| run.emit(UiEvent::LogoutClicked))
    };

    let on_dismiss = {
        let dispatcher = state.dispatcher();
        Callback::from(move |id: u64| dispatcher.dispatch(StateChange::Dismiss(id)))
    };

    let login_busy = state.is_busy(Action::Login);

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Scrape Saver"}</h1>

            if let Some(shown) = state.notification.clone() {
                <NotificationBanner shown={shown} on_dismiss={on_dismiss} />
            }

            {match state.view {
                View::Checking => html! {
                    <Loading message={Some("Checking session...".to_string())} />
                },
                View::LoggedOut => html! {
                    <form id="loginForm" class="flex-column-gap" onsubmit={on_submit}>
                        <h2 id="login-title">{"Login"}</h2>
                        <input
                            id="email"
                            ref={email_ref}
                            class="pf-v5-c-form-control"
                            type="text"
                            placeholder="Email"
                            aria-label="Email"
                            aria-invalid={state.email_error.is_some().to_string()}
                            value={state.email.clone()}
                            oninput={on_email_input}
                        />
                        <FieldError id="emailError" message={state.email_error.clone()} />
                        <input
                            id="password"
                            class="pf-v5-c-form-control"
                            type="password"
                            placeholder="Password"
                            aria-label="Password"
                            aria-invalid={state.password_error.is_some().to_string()}
                            value={state.password.clone()}
                            oninput={on_password_input}
                        />
                        <FieldError id="passwordError" message={state.password_error.clone()} />
                        <button
                            id="loginButton"
                            class="pf-v5-c-button pf-m-primary pf-m-block"
                            type="submit"
                            disabled={login_busy}
                        >
                            {if login_busy { "Logging in..." } else { "Login" }}
                        </button>
                    </form>
                },
                View::LoggedIn => html! {
                    <div class="flex-column-gap">
                        <label class="checkbox-label">
                            <input
                                id="withImagesCheckbox"
                                type="checkbox"
                                checked={state.with_images}
                                onchange={on_with_images}
                            />
                            {" With images"}
                        </label>
                        <Button
                            onclick={on_save}
                            disabled={state.is_busy(Action::SaveUrl)}
                            variant={ButtonVariant::Primary}
                            block={true}
                        >
                            {if state.is_busy(Action::SaveUrl) { "Saving URL..." } else { "Save Current URL" }}
                        </Button>
                        <Button
                            onclick={on_logout}
                            disabled={state.is_busy(Action::Logout)}
                            variant={ButtonVariant::Secondary}
                            block={true}
                        >
                            {"Logout"}
                        </Button>
                    </div>
                },
            }}

            <p class="footer-popup">
                {"Scrape Saver v0.1.0"}
            </p>
        </div>
    }
}
