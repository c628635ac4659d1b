/// Background worker: owns the session token and answers popup requests
use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::api::{ApiClient, GlooTransport, HttpTransport};
use crate::bridge;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Field, Result};
use crate::messages::{ActionResponse, Credentials, Request, Response, TokenStatus};
use crate::session::{ChromeSessionStore, SessionStore};
use crate::tabs::{self, ActiveTabSource, ChromeTabs};
use crate::token::TokenValidator;

pub struct Dispatcher<S, H, T, C> {
    store: S,
    api: ApiClient<H>,
    tabs: T,
    validator: TokenValidator<C>,
}

impl<S, H, T, C> Dispatcher<S, H, T, C>
where
    S: SessionStore,
    H: HttpTransport,
    T: ActiveTabSource,
    C: Clock,
{
    pub fn new(store: S, api: ApiClient<H>, tabs: T, clock: C) -> Self {
        Dispatcher {
            store,
            api,
            tabs,
            validator: TokenValidator::new(clock),
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &ApiClient<H> {
        &self.api
    }

    /// Decode a raw runtime message and handle it.
    pub async fn handle_raw(&self, raw: Value) -> Response {
        match serde_json::from_value::<Request>(raw) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                log::warn!("Ignoring unsupported message: {}", e);
                Response::failure(&Error::validation(Field::Other, "Unsupported message."))
            }
        }
    }

    /// Every request gets exactly one response; errors never escape.
    pub async fn handle(&self, request: Request) -> Response {
        let action = request.action();
        log::info!("Handling {} request", action);

        let response: Response = match request {
            Request::Login { credentials } => self.login(&credentials).await.into(),
            Request::SaveUrl { with_images } => self.save_url(with_images).await.into(),
            Request::CheckToken => self.check_token().await.into(),
            Request::Logout => self.logout().await.into(),
        };

        if let Response::Action(ActionResponse {
            success: false,
            code: Some(code),
            message,
            ..
        }) = &response
        {
            log::warn!("{} failed [{}]: {}", action, code, message);
        }
        response
    }

    pub async fn login(&self, credentials: &Credentials) -> ActionResponse {
        match self.try_login(credentials).await {
            Ok(()) => ActionResponse::ok("Logged in successfully."),
            Err(e) => ActionResponse::failure(&e),
        }
    }

    async fn try_login(&self, credentials: &Credentials) -> Result<()> {
        if credentials.email.trim().is_empty() {
            return Err(Error::validation(Field::Email, "Email cannot be empty."));
        }
        if credentials.password.is_empty() {
            return Err(Error::validation(Field::Password, "Password cannot be empty."));
        }

        let token = self.api.login(credentials).await?;
        self.store.set(&token).await?;
        log::info!("Session token stored");
        Ok(())
    }

    pub async fn save_url(&self, with_images: bool) -> ActionResponse {
        match self.try_save_url(with_images).await {
            Ok(data) => ActionResponse::ok("The URL has been saved successfully.").with_data(data),
            Err(e) => ActionResponse::failure(&e),
        }
    }

    async fn try_save_url(&self, with_images: bool) -> Result<Value> {
        // Token check must short-circuit before the tab query and network call
        let token = self
            .validator
            .live_token(&self.store)
            .await?
            .ok_or_else(Error::session_expired)?;

        let raw = self.tabs.active_url().await?;
        let url = tabs::validate_target_url(raw.as_deref())?;

        self.api.scrape(&token, url, with_images).await
    }

    pub async fn check_token(&self) -> TokenStatus {
        match self.validator.live_token(&self.store).await {
            Ok(Some(_)) => TokenStatus {
                is_token_valid: true,
                message: "Session is active.".to_string(),
            },
            Ok(None) => TokenStatus {
                is_token_valid: false,
                message: "No active session.".to_string(),
            },
            Err(e) => {
                log::error!("check_token failed [{}]: {}", e.code(), e);
                TokenStatus {
                    is_token_valid: false,
                    message: e.to_string(),
                }
            }
        }
    }

    pub async fn logout(&self) -> ActionResponse {
        match self.store.clear().await {
            Ok(()) => ActionResponse::ok("Logged out."),
            Err(e) => ActionResponse::failure(&e),
        }
    }
}

type ChromeDispatcher = Dispatcher<ChromeSessionStore, GlooTransport, ChromeTabs, SystemClock>;

/// Wire the dispatcher to `chrome.runtime.onMessage`.
pub fn register(config: Config) {
    let transport = GlooTransport::new(config.request_timeout());
    let api = ApiClient::new(transport, config);
    let dispatcher: Rc<ChromeDispatcher> =
        Rc::new(Dispatcher::new(ChromeSessionStore, api, ChromeTabs, SystemClock));

    let handler = Closure::wrap(Box::new(move |message: JsValue| {
        let dispatcher = dispatcher.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let response = match serde_wasm_bindgen::from_value::<Value>(message) {
                Ok(raw) => dispatcher.handle_raw(raw).await,
                Err(e) => {
                    log::warn!("Unreadable message: {:?}", e);
                    Response::failure(&Error::validation(Field::Other, "Unsupported message."))
                }
            };
            Ok(to_js(&response))
        })
    }) as Box<dyn FnMut(JsValue) -> js_sys::Promise>);

    bridge::on_message(handler);
    log::info!("Background message handler registered");
}

fn to_js(response: &Response) -> JsValue {
    // Plain objects, not Maps, so the popup's JSON view matches the wire format
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    serde::Serialize::serialize(response, &serializer).unwrap_or_else(|e| {
        log::error!("Failed to encode response: {:?}", e);
        JsValue::NULL
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::ScriptedTransport;
    use crate::clock::tests::ManualClock;
    use crate::session::tests::RecordingStore;
    use crate::tabs::tests::FixedTab;
    use crate::token::tests::token_expiring_at;
    use futures::executor::block_on;
    use serde_json::json;

    const NOW_MS: u64 = 1_700_000_000_000;

    type TestDispatcher = Dispatcher<RecordingStore, ScriptedTransport, FixedTab, ManualClock>;

    fn dispatcher(store: RecordingStore, transport: ScriptedTransport, tab: FixedTab) -> TestDispatcher {
        let config = Config {
            api_base: "https://api.example.com".to_string(),
            ..Config::default()
        };
        Dispatcher::new(store, ApiClient::new(transport, config), tab, ManualClock::at(NOW_MS))
    }

    fn valid_token() -> String {
        token_expiring_at(NOW_MS / 1000 + 3_600)
    }

    fn expired_token() -> String {
        token_expiring_at(NOW_MS / 1000 - 10)
    }

    fn calls(d: &TestDispatcher) -> usize {
        d.api().transport().calls()
    }

    fn login_request() -> Request {
        Request::Login {
            credentials: Credentials::new("user@example.com", "pw"),
        }
    }

    #[test]
    fn test_login_stores_token_then_check_token_is_valid() {
        let token = valid_token();
        let d = dispatcher(
            RecordingStore::new(),
            ScriptedTransport::replying(200, json!({"accessToken": token.clone()})),
            FixedTab::default(),
        );

        let response = block_on(d.handle(login_request()));
        assert!(response.is_success());
        assert_eq!(d.store().peek(), Some(token));

        let status = block_on(d.handle(Request::CheckToken));
        assert_eq!(
            status,
            Response::TokenStatus(TokenStatus {
                is_token_valid: true,
                message: "Session is active.".to_string()
            })
        );
    }

    #[test]
    fn test_login_holds_exactly_the_returned_token() {
        let d = dispatcher(
            RecordingStore::with_token("previous"),
            ScriptedTransport::replying(200, json!({"accessToken": "abc"})),
            FixedTab::default(),
        );

        block_on(d.handle(login_request()));

        assert_eq!(block_on(d.store().get()), Ok(Some("abc".to_string())));
    }

    #[test]
    fn test_login_401_leaves_prior_token_untouched() {
        let d = dispatcher(
            RecordingStore::with_token("previous"),
            ScriptedTransport::replying(401, json!({"message": "Unauthorized"})),
            FixedTab::default(),
        );

        let response = block_on(d.login(&Credentials::new("user@example.com", "wrong")));

        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("E101"));
        assert_eq!(d.store().peek().as_deref(), Some("previous"));
        assert_eq!(d.store().writes(), 0);
    }

    #[test]
    fn test_login_network_failure_is_a_response() {
        let d = dispatcher(
            RecordingStore::new(),
            ScriptedTransport::failing(crate::api::TransportError::Failed("offline".into())),
            FixedTab::default(),
        );

        let response = block_on(d.login(&Credentials::new("user@example.com", "pw")));

        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("E202"));
        assert_eq!(d.store().peek(), None);
    }

    #[test]
    fn test_login_rejects_empty_credentials_without_network() {
        let d = dispatcher(RecordingStore::new(), ScriptedTransport::default(), FixedTab::default());

        let empty_email = block_on(d.login(&Credentials::new("  ", "pw")));
        let empty_password = block_on(d.login(&Credentials::new("user@example.com", "")));

        assert_eq!(empty_email.code.as_deref(), Some("E301"));
        assert_eq!(empty_password.code.as_deref(), Some("E302"));
        assert_eq!(calls(&d), 0);
    }

    #[test]
    fn test_login_storage_failure_is_reported() {
        let store = RecordingStore::new();
        store.fail_with("quota exceeded");
        let d = dispatcher(
            store,
            ScriptedTransport::replying(200, json!({"accessToken": "abc"})),
            FixedTab::default(),
        );

        let response = block_on(d.login(&Credentials::new("user@example.com", "pw")));

        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("E401"));
    }

    #[test]
    fn test_save_url_sends_tab_url_and_flag() {
        let d = dispatcher(
            RecordingStore::with_token(valid_token()),
            ScriptedTransport::replying(200, json!({"status": "queued"})),
            FixedTab::new("https://example.com/a"),
        );

        let response = block_on(d.save_url(false));

        assert!(response.success);
        assert_eq!(response.data, Some(json!({"status": "queued"})));
        let sent = d.api().transport().sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, json!({"Url": "https://example.com/a", "FetchImages": false}));
        assert_eq!(sent[0].bearer, Some(valid_token()));
    }

    #[test]
    fn test_save_url_sends_tab_url_as_reported() {
        let d = dispatcher(
            RecordingStore::with_token(valid_token()),
            ScriptedTransport::replying(200, json!({})),
            FixedTab::new(" https://EXAMPLE.com/a b "),
        );

        assert!(block_on(d.save_url(true)).success);

        let sent = d.api().transport().sent.borrow();
        assert_eq!(sent[0].body["Url"], json!("https://EXAMPLE.com/a b"));
    }

    #[test]
    fn test_save_url_without_token_skips_network() {
        let d = dispatcher(
            RecordingStore::new(),
            ScriptedTransport::replying(200, json!({})),
            FixedTab::new("https://example.com/a"),
        );

        let response = block_on(d.save_url(true));

        assert!(!response.success);
        assert_eq!(response.message, crate::error::SESSION_EXPIRED);
        assert_eq!(calls(&d), 0);
    }

    #[test]
    fn test_save_url_with_expired_token_skips_network() {
        let d = dispatcher(
            RecordingStore::with_token(expired_token()),
            ScriptedTransport::replying(200, json!({})),
            FixedTab::new("https://example.com/a"),
        );

        let response = block_on(d.save_url(true));

        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("E101"));
        assert_eq!(calls(&d), 0);
    }

    #[test]
    fn test_save_url_with_malformed_token_skips_network() {
        let d = dispatcher(
            RecordingStore::with_token("not-a-jwt"),
            ScriptedTransport::replying(200, json!({})),
            FixedTab::new("https://example.com/a"),
        );

        assert!(!block_on(d.save_url(true)).success);
        assert_eq!(calls(&d), 0);
    }

    #[test]
    fn test_save_url_invalid_url_skips_network() {
        for tab in [FixedTab::default(), FixedTab::new("not a url"), FixedTab::new("chrome://newtab")] {
            let d = dispatcher(
                RecordingStore::with_token(valid_token()),
                ScriptedTransport::replying(200, json!({})),
                tab,
            );

            let response = block_on(d.save_url(false));

            assert!(!response.success);
            assert_eq!(response.code.as_deref(), Some("E303"));
            assert_eq!(calls(&d), 0);
        }
    }

    #[test]
    fn test_save_url_401_is_session_expired() {
        let d = dispatcher(
            RecordingStore::with_token(valid_token()),
            ScriptedTransport::replying(401, json!({})),
            FixedTab::new("https://example.com/a"),
        );

        let response = block_on(d.save_url(false));

        assert_eq!(response.message, crate::error::SESSION_EXPIRED);
        assert_eq!(response.code.as_deref(), Some("E101"));
    }

    #[test]
    fn test_save_url_other_failure_is_generic_network_error() {
        let d = dispatcher(
            RecordingStore::with_token(valid_token()),
            ScriptedTransport::replying(500, json!({"message": "boom"})),
            FixedTab::new("https://example.com/a"),
        );

        let response = block_on(d.save_url(false));

        assert_eq!(response.code.as_deref(), Some("E202"));
        assert_eq!(response.message, crate::error::NETWORK_FAILURE);
    }

    #[test]
    fn test_check_token_expired() {
        let d = dispatcher(
            RecordingStore::with_token(expired_token()),
            ScriptedTransport::default(),
            FixedTab::default(),
        );

        let status = block_on(d.check_token());

        assert!(!status.is_token_valid);
        assert_eq!(calls(&d), 0);
    }

    #[test]
    fn test_check_token_empty_and_storage_failure() {
        let d = dispatcher(RecordingStore::new(), ScriptedTransport::default(), FixedTab::default());
        assert!(!block_on(d.check_token()).is_token_valid);

        let store = RecordingStore::with_token(valid_token());
        store.fail_with("unavailable");
        let d = dispatcher(store, ScriptedTransport::default(), FixedTab::default());
        let status = block_on(d.check_token());
        assert!(!status.is_token_valid);
        assert!(status.message.contains("unavailable"));
    }

    #[test]
    fn test_logout_always_clears() {
        for store in [RecordingStore::new(), RecordingStore::with_token(valid_token())] {
            let d = dispatcher(store, ScriptedTransport::default(), FixedTab::default());

            let response = block_on(d.handle(Request::Logout));

            assert!(response.is_success());
            assert_eq!(block_on(d.store().get()), Ok(None));
        }
    }

    #[test]
    fn test_handle_raw_decodes_popup_messages() {
        let d = dispatcher(
            RecordingStore::with_token(valid_token()),
            ScriptedTransport::replying(200, json!({"ok": true})),
            FixedTab::new("https://example.com/a"),
        );

        let response = block_on(d.handle_raw(json!({"action": "save_url", "withImages": true})));

        assert!(response.is_success());
        let sent = d.api().transport().sent.borrow();
        assert_eq!(sent[0].body["FetchImages"], json!(true));
    }

    #[test]
    fn test_handle_raw_unknown_message_still_responds() {
        let d = dispatcher(RecordingStore::new(), ScriptedTransport::default(), FixedTab::default());

        let response = block_on(d.handle_raw(json!({"message": "login_success"})));

        match response {
            Response::Action(action) => {
                assert!(!action.success);
                assert_eq!(action.code.as_deref(), Some("E300"));
            }
            other => panic!("unexpected response {:?}", other),
        }
    }
}
