/// HTTP calls to the scraping API and their status-code mapping
use std::pin::pin;
use std::time::Duration;

use futures_util::future::{Either, select};
use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::error::{self, Error, Result};
use crate::messages::{Credentials, LoginBody, ScrapeBody};

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Parsed JSON body, `None` when empty or not JSON
    pub body: Option<Value>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `message` field of an error body, if the server sent one
    pub fn server_message(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
    }
}

/// The request produced no HTTP response at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Failed(String),
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

pub trait HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> std::result::Result<HttpResponse, TransportError>;
}

/// `fetch`-backed transport with a per-request timeout
#[derive(Debug, Clone)]
pub struct GlooTransport {
    timeout: Duration,
}

impl GlooTransport {
    pub fn new(timeout: Duration) -> Self {
        GlooTransport { timeout }
    }
}

impl HttpTransport for GlooTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = Request::post(url).header("content-type", "application/json");
        if let Some(token) = bearer {
            builder = builder.header("authorization", &format!("Bearer {}", token));
        }
        let request = builder
            .json(body)
            .map_err(|e| TransportError::Failed(e.to_string()))?;

        let millis = u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX);
        let response = with_timeout(request.send(), TimeoutFuture::new(millis), self.timeout)
            .await?
            .map_err(|e| TransportError::Failed(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).ok();

        Ok(HttpResponse { status, body })
    }
}

/// Race `send` against `timer`; whichever finishes first wins.
pub(crate) async fn with_timeout<F, T>(
    send: F,
    timer: T,
    limit: Duration,
) -> std::result::Result<F::Output, TransportError>
where
    F: Future,
    T: Future<Output = ()>,
{
    let send = pin!(send);
    let timer = pin!(timer);
    match select(send, timer).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(_) => Err(TransportError::TimedOut(limit)),
    }
}

#[derive(Debug, Deserialize)]
struct LoginReply {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

/// Typed operations against the API
#[derive(Debug, Clone)]
pub struct ApiClient<H> {
    transport: H,
    config: Config,
}

impl<H: HttpTransport> ApiClient<H> {
    pub fn new(transport: H, config: Config) -> Self {
        ApiClient { transport, config }
    }

    pub fn transport(&self) -> &H {
        &self.transport
    }

    /// Exchange credentials for an access token.
    pub async fn login(&self, credentials: &Credentials) -> Result<String> {
        let url = self.config.login_url()?;
        let body = serde_json::to_value(LoginBody {
            email: &credentials.email,
            password: &credentials.password,
        })
        .map_err(|e| Error::Server(format!("Failed to encode login request: {}", e)))?;

        let response = self
            .transport
            .post_json(url.as_str(), &body, None)
            .await
            .map_err(network_error)?;

        if !response.is_success() {
            return Err(login_failure(&response));
        }

        response
            .body
            .and_then(|b| serde_json::from_value::<LoginReply>(b).ok())
            .and_then(|reply| reply.access_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Server("Login response did not include an access token.".to_string()))
    }

    /// Submit a URL for scraping; returns the acknowledgment body.
    pub async fn scrape(&self, token: &str, url: &str, fetch_images: bool) -> Result<Value> {
        let endpoint = self.config.scrape_url()?;
        let body = serde_json::to_value(ScrapeBody {
            url: url.to_string(),
            fetch_images,
        })
        .map_err(|e| Error::Server(format!("Failed to encode scrape request: {}", e)))?;

        let response = self
            .transport
            .post_json(endpoint.as_str(), &body, Some(token))
            .await
            .map_err(network_error)?;

        match response.status {
            401 => Err(Error::session_expired()),
            _ if response.is_success() => Ok(response.body.unwrap_or(Value::Null)),
            status => {
                log::warn!("Scrape request rejected with status {}", status);
                Err(Error::Network(error::NETWORK_FAILURE.to_string()))
            }
        }
    }
}

fn network_error(e: TransportError) -> Error {
    log::warn!("{}", e);
    Error::Network(error::NETWORK_FAILURE.to_string())
}

fn login_failure(response: &HttpResponse) -> Error {
    match response.status {
        401 => Error::Auth(error::INVALID_CREDENTIALS.to_string()),
        400 => Error::Rejected("Bad request. Please check your input and try again.".to_string()),
        500 => Error::Server("Server error. Please try again later.".to_string()),
        status => {
            let message = response.server_message().unwrap_or(error::UNEXPECTED).to_string();
            if status >= 500 {
                Error::Server(message)
            } else {
                Error::Rejected(message)
            }
        }
    }
}
