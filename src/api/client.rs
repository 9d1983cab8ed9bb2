//! REST client for the signals backend
//!
//! [`SignalsApi`] is the seam the views depend on; [`SignalsClient`] is the
//! reqwest implementation. Every response goes through the same envelope
//! check: a non-2xx status or a truthy `error` field in the body becomes
//! [`ApiError::Backend`] carrying the backend's `message`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::errors::{ApiError, ApiResult};
use super::session::Session;
use super::types::{
    AuthResponse, Credentials, HomeDetails, Instrument, Market, NewMarket, NewScript, NewSignal,
    ScriptSummary, SubscriptionDetails,
};
use crate::config::ApiConfig;

/// Connection timeout, fail fast when the backend host is down
const HTTP_CONNECT_TIMEOUT_MS: u64 = 3_000;
/// Max idle connections kept per host
const HTTP_POOL_MAX_IDLE: usize = 4;

// ============================================================================
// Trait
// ============================================================================

/// Operations the dashboard performs against the backend
#[async_trait]
pub trait SignalsApi: Send + Sync {
    /// `POST /auth/signin`
    async fn sign_in(&self, credentials: &Credentials) -> ApiResult<AuthResponse>;

    /// `GET /market/get-all`
    async fn list_markets(&self) -> ApiResult<Vec<Market>>;

    /// `POST /market/create`
    async fn create_market(&self, market: &NewMarket) -> ApiResult<()>;

    /// `GET /scripts`
    async fn list_scripts(&self) -> ApiResult<Vec<Instrument>>;

    /// `GET /scripts/ids`
    async fn list_script_ids(&self) -> ApiResult<Vec<ScriptSummary>>;

    /// `POST /scripts`
    async fn create_script(&self, script: &NewScript) -> ApiResult<()>;

    /// `POST /signals/create`
    async fn create_signal(&self, signal: &NewSignal) -> ApiResult<()>;

    /// `GET /signals/getLatestSignals`
    async fn latest_signals(&self) -> ApiResult<Vec<Instrument>>;

    /// `GET /home/get-home-details/{userId}`, needs a session
    async fn home_details(&self) -> ApiResult<HomeDetails>;

    /// `GET /subscription/details`
    async fn subscription_details(&self) -> ApiResult<Vec<SubscriptionDetails>>;
}

// ============================================================================
// reqwest implementation
// ============================================================================

/// HTTP client bound to one backend and, optionally, one session
#[derive(Debug, Clone)]
pub struct SignalsClient {
    http: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
    session: Option<Session>,
}

impl SignalsClient {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(
                HTTP_CONNECT_TIMEOUT_MS.min(config.timeout_ms),
            ))
            .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE)
            .build()
            .map_err(|e| ApiError::ClientSetup(e.to_string()))?;

        debug!(
            phase = "init",
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            "HTTP client configured"
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_ms,
            session: None,
        })
    }

    /// Attach the session used for authenticated requests
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(session) => request.header(AUTHORIZATION, session.bearer()),
            None => request,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(self.url(path)))
    }

    fn post<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestBuilder {
        self.authorize(self.http.post(self.url(path)).json(body))
    }

    fn transport_error(&self, endpoint: &str, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            error!(endpoint, timeout_ms = self.timeout_ms, "Request timed out");
            ApiError::NetworkTimeout(self.timeout_ms)
        } else {
            error!(endpoint, error = %err, "Request failed");
            ApiError::ConnectionFailed(format!("{}: {}", endpoint, err))
        }
    }

    /// Send the request and return the JSON body once the envelope checks pass
    async fn execute(&self, request: RequestBuilder, endpoint: &str) -> ApiResult<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "Response received");

        let parsed: Option<Value> = serde_json::from_str(&body).ok();

        if status == StatusCode::UNAUTHORIZED {
            let message = parsed
                .as_ref()
                .and_then(backend_message)
                .unwrap_or_else(|| status.to_string());
            warn!(endpoint, message = %message, "Request unauthorized");
            return Err(ApiError::Unauthorized(message));
        }

        let value = match parsed {
            Some(value) => value,
            None if status.is_success() => {
                return Err(ApiError::InvalidResponse(format!(
                    "{}: body is not JSON",
                    endpoint
                )));
            }
            None => {
                let message = if body.trim().is_empty() {
                    status.to_string()
                } else {
                    body.trim().to_string()
                };
                warn!(endpoint, status = status.as_u16(), message = %message, "Backend rejected request");
                return Err(ApiError::Backend {
                    status: status.as_u16(),
                    message,
                });
            }
        };

        if !status.is_success() || has_error_flag(&value) {
            let message = backend_message(&value).unwrap_or_else(|| status.to_string());
            warn!(endpoint, status = status.as_u16(), message = %message, "Backend rejected request");
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        Ok(value)
    }

    /// Execute and decode the envelope's `data` field
    async fn fetch_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> ApiResult<T> {
        let mut value = self.execute(request, endpoint).await?;
        let data = value
            .get_mut("data")
            .map(Value::take)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ApiError::InvalidResponse(format!("{}: missing data field", endpoint)))?;

        serde_json::from_value(data)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", endpoint, e)))
    }
}

#[async_trait]
impl SignalsApi for SignalsClient {
    async fn sign_in(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        let endpoint = "auth/signin";
        // Never send a stale token along with credentials
        let request = self.http.post(self.url("/auth/signin")).json(credentials);

        let value = match self.execute(request, endpoint).await {
            Err(ApiError::Backend { status, message }) if status == 403 || status == 404 => {
                return Err(ApiError::SignInRejected(message));
            }
            Err(ApiError::Unauthorized(message)) => {
                return Err(ApiError::SignInRejected(message));
            }
            other => other?,
        };

        if value.get("statusCode").is_some_and(|code| !code.is_null()) {
            let message = backend_message(&value).unwrap_or_else(|| "rejected".to_string());
            warn!(username = %credentials.username, message = %message, "Sign-in rejected");
            return Err(ApiError::SignInRejected(message));
        }

        let auth: AuthResponse = serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", endpoint, e)))?;
        info!(user_id = auth.user_data.id, "Signed in");
        Ok(auth)
    }

    async fn list_markets(&self) -> ApiResult<Vec<Market>> {
        self.fetch_data(self.get("/market/get-all"), "market/get-all")
            .await
    }

    async fn create_market(&self, market: &NewMarket) -> ApiResult<()> {
        self.execute(self.post("/market/create", market), "market/create")
            .await?;
        info!(market = %market.name, "Market created");
        Ok(())
    }

    async fn list_scripts(&self) -> ApiResult<Vec<Instrument>> {
        self.fetch_data(self.get("/scripts"), "scripts").await
    }

    async fn list_script_ids(&self) -> ApiResult<Vec<ScriptSummary>> {
        self.fetch_data(self.get("/scripts/ids"), "scripts/ids").await
    }

    async fn create_script(&self, script: &NewScript) -> ApiResult<()> {
        self.execute(self.post("/scripts", script), "scripts").await?;
        info!(script = %script.name, market_id = script.market.connect.id, "Script created");
        Ok(())
    }

    async fn create_signal(&self, signal: &NewSignal) -> ApiResult<()> {
        self.execute(self.post("/signals/create", signal), "signals/create")
            .await?;
        info!(
            script_id = signal.script.connect.id,
            action = %signal.signal_type,
            status = %signal.status,
            "Signal created"
        );
        Ok(())
    }

    async fn latest_signals(&self) -> ApiResult<Vec<Instrument>> {
        self.fetch_data(self.get("/signals/getLatestSignals"), "signals/getLatestSignals")
            .await
    }

    async fn home_details(&self) -> ApiResult<HomeDetails> {
        let session = self.session.as_ref().ok_or(ApiError::NotLoggedIn)?;
        let path = format!("/home/get-home-details/{}", session.user_id);
        self.fetch_data(self.get(&path), "home/get-home-details")
            .await
    }

    async fn subscription_details(&self) -> ApiResult<Vec<SubscriptionDetails>> {
        self.fetch_data(self.get("/subscription/details"), "subscription/details")
            .await
    }
}

// ============================================================================
// Envelope helpers
// ============================================================================

/// Truthiness of the body's `error` field
fn has_error_flag(body: &Value) -> bool {
    match body.get("error") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map_or(false, |v| v != 0.0),
        Some(_) => true,
    }
}

/// Human-readable `message`, joining validation arrays
fn backend_message(body: &Value) -> Option<String> {
    match body.get("message")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================
