//! Client for the bot's JSON API.
//!
//! [`ApiClient`] wraps a [`Transport`] with the request bound, status and
//! body classification, deprecated-alias fallback, and the shared
//! [`RetryCounter`] reset on success.
//!
//! ```text
//! ApiClient::request(endpoint)
//!        │
//!        ├──▶ tokio::time::timeout(Transport::send) ──▶ ApiError::Timeout
//!        ├──▶ non-2xx                               ──▶ ApiError::Http
//!        ├──▶ not a JSON object                     ──▶ ApiError::Malformed
//!        ├──▶ {"success": false}                    ──▶ ApiError::Application
//!        └──▶ Ok(Value) + RetryCounter::reset()
//! ```
//!
//! The typed `fetch_*` helpers reset the counter only once the body has
//! decoded into its snapshot type.

mod endpoint;
mod error;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use endpoint::Endpoint;
pub use error::ApiError;
pub use transport::{ApiRequest, HttpTransport, Method, RawResponse, Transport};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::data::health::RetryCounter;
use crate::data::snapshot::{
    merge_snapshot, AnalyticsSnapshot, GuildList, GuildSummary, HealthReport, StatsSnapshot,
};

/// Default bound for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Setting values keyed by setting name.
pub type SettingsMap = BTreeMap<String, Value>;

/// Bounded-timeout client for the bot API.
#[derive(Debug)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    retries: RetryCounter,
    /// Endpoints that only answered on a deprecated alias.
    resolved: Mutex<HashMap<&'static str, &'static str>>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration, retries: RetryCounter) -> Self {
        Self {
            transport,
            timeout,
            retries,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// The shared consecutive-failure counter.
    pub fn retries(&self) -> &RetryCounter {
        &self.retries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Description of the API target.
    pub fn describe(&self) -> &str {
        self.transport.describe()
    }

    /// Perform a request and return the JSON object body.
    ///
    /// A GET answered with 404 is retried against the endpoint's deprecated
    /// aliases; the first alias that answers is remembered.
    pub async fn request(
        &self,
        endpoint: &Endpoint,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let result = self.send(endpoint, method, body).await;
        self.settle(result)
    }

    /// Reset the failure counter if `result` is a success.
    ///
    /// Typed helpers call this after decoding, so a JSON object of the wrong
    /// shape still counts as a failure.
    fn settle<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if result.is_ok() {
            self.retries.reset();
        }
        result
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let remembered = self.resolved.lock().get(endpoint.name()).copied();
        let primary = remembered.map(str::to_string).unwrap_or_else(|| endpoint.path());

        match self.execute(method, &primary, body).await {
            Err(err) if err.is_not_found() && method == Method::Get => {
                self.try_aliases(endpoint, &primary, err).await
            }
            other => other,
        }
    }

    async fn try_aliases(
        &self,
        endpoint: &Endpoint,
        tried: &str,
        original: ApiError,
    ) -> Result<Value, ApiError> {
        for alias in endpoint.aliases().iter().copied().filter(|a| *a != tried) {
            match self.execute(Method::Get, alias, None).await {
                Ok(value) => {
                    tracing::warn!(
                        endpoint = endpoint.name(),
                        alias,
                        "endpoint only answered on a deprecated alias"
                    );
                    self.resolved.lock().insert(endpoint.name(), alias);
                    return Ok(value);
                }
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err),
            }
        }
        Err(original)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let request = match method {
            Method::Get => ApiRequest::get(path),
            Method::Post => ApiRequest::post(path, body),
        };

        let response = tokio::time::timeout(self.timeout, self.transport.send(request))
            .await
            .map_err(|_| ApiError::Timeout(self.timeout))??;

        if !(200..300).contains(&response.status) {
            return Err(ApiError::Http {
                status: response.status,
            });
        }

        let value: Value = serde_json::from_slice(&response.body)?;
        let Value::Object(ref obj) = value else {
            return Err(ApiError::Malformed("expected a JSON object".to_string()));
        };

        if obj.get("success") == Some(&Value::Bool(false)) {
            return Err(ApiError::Application(error_message(&value)));
        }

        Ok(value)
    }

    /// POST an action and require an explicit success payload.
    async fn action(&self, endpoint: &Endpoint, body: Option<Value>) -> Result<(), ApiError> {
        let result = self.send(endpoint, Method::Post, body).await.and_then(|value| {
            if value.get("success").is_none() && value.get("error").is_some() {
                return Err(ApiError::Application(error_message(&value)));
            }
            Ok(())
        });
        self.settle(result)
    }

    /// Fetch stats, merging the response over the previous snapshot.
    pub async fn fetch_stats(
        &self,
        previous: Option<&StatsSnapshot>,
    ) -> Result<StatsSnapshot, ApiError> {
        let result = self.send(&Endpoint::Stats, Method::Get, None).await;
        self.settle(result.and_then(|body| merge_snapshot(previous, body)))
    }

    /// Fetch analytics, merging the response over the previous snapshot.
    pub async fn fetch_analytics(
        &self,
        previous: Option<&AnalyticsSnapshot>,
    ) -> Result<AnalyticsSnapshot, ApiError> {
        let result = self.send(&Endpoint::Analytics, Method::Get, None).await;
        self.settle(result.and_then(|body| merge_snapshot(previous, body)))
    }

    pub async fn check_health(&self) -> Result<HealthReport, ApiError> {
        let result = self.send(&Endpoint::Health, Method::Get, None).await;
        self.settle(result.and_then(decode))
    }

    pub async fn fetch_guilds(&self) -> Result<Vec<GuildSummary>, ApiError> {
        let result = self.send(&Endpoint::Guilds, Method::Get, None).await;
        let list: GuildList = self.settle(result.and_then(decode))?;
        Ok(list.guilds)
    }

    pub async fn fetch_settings(&self) -> Result<SettingsMap, ApiError> {
        let result = self.send(&Endpoint::Settings, Method::Get, None).await;
        self.settle(result.and_then(decode))
    }

    pub async fn update_setting(&self, setting: &str, value: Value) -> Result<(), ApiError> {
        self.action(
            &Endpoint::Settings,
            Some(json!({ "setting": setting, "value": value })),
        )
        .await
    }

    pub async fn fetch_guild_settings(&self, guild_id: &str) -> Result<SettingsMap, ApiError> {
        let endpoint = Endpoint::GuildSettings(guild_id.to_string());
        let result = self.send(&endpoint, Method::Get, None).await;
        self.settle(result.and_then(decode))
    }

    pub async fn update_guild_setting(
        &self,
        guild_id: &str,
        setting: &str,
        value: Value,
    ) -> Result<(), ApiError> {
        self.action(
            &Endpoint::GuildSettings(guild_id.to_string()),
            Some(json!({ "setting": setting, "value": value })),
        )
        .await
    }

    pub async fn reset_guild_defaults(&self, guild_id: &str) -> Result<(), ApiError> {
        self.action(&Endpoint::GuildResetDefaults(guild_id.to_string()), None)
            .await
    }

    pub async fn reload_bot(&self) -> Result<(), ApiError> {
        self.action(&Endpoint::BotReload, None).await
    }
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(body)?)
}

fn error_message(value: &Value) -> String {
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("Request failed")
        .to_string()
}
