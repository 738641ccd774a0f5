//! JSON-RPC client for the wallet bridge.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use mtw_types::{AccountId, Activity, Timestamp};

use crate::{ActivityFetcher, FetchError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Talks to the wallet bridge over HTTP: every call posts a JSON object with an
/// `action` field and reads back the `result` field.
#[derive(Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    bridge_url: String,
}

impl BridgeClient {
    pub fn new(bridge_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            bridge_url: bridge_url.into(),
        })
    }

    pub fn bridge_url(&self) -> &str {
        &self.bridge_url
    }

    async fn rpc_call(&self, action: &str, params: Value) -> Result<Value, FetchError> {
        let body = rpc_body(action, params)?;

        let response = self
            .http
            .post(&self.bridge_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(FetchError::Transport(format!(
                "bridge returned HTTP {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(format!("invalid JSON response: {e}")))?;

        rpc_result(json)
    }
}

fn rpc_body(action: &str, params: Value) -> Result<Value, FetchError> {
    let mut body = params;
    body.as_object_mut()
        .ok_or_else(|| FetchError::Decode("params must be a JSON object".into()))?
        .insert("action".to_string(), json!(action));
    Ok(body)
}

fn rpc_result(json: Value) -> Result<Value, FetchError> {
    if let Some(err) = json.get("error") {
        let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        return Err(FetchError::Remote(message));
    }
    Ok(json.get("result").cloned().unwrap_or(json))
}

#[async_trait]
impl ActivityFetcher for BridgeClient {
    async fn fetch_past_activities(
        &self,
        account_id: &AccountId,
        limit: usize,
        token_slug: Option<&str>,
        to_timestamp: Option<Timestamp>,
    ) -> Result<Vec<Activity>, FetchError> {
        let result = self
            .rpc_call(
                "fetchPastActivities",
                json!({
                    "accountId": account_id,
                    "limit": limit,
                    "tokenSlug": token_slug,
                    "toTimestamp": to_timestamp,
                }),
            )
            .await?;

        let activities: Vec<Activity> = serde_json::from_value(result)
            .map_err(|e| FetchError::Decode(format!("activities: {e}")))?;
        tracing::debug!(
            account = %account_id,
            slug = token_slug.unwrap_or("*"),
            count = activities.len(),
            "fetched past activities"
        );
        Ok(activities)
    }

    async fn fetch_activity_details(
        &self,
        account_id: &AccountId,
        activity: &Activity,
    ) -> Result<Activity, FetchError> {
        let result = self
            .rpc_call(
                "fetchActivityDetails",
                json!({ "accountId": account_id, "activity": activity }),
            )
            .await?;
        serde_json::from_value(result).map_err(|e| FetchError::Decode(format!("activity: {e}")))
    }
}
