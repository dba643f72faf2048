//! Transport between adapters and platform APIs
//!
//! Adapters shape a [`PlatformCall`]; whatever implements
//! [`PlatformTransport`] delivers it and reports platform-side errors as a
//! [`PlatformFailure`] carrying the platform's native codes.

use adrelay_core::Platform;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// One request to a platform API, relative to the platform's base URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformCall {
    pub platform: Platform,
    pub method: Method,
    pub path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub body: Value,
}

impl PlatformCall {
    pub fn get(platform: Platform, path: impl Into<String>) -> Self {
        Self {
            platform,
            method: Method::Get,
            path: path.into(),
            query: BTreeMap::new(),
            body: Value::Null,
        }
    }

    pub fn post(platform: Platform, path: impl Into<String>, body: Value) -> Self {
        Self {
            platform,
            method: Method::Post,
            path: path.into(),
            query: BTreeMap::new(),
            body,
        }
    }

    pub fn delete(platform: Platform, path: impl Into<String>) -> Self {
        Self {
            platform,
            method: Method::Delete,
            path: path.into(),
            query: BTreeMap::new(),
            body: Value::Null,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for PlatformCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.platform, self.method, self.path)
    }
}

/// Error reported by a platform, in the platform's own terms
#[derive(Error, Debug, Clone, PartialEq, Default)]
#[error("{message}")]
pub struct PlatformFailure {
    /// HTTP status; `None` when no response arrived
    pub status: Option<u16>,
    /// Platform error code (Meta `code`, TikTok envelope `code`)
    pub code: Option<i64>,
    pub subcode: Option<i64>,
    /// Symbolic error reason (Google error enum name)
    pub reason: Option<String>,
    pub message: String,
    pub retry_after: Option<Duration>,
    /// Set when the transport gave up waiting
    pub timed_out_after: Option<Duration>,
}

impl PlatformFailure {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            ..Self::default()
        }
    }

    /// No response: connection refused, reset, DNS failure
    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self {
            message: format!("no response after {:?}", after),
            timed_out_after: Some(after),
            ..Self::default()
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_subcode(mut self, subcode: i64) -> Self {
        self.subcode = Some(subcode);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_retry_after(mut self, after: Duration) -> Self {
        self.retry_after = Some(after);
        self
    }
}

#[async_trait]
pub trait PlatformTransport: Send + Sync {
    async fn send(&self, call: PlatformCall) -> Result<Value, PlatformFailure>;
}

/// Transport that answers every call locally with plausible responses
///
/// Used for dry runs and tests. Failures queued with
/// [`SandboxTransport::fail_next`] are returned, in order, before any
/// fabricated response; calls that sleep before answering can be simulated
/// with [`SandboxTransport::with_latency`].
#[derive(Debug)]
pub struct SandboxTransport {
    next_id: AtomicU64,
    calls: AtomicUsize,
    failures: Mutex<VecDeque<PlatformFailure>>,
    sent: Mutex<Vec<PlatformCall>>,
    latency: Duration,
}

impl Default for SandboxTransport {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            calls: AtomicUsize::new(0),
            failures: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }
}

impl SandboxTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queues a failure for the next call
    pub fn fail_next(&self, failure: PlatformFailure) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(failure);
        }
    }

    /// Calls received, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every call received, in order
    pub fn sent(&self) -> Vec<PlatformCall> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn fresh_id(&self, platform: Platform) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        match platform {
            Platform::Meta => format!("1202{:011}", n),
            Platform::TikTok => format!("17{:017}", n),
            Platform::Google => format!("{}", 20_000_000 + n),
        }
    }

    fn respond(&self, call: &PlatformCall) -> Value {
        match call.platform {
            Platform::Meta => self.respond_meta(call),
            Platform::TikTok => self.respond_tiktok(call),
            Platform::Google => self.respond_google(call),
        }
    }

    fn respond_meta(&self, call: &PlatformCall) -> Value {
        match call.method {
            Method::Post if call.path.starts_with("act_") => {
                json!({"id": self.fresh_id(Platform::Meta)})
            }
            Method::Post | Method::Delete => json!({"success": true}),
            Method::Get => json!({
                "id": call.path,
                "name": "Sandbox campaign",
                "status": "ACTIVE",
                "effective_status": "ACTIVE",
            }),
        }
    }

    fn respond_tiktok(&self, call: &PlatformCall) -> Value {
        let data = match call.path.as_str() {
            "campaign/create/" => json!({"campaign_id": self.fresh_id(Platform::TikTok)}),
            "adgroup/create/" => json!({"adgroup_id": self.fresh_id(Platform::TikTok)}),
            "ad/create/" => json!({"ad_ids": [self.fresh_id(Platform::TikTok)]}),
            "campaign/get/" => {
                let id = call
                    .query
                    .get("filtering")
                    .and_then(|f| serde_json::from_str::<Value>(f).ok())
                    .and_then(|f| f["campaign_ids"][0].as_str().map(str::to_string))
                    .unwrap_or_default();
                json!({"list": [{
                    "campaign_id": id,
                    "campaign_name": "Sandbox campaign",
                    "operation_status": "ENABLE",
                    "secondary_status": "CAMPAIGN_STATUS_ENABLE",
                }]})
            }
            _ => Value::Object(Map::new()),
        };
        json!({
            "code": 0,
            "message": "OK",
            "request_id": format!("sandbox-{}", self.calls()),
            "data": data,
        })
    }

    fn respond_google(&self, call: &PlatformCall) -> Value {
        let customer = call
            .path
            .strip_prefix("customers/")
            .and_then(|rest| rest.split('/').next())
            .unwrap_or("0")
            .to_string();

        if call.path.ends_with("googleAds:search") {
            let id = call.body["query"]
                .as_str()
                .and_then(|q| q.rsplit(' ').next())
                .unwrap_or("0")
                .to_string();
            return json!({"results": [{"campaign": {
                "resourceName": format!("customers/{}/campaigns/{}", customer, id),
                "id": id,
                "name": "Sandbox campaign",
                "status": "ENABLED",
            }}]});
        }

        if call.path.ends_with("googleAds:mutate") {
            return self.respond_google_batch(&customer, &call.body);
        }

        let collection = call
            .path
            .rsplit('/')
            .next()
            .and_then(|last| last.strip_suffix(":mutate"))
            .unwrap_or("resources");
        let results: Vec<Value> = call.body["operations"]
            .as_array()
            .map(|ops| {
                ops.iter()
                    .map(|op| {
                        let name = op["update"]["resourceName"]
                            .as_str()
                            .or_else(|| op["remove"].as_str())
                            .map(str::to_string)
                            .unwrap_or_else(|| {
                                format!(
                                    "customers/{}/{}/{}",
                                    customer,
                                    collection,
                                    self.fresh_id(Platform::Google)
                                )
                            });
                        json!({"resourceName": name})
                    })
                    .collect()
            })
            .unwrap_or_default();
        json!({"results": results})
    }

    /// Batched mutate: temporary `-N` resource names get fresh ids
    fn respond_google_batch(&self, customer: &str, body: &Value) -> Value {
        let responses: Vec<Value> = body["mutateOperations"]
            .as_array()
            .map(|ops| {
                ops.iter()
                    .filter_map(|op| op.as_object()?.iter().next())
                    .map(|(kind, op)| {
                        let collection = format!("{}s", kind.trim_end_matches("Operation"));
                        let name = match op["create"]["resourceName"].as_str() {
                            Some(temp) => format!(
                                "{}/{}",
                                temp.rsplit_once('/').map_or(temp, |(base, _)| base),
                                self.fresh_id(Platform::Google)
                            ),
                            None => format!(
                                "customers/{}/{}/{}",
                                customer,
                                collection,
                                self.fresh_id(Platform::Google)
                            ),
                        };
                        let mut response = Map::new();
                        response.insert(
                            format!("{}Result", kind.trim_end_matches("Operation")),
                            json!({ "resourceName": name }),
                        );
                        Value::Object(response)
                    })
                    .collect()
            })
            .unwrap_or_default();
        json!({ "mutateOperationResponses": responses })
    }
}

#[async_trait]
impl PlatformTransport for SandboxTransport {
    async fn send(&self, call: PlatformCall) -> Result<Value, PlatformFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(call.clone());
        }
        log::debug!("sandbox: {}", call);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let queued = self.failures.lock().ok().and_then(|mut f| f.pop_front());
        match queued {
            Some(failure) => Err(failure),
            None => Ok(self.respond(&call)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_failures_come_first() {
        let sandbox = SandboxTransport::new();
        sandbox.fail_next(PlatformFailure::http(503, "unavailable"));

        let call = PlatformCall::delete(Platform::Meta, "120200000000001");
        assert_eq!(
            sandbox.send(call.clone()).await.unwrap_err().status,
            Some(503)
        );
        assert_eq!(sandbox.send(call).await.unwrap()["success"], true);
        assert_eq!(sandbox.calls(), 2);
    }

    #[tokio::test]
    async fn test_google_mutate_echoes_resource_names() {
        let sandbox = SandboxTransport::new();
        let call = PlatformCall::post(
            Platform::Google,
            "customers/123/adGroups:mutate",
            json!({"operations": [
                {"update": {"resourceName": "customers/123/adGroups/9", "status": "PAUSED"}},
                {"create": {"name": "New"}},
            ]}),
        );
        let response = sandbox.send(call).await.unwrap();
        assert_eq!(response["results"][0]["resourceName"], "customers/123/adGroups/9");
        assert!(response["results"][1]["resourceName"]
            .as_str()
            .unwrap()
            .starts_with("customers/123/adGroups/"));
    }

    #[test]
    fn test_failure_builders() {
        let failure = PlatformFailure::http(400, "Invalid OAuth access token")
            .with_code(190)
            .with_subcode(463);
        assert_eq!(failure.code, Some(190));
        assert_eq!(failure.subcode, Some(463));
        assert_eq!(failure.to_string(), "Invalid OAuth access token");
        assert!(PlatformFailure::timeout(Duration::from_secs(30))
            .timed_out_after
            .is_some());
    }
}
