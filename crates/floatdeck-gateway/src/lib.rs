pub mod http;

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use floatdeck_schema::{
    CapabilityStatus, FloatSummary, ProfilePoint, TimeSeriesPoint, Variable,
};

pub use http::HttpGateway;

/// Transport-level failure. Every non-2xx status and every undecodable
/// body counts; callers decide whether to swallow, skip, or surface it.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_connect() {
            GatewayError::Connect(err.to_string())
        } else if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

/// Success body of the deterministic query endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub natural_language_response: Option<String>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

/// Success body of the advanced-AI endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiChatResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub ai_answer: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Typed surface over the backend HTTP service. The service owns all
/// domain logic and storage; this side only issues requests.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn daily_avg(
        &self,
        variable: Variable,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TimeSeriesPoint>, GatewayError>;

    async fn floats(&self, limit: u32) -> Result<Vec<FloatSummary>, GatewayError>;

    async fn profile(&self, float_id: &str, cycle: u32) -> Result<Vec<ProfilePoint>, GatewayError>;

    async fn ask(&self, question: &str) -> Result<AskResponse, GatewayError>;

    async fn ai_chat(&self, question: &str) -> Result<AiChatResponse, GatewayError>;

    async fn ai_status(&self) -> Result<CapabilityStatus, GatewayError>;
}

/// Scriptable in-process gateway for tests and offline demos.
///
/// Endpoints named in `fail` return a connect error; `delay` stretches
/// every call, which is how in-flight round-trips are simulated.
#[derive(Default)]
pub struct StubGateway {
    pub time_series: Vec<TimeSeriesPoint>,
    pub floats: Vec<FloatSummary>,
    pub profiles: HashMap<String, Vec<ProfilePoint>>,
    pub ask_response: AskResponse,
    pub ai_response: AiChatResponse,
    pub ai_status: CapabilityStatus,
    pub delay: Option<Duration>,
    fail: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<String>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far, in order, as `endpoint` or
    /// `endpoint:arg` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Make an endpoint return a connect error until cleared. Adjustable
    /// after the stub is shared, so tests can script outages.
    pub fn fail_endpoint(&self, endpoint: &'static str) {
        self.fail.lock().expect("fail lock").insert(endpoint);
    }

    pub fn clear_failures(&self) {
        self.fail.lock().expect("fail lock").clear();
    }

    async fn enter(&self, call: String, endpoint: &'static str) -> Result<(), GatewayError> {
        self.calls.lock().expect("calls lock").push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.lock().expect("fail lock").contains(endpoint) {
            return Err(GatewayError::Connect(format!("{endpoint} unreachable")));
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for StubGateway {
    async fn daily_avg(
        &self,
        variable: Variable,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<TimeSeriesPoint>, GatewayError> {
        self.enter(format!("daily-avg:{variable}"), "daily-avg").await?;
        Ok(self.time_series.clone())
    }

    async fn floats(&self, limit: u32) -> Result<Vec<FloatSummary>, GatewayError> {
        self.enter(format!("floats:{limit}"), "floats").await?;
        Ok(self.floats.clone())
    }

    async fn profile(&self, float_id: &str, cycle: u32) -> Result<Vec<ProfilePoint>, GatewayError> {
        self.enter(format!("profile:{float_id}:{cycle}"), "profile")
            .await?;
        Ok(self.profiles.get(float_id).cloned().unwrap_or_default())
    }

    async fn ask(&self, _question: &str) -> Result<AskResponse, GatewayError> {
        self.enter("ask".to_string(), "ask").await?;
        Ok(self.ask_response.clone())
    }

    async fn ai_chat(&self, _question: &str) -> Result<AiChatResponse, GatewayError> {
        self.enter("ai-chat".to_string(), "ai-chat").await?;
        Ok(self.ai_response.clone())
    }

    async fn ai_status(&self) -> Result<CapabilityStatus, GatewayError> {
        self.enter("ai-status".to_string(), "ai-status").await?;
        Ok(self.ai_status)
    }
}
