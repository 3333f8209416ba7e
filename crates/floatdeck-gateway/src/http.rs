use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use floatdeck_schema::{
    CapabilityStatus, FloatSummary, ProfilePoint, TimeSeriesPoint, Variable,
};

use crate::{AiChatResponse, AskResponse, Gateway, GatewayError};

/// Per-request ceiling; converts a hung backend into a transport failure.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed [`Gateway`] against the backend base URL.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        debug!(path, "gateway GET");
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(GatewayError::from_reqwest)?;
        Self::decode(resp).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, GatewayError> {
        debug!(path, "gateway POST");
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(GatewayError::from_reqwest)?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, GatewayError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await.map_err(GatewayError::from_reqwest)?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

// Wire bodies. Absent and null arrays both normalize to empty sequences.

#[derive(Debug, Deserialize)]
struct DailyAvgBody {
    #[serde(default)]
    data: Option<Vec<TimeSeriesPoint>>,
}

#[derive(Debug, Deserialize)]
struct FloatsBody {
    #[serde(default)]
    floats: Option<Vec<FloatSummary>>,
}

#[derive(Debug, Deserialize)]
struct ProfileBody {
    #[serde(default)]
    profile: Option<Vec<ProfilePoint>>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Serialize)]
struct QuestionBody<'a> {
    question: &'a str,
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn daily_avg(
        &self,
        variable: Variable,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<TimeSeriesPoint>, GatewayError> {
        let body: DailyAvgBody = self
            .get_json(
                "/daily-avg",
                &[
                    ("var", variable.as_str().to_string()),
                    ("start_date", start_date.to_string()),
                    ("end_date", end_date.to_string()),
                ],
            )
            .await?;
        Ok(body.data.unwrap_or_default())
    }

    async fn floats(&self, limit: u32) -> Result<Vec<FloatSummary>, GatewayError> {
        let body: FloatsBody = self
            .get_json("/floats", &[("limit", limit.to_string())])
            .await?;
        Ok(body.floats.unwrap_or_default())
    }

    async fn profile(&self, float_id: &str, cycle: u32) -> Result<Vec<ProfilePoint>, GatewayError> {
        let body: ProfileBody = self
            .get_json(
                "/profile",
                &[
                    ("float_id", float_id.to_string()),
                    ("cycle", cycle.to_string()),
                ],
            )
            .await?;
        Ok(body.profile.unwrap_or_default())
    }

    async fn ask(&self, question: &str) -> Result<AskResponse, GatewayError> {
        self.post_json("/ask", &QuestionBody { question }).await
    }

    async fn ai_chat(&self, question: &str) -> Result<AiChatResponse, GatewayError> {
        self.post_json("/ai-chat", &QuestionBody { question }).await
    }

    async fn ai_status(&self) -> Result<CapabilityStatus, GatewayError> {
        let body: StatusBody = self.get_json("/ai-status", &[]).await?;
        Ok(CapabilityStatus::parse(&body.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway = HttpGateway::new("http://localhost:8000/");
        assert_eq!(gateway.url("/floats"), "http://localhost:8000/floats");
    }
}
