//! services/client/src/adapters/insights.rs
//!
//! HTTP adapter for the insights endpoint. Posts compact per-session
//! snapshots and receives a short list of study suggestions back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use study_coach_core::domain::InsightSnapshot;
use study_coach_core::ports::{InsightsService, PortError, PortResult};

use super::http::{ensure_success, normalize_base_url};

//=========================================================================================
// Wire types
//=========================================================================================

#[derive(Serialize)]
struct InsightsRequest<'a> {
    sessions: &'a [InsightSnapshot],
}

#[derive(Deserialize, Default)]
struct InsightsEnvelope {
    #[serde(default)]
    insights: Vec<String>,
}

//=========================================================================================
// HttpInsightsService
//=========================================================================================

pub struct HttpInsightsService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInsightsService {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    fn insights_url(&self) -> String {
        format!("{}/api/generate-insights", self.base_url)
    }
}

#[async_trait]
impl InsightsService for HttpInsightsService {
    async fn generate_insights(&self, sessions: &[InsightSnapshot]) -> PortResult<Vec<String>> {
        let response = self
            .client
            .post(self.insights_url())
            .json(&InsightsRequest { sessions })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let response = ensure_success(response, "insights")?;
        let envelope = response
            .json::<InsightsEnvelope>()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(envelope.insights)
    }
}
