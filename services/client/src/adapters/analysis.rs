//! services/client/src/adapters/analysis.rs
//!
//! HTTP adapter for the analysis endpoint. Posts the learner's highlighted
//! text plus their question/answer exchange and receives the diagnostic
//! payload back. Failed calls carry a structured error body which is folded
//! into the port error message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use study_coach_core::domain::{AnalysisResponse, QuestionResponse};
use study_coach_core::ports::{AnalysisService, PortError, PortResult};

use super::http::normalize_base_url;

//================================================================
// Wire types
//================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    selected_text: &'a str,
    qa_pairs: Vec<QaPairBody<'a>>,
}

#[derive(Serialize)]
struct QaPairBody<'a> {
    question: &'a str,
    answer: &'a str,
}

/// Error payload the analysis endpoint returns on failure. Both fields are
/// optional; a missing `error` falls back to a status-line message.
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl ErrorBody {
    fn message(self, status: reqwest::StatusCode) -> String {
        let mut message = self
            .error
            .unwrap_or_else(|| format!("analysis request failed with status {status}"));
        if let Some(details) = self.details {
            message.push_str(" - ");
            message.push_str(&details);
        }
        message
    }
}

//================================================================
// HttpAnalysisService
//================================================================

pub struct HttpAnalysisService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisService {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    fn analyze_url(&self) -> String {
        format!("{}/api/analyze-and-generate-path", self.base_url)
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(
        &self,
        selected_text: &str,
        qa_pairs: &[QuestionResponse],
    ) -> PortResult<AnalysisResponse> {
        let body = AnalyzeRequest {
            selected_text,
            qa_pairs: qa_pairs
                .iter()
                .map(|pair| QaPairBody {
                    question: &pair.question,
                    answer: &pair.answer,
                })
                .collect(),
        };
        let response = self
            .client
            .post(self.analyze_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.json::<ErrorBody>().await.unwrap_or_default();
            return Err(PortError::Unexpected(error_body.message(status)));
        }
        response
            .json::<AnalysisResponse>()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}
