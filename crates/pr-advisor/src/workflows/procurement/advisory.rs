//! Language-model enrichment. Optional: the deterministic analysis never depends on it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info};

use super::analysis::{AnalysisResult, EffortLevel, RiskLevel, MAX_RISK_SCORE};
use super::domain::WinProbability;
use super::money::Money;
use crate::config::AdvisoryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvisoryConfidence {
    High,
    Medium,
    Low,
}

/// Structured narrative produced by the advisor for the director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryInsight {
    pub short_recommendation: String,
    pub detailed_analysis: String,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub risk_flags: Vec<String>,
    pub confidence: AdvisoryConfidence,
}

/// Project facts a follow-up question is answered against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpContext {
    pub project_name: String,
    pub risk_level: RiskLevel,
    pub remaining_budget: Money,
    pub new_pr_value: Money,
    pub effort_level: EffortLevel,
    pub historical_win_probability: WinProbability,
}

impl From<&AnalysisResult> for FollowUpContext {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            project_name: result.input.project_name.clone(),
            risk_level: result.risk_level,
            remaining_budget: result.metrics.remaining_budget,
            new_pr_value: result.input.new_pr_value,
            effort_level: result.effort_level,
            historical_win_probability: result.input.historical_win_probability,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("advisory generation is not configured")]
    Disabled,
    #[error("advisory request timed out after {0:?}")]
    Timeout(Duration),
    #[error("advisory request failed: {0}")]
    Transport(String),
    #[error("advisory service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("advisory response malformed: {0}")]
    MalformedResponse(String),
}

/// Capability injected into the analysis service.
#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    async fn generate_insight(
        &self,
        result: &AnalysisResult,
    ) -> Result<AdvisoryInsight, AdvisoryError>;

    async fn answer_follow_up(
        &self,
        context: &FollowUpContext,
        question: &str,
    ) -> Result<String, AdvisoryError>;
}

/// Used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAdvisor;

#[async_trait]
impl AdvisoryProvider for DisabledAdvisor {
    async fn generate_insight(
        &self,
        _result: &AnalysisResult,
    ) -> Result<AdvisoryInsight, AdvisoryError> {
        Err(AdvisoryError::Disabled)
    }

    async fn answer_follow_up(
        &self,
        _context: &FollowUpContext,
        _question: &str,
    ) -> Result<String, AdvisoryError> {
        Err(AdvisoryError::Disabled)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Google Gemini `generateContent` client.
pub struct GeminiAdvisor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

/// Either a live Gemini client or the disabled stand-in, chosen from configuration.
pub enum ConfiguredAdvisor {
    Gemini(GeminiAdvisor),
    Disabled(DisabledAdvisor),
}

impl ConfiguredAdvisor {
    pub fn from_config(config: &AdvisoryConfig) -> Self {
        match &config.api_key {
            Some(api_key) => Self::Gemini(GeminiAdvisor::new(
                api_key.clone(),
                config.model.clone(),
                config.base_url.clone(),
                config.timeout,
            )),
            None => Self::Disabled(DisabledAdvisor),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Gemini(_))
    }
}

#[async_trait]
impl AdvisoryProvider for ConfiguredAdvisor {
    async fn generate_insight(
        &self,
        result: &AnalysisResult,
    ) -> Result<AdvisoryInsight, AdvisoryError> {
        match self {
            Self::Gemini(advisor) => advisor.generate_insight(result).await,
            Self::Disabled(advisor) => advisor.generate_insight(result).await,
        }
    }

    async fn answer_follow_up(
        &self,
        context: &FollowUpContext,
        question: &str,
    ) -> Result<String, AdvisoryError> {
        match self {
            Self::Gemini(advisor) => advisor.answer_follow_up(context, question).await,
            Self::Disabled(advisor) => advisor.answer_follow_up(context, question).await,
        }
    }
}

impl GeminiAdvisor {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, AdvisoryError> {
        let started = Instant::now();
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
        };

        debug!(model = %self.model, "sending advisory request");

        let response = timeout(
            self.timeout,
            self.client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&request)
                .send(),
        )
        .await
        .map_err(|_| AdvisoryError::Timeout(self.timeout))?
        .map_err(|err| AdvisoryError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable body".to_string());
            return Err(AdvisoryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|err| AdvisoryError::MalformedResponse(err.without_url().to_string()))?;

        let text = payload
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AdvisoryError::MalformedResponse("no candidate text".to_string()))?;

        info!(
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "advisory response received"
        );
        Ok(text)
    }
}

#[async_trait]
impl AdvisoryProvider for GeminiAdvisor {
    async fn generate_insight(
        &self,
        result: &AnalysisResult,
    ) -> Result<AdvisoryInsight, AdvisoryError> {
        let text = self.generate_text(&insight_prompt(result)).await?;
        parse_insight(&text)
    }

    async fn answer_follow_up(
        &self,
        context: &FollowUpContext,
        question: &str,
    ) -> Result<String, AdvisoryError> {
        let text = self
            .generate_text(&follow_up_prompt(context, question))
            .await?;
        Ok(text.trim().to_string())
    }
}

pub(crate) fn insight_prompt(result: &AnalysisResult) -> String {
    let input = &result.input;
    let metrics = &result.metrics;
    let overrun = if metrics.is_overrun {
        "YES - CRITICAL"
    } else {
        "No"
    };

    format!(
        "You are an expert HVAC procurement advisor for a construction engineering company.\n\
         \n\
         Analyse this Purchase Request and give a professional recommendation to the director.\n\
         \n\
         PROJECT DETAILS:\n\
         - Project Name: {name}\n\
         - Client Type: {client}\n\
         - Project Size: {size}\n\
         - Project Budget: {budget}\n\
         - Spent Till Date: {spent}\n\
         - New PR Value: {pr}\n\
         - Remaining Budget After PR: {remaining}\n\
         - Budget Utilization After PR: {util:.1}%\n\
         - Historical Win Probability: {win}\n\
         - Expected Project Value: {expected}\n\
         - Risk Level: {level} (Score: {score}/{max})\n\
         - Budget Overrun: {overrun}\n\
         - Suggested Effort: {effort}\n\
         \n\
         Respond in this exact JSON format:\n\
         {{\n\
         \x20 \"short_recommendation\": \"One sentence summary for the director (max 20 words)\",\n\
         \x20 \"detailed_analysis\": \"2-3 sentences explaining risk, budget situation, and procurement advice\",\n\
         \x20 \"action_items\": [\"action 1\", \"action 2\", \"action 3\"],\n\
         \x20 \"risk_flags\": [\"flag 1\", \"flag 2\"] or [],\n\
         \x20 \"confidence\": \"High\" or \"Medium\" or \"Low\"\n\
         }}\n\
         \n\
         Be concise, professional, and specific to HVAC/MEP procurement context.\n",
        name = input.project_name,
        client = input.client_type,
        size = input.project_size,
        budget = input.project_budget,
        spent = input.spent_till_date,
        pr = input.new_pr_value,
        remaining = metrics.remaining_budget,
        util = metrics.budget_utilization_after,
        win = input.historical_win_probability.percent_label(),
        expected = metrics.expected_value,
        level = result.risk_level,
        score = result.risk_score,
        max = MAX_RISK_SCORE,
        effort = result.effort_level,
    )
}

pub(crate) fn follow_up_prompt(context: &FollowUpContext, question: &str) -> String {
    format!(
        "You are an HVAC procurement advisor. A director has a question about this project:\n\
         \n\
         PROJECT: {name}\n\
         Risk Level: {level}\n\
         Budget Remaining: {remaining}\n\
         PR Value: {pr}\n\
         Effort Recommendation: {effort}\n\
         Win Probability: {win}\n\
         \n\
         Director's Question: {question}\n\
         \n\
         Give a direct, professional answer in 2-4 sentences. Be specific to HVAC/MEP procurement.\n",
        name = context.project_name,
        level = context.risk_level,
        remaining = context.remaining_budget,
        pr = context.new_pr_value,
        effort = context.effort_level,
        win = context.historical_win_probability.percent_label(),
        question = question.trim(),
    )
}

/// Parses the first `{ ... }` span of a model reply; models often wrap JSON in prose or fences.
pub(crate) fn parse_insight(text: &str) -> Result<AdvisoryInsight, AdvisoryError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            return Err(AdvisoryError::MalformedResponse(
                "reply contains no JSON object".to_string(),
            ))
        }
    };
    serde_json::from_str(json).map_err(|err| AdvisoryError::MalformedResponse(err.to_string()))
}
