use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use drill_core::model::{AnswerId, Exercise};

use super::AnswerOracle;
use super::models::LlmModel;
use crate::error::OracleError;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com";
pub const DEFAULT_INSTRUCTIONS: &str = "You are solving a test on a subject of mathematical analysis in russian. \
You will receive question and possible answers, it is in latex format. \
Only return id of correct answer, never return reasoning or any text data.";

#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: LlmModel,
    /// System message constraining the reply to a bare answer id.
    pub instructions: String,
    pub timeout: Duration,
}

impl OracleConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: LlmModel) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model,
            instructions: DEFAULT_INSTRUCTIONS.into(),
            timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Asks an OpenAI-compatible chat completion endpoint to pick the answer.
#[derive(Clone)]
pub struct ChatOracle {
    client: Client,
    config: OracleConfig,
}

impl ChatOracle {
    /// # Errors
    ///
    /// Returns `OracleError::Http` if the HTTP client cannot be built.
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn model(&self) -> LlmModel {
        self.config.model
    }

    fn payload(&self, exercise: &Exercise) -> ChatRequest {
        ChatRequest {
            model: self.config.model.as_str(),
            include_reasoning: false,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.config.instructions.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: exercise.to_string(),
                },
            ],
        }
    }
}

#[async_trait]
impl AnswerOracle for ChatOracle {
    async fn ask(&self, exercise: &Exercise) -> Result<AnswerId, OracleError> {
        let payload = self.payload(exercise);
        debug!(model = payload.model, activity = %exercise.activity_id, "asking completion model");

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(OracleError::RateLimited);
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OracleError::HttpStatus { status, body });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|_| OracleError::Decode(body.clone()))?;
        answer_from_response(parsed)
    }
}

fn answer_from_response(response: ChatResponse) -> Result<AnswerId, OracleError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| OracleError::MalformedResponse("no choices returned".into()))?;
    parse_answer(&content)
}

/// The reply must be a bare integer, optionally padded with whitespace.
pub(crate) fn parse_answer(content: &str) -> Result<AnswerId, OracleError> {
    content
        .parse::<AnswerId>()
        .map_err(|_| OracleError::MalformedResponse(format!("not an answer id: {content:?}")))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: &'static str,
    include_reasoning: bool,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
