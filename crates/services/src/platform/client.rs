use async_trait::async_trait;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, DNT, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use drill_core::model::{
    ActivityId, AttemptId, CourseId, Exercise, LearningScope, Module, Subject,
};

use super::config::PlatformConfig;
use super::wire::{
    AnswerRequest, AnswerResponse, Endpoint, NO_MORE_ACTIVITY, QuestionResponse, parse_attempt,
};
use super::{LearningPlatform, Submission, Verdict};
use crate::error::PlatformError;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:145.0) Gecko/20100101 Firefox/145.0";

/// `reqwest`-backed implementation of [`LearningPlatform`].
#[derive(Clone)]
pub struct PlatformClient {
    client: Client,
    config: PlatformConfig,
}

impl PlatformClient {
    /// Build a client with the browser-like header set and the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Config` when the origin is not a valid header
    /// value, or `PlatformError::Http` if the TLS backend cannot initialise.
    pub fn new(config: PlatformConfig) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(browser_headers(&config)?)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    async fn send(
        &self,
        endpoint: Endpoint,
        body: Option<&AnswerRequest>,
    ) -> Result<(StatusCode, String), PlatformError> {
        let mut request = self
            .client
            .request(endpoint.method(), self.config.url(&endpoint.path()))
            .query(&endpoint.query(&self.config))
            .bearer_auth(&self.config.token);
        if let Some(body) = body {
            request = request.header(ACCEPT, "application/json").json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(endpoint = endpoint.name(), %status, bytes = text.len(), "platform response");
        Ok((status, text))
    }

    async fn post_answer(
        &self,
        scope: &LearningScope,
        submission: &Submission,
    ) -> Result<Verdict, PlatformError> {
        let (endpoint, body) = AnswerRequest::build(submission, scope.module, scope.course);
        let (status, text) = self.send(endpoint, Some(&body)).await?;
        let text = expect_success(endpoint, status, text)?;

        // Corrections may come back with an empty body.
        let response: AnswerResponse = if text.trim().is_empty() {
            AnswerResponse::default()
        } else {
            decode(endpoint, status, &text)?
        };
        Ok(Verdict {
            right_answer_ids: response.right_answer_ids.unwrap_or_default(),
            attempt: submission.attempt,
        })
    }
}

#[async_trait]
impl LearningPlatform for PlatformClient {
    async fn list_available(&self) -> Result<Vec<Subject>, PlatformError> {
        let endpoint = Endpoint::Available;
        let (status, text) = self.send(endpoint, None).await?;
        decode(endpoint, status, &text)
    }

    async fn list_modules(&self, course: CourseId) -> Result<Vec<Module>, PlatformError> {
        let endpoint = Endpoint::Modules { course };
        let (status, text) = self.send(endpoint, None).await?;
        decode(endpoint, status, &text)
    }

    async fn next_question(&self, scope: &LearningScope) -> Result<Exercise, PlatformError> {
        let endpoint = Endpoint::NextQuestion {
            module: scope.module,
            course: scope.course,
        };
        let (status, text) = self.send(endpoint, None).await?;
        let text = expect_success(endpoint, status, text)?;
        let response: QuestionResponse = decode(endpoint, status, &text)?;

        if response.activity_status.as_deref() == Some(NO_MORE_ACTIVITY) {
            return Err(PlatformError::NoMoreActivity);
        }
        response.exercise.ok_or(PlatformError::Decode {
            endpoint: endpoint.name(),
            status,
            body: text,
        })
    }

    async fn acquire_attempt(
        &self,
        scope: &LearningScope,
        activity: ActivityId,
    ) -> Result<AttemptId, PlatformError> {
        let endpoint = Endpoint::Attempts {
            module: scope.module,
            activity,
        };
        let (status, text) = self.send(endpoint, None).await?;
        let attempt = parse_attempt(&text);
        if attempt == AttemptId::UNKNOWN {
            warn!(%status, body = %text, %activity, "attempt body is not an integer, using 0");
        }
        Ok(attempt)
    }

    async fn submit_answer(
        &self,
        scope: &LearningScope,
        submission: &Submission,
    ) -> Result<Verdict, PlatformError> {
        match self.post_answer(scope, submission).await {
            Err(err) if err.is_session_expired() => {
                warn!(
                    activity = %submission.activity,
                    attempt = %submission.attempt,
                    "module session expired, retrying once with a fresh attempt"
                );
                let attempt = self.acquire_attempt(scope, submission.activity).await?;
                let retry = Submission {
                    attempt,
                    ..submission.clone()
                };
                self.post_answer(scope, &retry).await
            }
            other => other,
        }
    }

    async fn complete_lesson(
        &self,
        scope: &LearningScope,
        activity: ActivityId,
        attempt: AttemptId,
    ) -> Result<(), PlatformError> {
        let endpoint = Endpoint::CompleteLesson {
            activity,
            attempt,
            module: scope.module,
            course: scope.course,
        };
        let (status, text) = self.send(endpoint, None).await?;
        expect_success(endpoint, status, text)?;
        Ok(())
    }
}

fn browser_headers(config: &PlatformConfig) -> Result<HeaderMap, PlatformError> {
    let value = |raw: &str| {
        HeaderValue::from_str(raw).map_err(|e| PlatformError::Config(format!("{raw:?}: {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(ORIGIN, value(&config.origin)?);
    headers.insert(REFERER, value(&config.referer())?);
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(HeaderName::from_static("sec-gpc"), HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-site"),
    );
    Ok(headers)
}

fn expect_success(endpoint: Endpoint, status: StatusCode, body: String) -> Result<String, PlatformError> {
    if status.is_success() {
        return Ok(body);
    }
    Err(PlatformError::HttpStatus {
        endpoint: endpoint.name(),
        status,
        body,
    })
}

fn decode<T: DeserializeOwned>(
    endpoint: Endpoint,
    status: StatusCode,
    body: &str,
) -> Result<T, PlatformError> {
    serde_json::from_str(body).map_err(|_| PlatformError::Decode {
        endpoint: endpoint.name(),
        status,
        body: body.to_string(),
    })
}
