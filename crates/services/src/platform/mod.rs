//! Client for the adaptive-learning platform.
//!
//! The platform's state machine is attempt-scoped: fetch a question, acquire
//! an attempt for it, submit an answer, and (when the first answer was wrong)
//! submit a correction against the same attempt before moving on.

mod client;
mod config;
mod wire;

use async_trait::async_trait;

use drill_core::model::{
    ActivityId, AnswerId, AttemptId, CourseId, Exercise, LearningScope, Module, Subject,
};

use crate::error::PlatformError;

pub use client::PlatformClient;
pub use config::{DEFAULT_BASE_URL, DEFAULT_CULTURE, DEFAULT_TIMEOUT, DateWindow, PlatformConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    /// Graded guess, sent to `checkAnswer`.
    First,
    /// Known-correct answer sent after a wrong guess, to `answerAttempt`.
    Correction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub activity: ActivityId,
    pub attempt: AttemptId,
    pub answers: Vec<AnswerId>,
    pub kind: SubmissionKind,
}

impl Submission {
    #[must_use]
    pub fn first(activity: ActivityId, attempt: AttemptId, answer: AnswerId) -> Self {
        Self {
            activity,
            attempt,
            answers: vec![answer],
            kind: SubmissionKind::First,
        }
    }

    #[must_use]
    pub fn correction(activity: ActivityId, attempt: AttemptId, answer: AnswerId) -> Self {
        Self {
            activity,
            attempt,
            answers: vec![answer],
            kind: SubmissionKind::Correction,
        }
    }

    #[must_use]
    pub fn is_correction(&self) -> bool {
        self.kind == SubmissionKind::Correction
    }
}

/// Platform reply to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub right_answer_ids: Vec<AnswerId>,
    /// Attempt the accepted request used. Differs from the submitted one when
    /// an expired module session forced a fresh attempt.
    pub attempt: AttemptId,
}

impl Verdict {
    #[must_use]
    pub fn right_answer(&self) -> Option<AnswerId> {
        self.right_answer_ids.first().copied()
    }
}

/// The fixed sequence of authenticated calls the session driver needs.
#[async_trait]
pub trait LearningPlatform: Send + Sync {
    /// Full subject/course hierarchy available to the learner.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Decode` when the body is not the expected JSON array.
    async fn list_available(&self) -> Result<Vec<Subject>, PlatformError>;

    /// Modules of `course` with the learner's current mastery.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Decode` when the body is not the expected JSON array.
    async fn list_modules(&self, course: CourseId) -> Result<Vec<Module>, PlatformError>;

    /// Next exercise of the scope's module.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::NoMoreActivity` once the learner exhausted the
    /// allowed attempts; this is terminal for the session.
    async fn next_question(&self, scope: &LearningScope) -> Result<Exercise, PlatformError>;

    /// Attempt token for `activity`. Unparsable bodies yield `AttemptId::UNKNOWN`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Http` on transport failures.
    async fn acquire_attempt(
        &self,
        scope: &LearningScope,
        activity: ActivityId,
    ) -> Result<AttemptId, PlatformError>;

    /// Submit a first answer or a correction.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::HttpStatus` for non-success statuses. An expired
    /// module session is retried once with a fresh attempt before failing.
    async fn submit_answer(
        &self,
        scope: &LearningScope,
        submission: &Submission,
    ) -> Result<Verdict, PlatformError>;

    /// Mark a choice-less (theory) exercise as done.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::HttpStatus` for non-success statuses.
    async fn complete_lesson(
        &self,
        scope: &LearningScope,
        activity: ActivityId,
        attempt: AttemptId,
    ) -> Result<(), PlatformError>;
}
