//! Endpoint paths and JSON bodies of the learning platform API.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use drill_core::model::{ActivityId, AnswerId, AttemptId, CourseId, Exercise, ModuleId};

use super::config::PlatformConfig;
use super::{Submission, SubmissionKind};

pub(crate) const NO_MORE_ACTIVITY: &str = "NoMoreActivity";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Available,
    Modules {
        course: CourseId,
    },
    NextQuestion {
        module: ModuleId,
        course: CourseId,
    },
    Attempts {
        module: ModuleId,
        activity: ActivityId,
    },
    CheckAnswer,
    AnswerAttempt {
        activity: ActivityId,
        attempt: AttemptId,
    },
    CompleteLesson {
        activity: ActivityId,
        attempt: AttemptId,
        module: ModuleId,
        course: CourseId,
    },
}

impl Endpoint {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Endpoint::Available => "course/available",
            Endpoint::Modules { .. } => "module/availableToLearner",
            Endpoint::NextQuestion { .. } => "adaptiveLearning",
            Endpoint::Attempts { .. } => "attempts",
            Endpoint::CheckAnswer => "checkAnswer",
            Endpoint::AnswerAttempt { .. } => "answerAttempt",
            Endpoint::CompleteLesson { .. } => "completeLesson",
        }
    }

    pub(crate) fn method(&self) -> Method {
        match self {
            Endpoint::Available | Endpoint::Modules { .. } | Endpoint::NextQuestion { .. } => {
                Method::GET
            }
            _ => Method::POST,
        }
    }

    pub(crate) fn path(&self) -> String {
        match self {
            Endpoint::Available => "/learner/course/available".into(),
            Endpoint::Modules { .. } => "/learner/module/availableToLearner".into(),
            Endpoint::NextQuestion { .. } => "/learner/adaptiveLearning".into(),
            Endpoint::Attempts { module, activity } => format!(
                "/learner/adaptiveLearning/modules/{module}/activities/{activity}/attempts"
            ),
            Endpoint::CheckAnswer => "/learner/adaptiveLearning/checkAnswer".into(),
            Endpoint::AnswerAttempt { activity, attempt } => {
                format!("/learner/adaptiveLearning/answerAttempt/{activity}/{attempt}")
            }
            Endpoint::CompleteLesson {
                activity, attempt, ..
            } => format!("/learner/adaptiveLearning/completeLesson/{activity}/{attempt}"),
        }
    }

    /// Query pairs; `culture` is always last.
    pub(crate) fn query(&self, config: &PlatformConfig) -> Vec<(&'static str, String)> {
        let mut pairs = match self {
            Endpoint::Modules { course } => vec![
                ("teacherCourseId", course.to_string()),
                ("dateFrom", config.modules_window.from.clone()),
                ("dateTo", config.modules_window.to.clone()),
            ],
            Endpoint::NextQuestion { module, course }
            | Endpoint::CompleteLesson { module, course, .. } => vec![
                ("moduleId", module.to_string()),
                ("teacherCourseId", course.to_string()),
            ],
            _ => Vec::new(),
        };
        pairs.push(("culture", config.culture.clone()));
        pairs
    }
}

/// Body of both answer endpoints. The correction omits everything but the
/// answers and the module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnswerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<ActivityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_id: Option<AttemptId>,
    pub answer_ids: Vec<AnswerId>,
    pub module_id: ModuleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_course_id: Option<CourseId>,
}

impl AnswerRequest {
    pub(crate) fn build(
        submission: &Submission,
        module: ModuleId,
        course: CourseId,
    ) -> (Endpoint, Self) {
        match submission.kind {
            SubmissionKind::First => (
                Endpoint::CheckAnswer,
                Self {
                    activity_id: Some(submission.activity),
                    attempt_id: (submission.attempt != AttemptId::UNKNOWN)
                        .then_some(submission.attempt),
                    answer_ids: submission.answers.clone(),
                    module_id: module,
                    teacher_course_id: Some(course),
                },
            ),
            SubmissionKind::Correction => (
                Endpoint::AnswerAttempt {
                    activity: submission.activity,
                    attempt: submission.attempt,
                },
                Self {
                    activity_id: None,
                    attempt_id: None,
                    answer_ids: submission.answers.clone(),
                    module_id: module,
                    teacher_course_id: None,
                },
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionResponse {
    #[serde(default)]
    pub activity_status: Option<String>,
    #[serde(default)]
    pub exercise: Option<Exercise>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnswerResponse {
    #[serde(default)]
    pub right_answer_ids: Option<Vec<AnswerId>>,
}

/// The attempt endpoint answers with a bare integer; anything else maps to
/// `AttemptId::UNKNOWN`.
pub(crate) fn parse_attempt(body: &str) -> AttemptId {
    body.trim().parse().unwrap_or(AttemptId::UNKNOWN)
}
