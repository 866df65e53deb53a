use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::catalog::null_as_empty;
use crate::model::ids::{ActivityId, AnswerId};
use crate::text::strip_markup;

/// One answer choice as delivered by the platform.
///
/// `is_correct` is decoded for completeness but never used to pick an answer;
/// the platform does not reliably populate it before submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PossibleAnswer {
    pub answer_id: AnswerId,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub text: String,
}

/// A single question instance, fetched fresh for every iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub activity_id: ActivityId,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub possible_answers: Vec<PossibleAnswer>,
}

impl Exercise {
    /// Exercises without choices are theory lessons that only need completing.
    #[must_use]
    pub fn is_lesson(&self) -> bool {
        self.possible_answers.is_empty()
    }

    #[must_use]
    pub fn offers(&self, answer: AnswerId) -> bool {
        self.possible_answers.iter().any(|a| a.answer_id == answer)
    }

    #[must_use]
    pub fn answer_ids(&self) -> Vec<AnswerId> {
        self.possible_answers.iter().map(|a| a.answer_id).collect()
    }

    /// Markup-free view of the exercise used for prompts and the answer cache.
    #[must_use]
    pub fn prompt(&self) -> ExercisePrompt {
        ExercisePrompt {
            question: strip_markup(&self.content),
            answers: self
                .possible_answers
                .iter()
                .map(|a| PromptAnswer {
                    id: a.answer_id,
                    answer: strip_markup(&a.text),
                })
                .collect(),
        }
    }
}

/// Compact JSON: `{"question":"…","answers":[{"id":1,"answer":"…"}]}`.
impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.prompt()).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExercisePrompt {
    pub question: String,
    pub answers: Vec<PromptAnswer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptAnswer {
    pub id: AnswerId,
    pub answer: String,
}
