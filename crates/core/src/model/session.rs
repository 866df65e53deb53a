use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::{ActivityId, CourseId, ModuleId, SubjectId};

/// The subject/course/module triple a session works through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LearningScope {
    pub subject: SubjectId,
    pub course: CourseId,
    pub module: ModuleId,
}

impl LearningScope {
    #[must_use]
    pub fn new(subject: SubjectId, course: CourseId, module: ModuleId) -> Self {
        Self {
            subject,
            course,
            module,
        }
    }

    /// Cache key for `question` within this scope.
    #[must_use]
    pub fn question_key(&self, question: ActivityId) -> QuestionKey {
        QuestionKey {
            question,
            subject: self.subject,
            course: self.course,
            module: self.module,
        }
    }
}

/// Composite key of the answer cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionKey {
    pub question: ActivityId,
    pub subject: SubjectId,
    pub course: CourseId,
    pub module: ModuleId,
}

/// Running counters for one process lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// First attempts that matched the platform's answer.
    pub correct: u32,
    /// First attempts that needed a correction.
    pub wrong: u32,
    pub lessons_completed: u32,
    pub cache_hits: u32,
}

impl SessionStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_first_attempt(&mut self, was_correct: bool) {
        if was_correct {
            self.correct += 1;
        } else {
            self.wrong += 1;
        }
    }

    pub fn record_lesson(&mut self) {
        self.lessons_completed += 1;
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    #[must_use]
    pub fn total_answered(&self) -> u32 {
        self.correct + self.wrong
    }

    /// Share of first attempts that were right, or `None` before any answer.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total_answered();
        if total == 0 {
            return None;
        }
        Some(f64::from(self.correct) / f64::from(total))
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "correct={} wrong={} lessons={} cache_hits={}",
            self.correct, self.wrong, self.lessons_completed, self.cache_hits
        )
    }
}
