mod catalog;
mod exercise;
mod ids;
mod session;

pub use catalog::{Course, Mastery, MasteryError, Module, Subject, mastery_of};
pub use exercise::{Exercise, ExercisePrompt, PossibleAnswer, PromptAnswer};
pub use ids::{ActivityId, AnswerId, AttemptId, CourseId, ModuleId, ParseIdError, SubjectId};
pub use session::{LearningScope, QuestionKey, SessionStats};
