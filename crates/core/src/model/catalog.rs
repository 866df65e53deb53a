use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{CourseId, ModuleId, SubjectId};

//
// ─── MASTERY ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MasteryError {
    #[error("mastery must be a fraction between 0 and 1, got {0}")]
    OutOfRange(f64),
}

/// Platform-computed proficiency for a module, as a fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mastery(f64);

impl Mastery {
    /// Validated constructor for operator-supplied thresholds.
    ///
    /// # Errors
    ///
    /// Returns `MasteryError::OutOfRange` for values outside `[0, 1]` or NaN.
    pub fn new(value: f64) -> Result<Self, MasteryError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(MasteryError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        self.0 * 100.0
    }

    /// True once this mastery has reached `cap`.
    #[must_use]
    pub fn reaches(&self, cap: Mastery) -> bool {
        self.0 >= cap.0
    }
}

impl fmt::Display for Mastery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ({:.2}%)", self.0, self.percent())
    }
}

//
// ─── HIERARCHY ─────────────────────────────────────────────────────────────────
//

/// Course as listed under a subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    #[serde(default)]
    pub name: String,
}

/// Subject with its ordered courses, as returned by the availability listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub courses: Vec<Course>,
}

impl Subject {
    #[must_use]
    pub fn course(&self, id: CourseId) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }
}

/// Module of a course, carrying the learner's current mastery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mastery: Mastery,
}

/// Finds the mastery of `id` in a module listing.
#[must_use]
pub fn mastery_of(modules: &[Module], id: ModuleId) -> Option<Mastery> {
    modules.iter().find(|m| m.id == id).map(|m| m.mastery)
}

pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
