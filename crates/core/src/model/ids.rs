use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! platform_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "`")]
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name),
                        raw: s.to_string(),
                    })
            }
        }
    };
}

/// Error returned when a string cannot be parsed into one of the id types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {raw:?}")]
pub struct ParseIdError {
    pub kind: &'static str,
    pub raw: String,
}

platform_id!(
    /// Top-level learning domain, e.g. "Higher Mathematics".
    SubjectId
);
platform_id!(
    /// Instructor-run course within a subject.
    CourseId
);
platform_id!(
    /// Thematic question set within a course.
    ModuleId
);
platform_id!(
    /// One question instance. Doubles as the question id in the answer cache.
    ActivityId
);
platform_id!(
    /// One answer choice of an exercise.
    AnswerId
);
platform_id!(
    /// Token scoped to a single activity, required before submitting.
    AttemptId
);

impl AttemptId {
    /// Placeholder token used when the platform returns an unparsable attempt body.
    pub const UNKNOWN: Self = Self(0);
}
