#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod oracle;
pub mod pacing;
pub mod platform;
pub mod session;

pub use catalog::{Catalog, CatalogRow};
pub use error::{OracleError, PacingError, PlatformError, SessionError};
pub use oracle::{AnswerOracle, ChatOracle, LlmModel, OracleConfig};
pub use pacing::{Pacing, Shutdown, ShutdownHandle, SleepOutcome};
pub use platform::{LearningPlatform, PlatformClient, PlatformConfig, Submission, Verdict};
pub use session::{SessionDriver, SessionOptions, SessionReport, StopReason};
