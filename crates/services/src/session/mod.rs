//! One driver loop for every combination of cache, oracle and mastery cap.

mod driver;
mod options;

pub use driver::{SessionDriver, SessionReport, StopReason};
pub use options::SessionOptions;
