use std::fmt;

use clap::{Parser, ValueEnum};

use drill_core::model::{CourseId, Mastery, ModuleId, SubjectId};
use services::oracle::{DEFAULT_BASE_URL as LLM_BASE_URL, LlmModel};
use services::platform::{DEFAULT_BASE_URL as PLATFORM_BASE_URL, DEFAULT_CULTURE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Works through an adaptive-learning module unattended.
#[derive(Debug, Parser)]
#[command(name = "drill", version, about)]
pub struct Cli {
    /// Bearer token of the learning platform.
    #[arg(long, env = "DRILL_PLATFORM_TOKEN", hide_env_values = true)]
    pub platform_token: String,

    /// API key of the completion endpoint. Required unless --no-llm.
    #[arg(long, env = "DRILL_LLM_TOKEN", hide_env_values = true)]
    pub llm_token: Option<String>,

    #[arg(long, env = "DRILL_PLATFORM_BASE_URL", default_value = PLATFORM_BASE_URL)]
    pub platform_url: String,

    /// Root of the OpenAI-compatible completion API.
    #[arg(long, env = "DRILL_LLM_BASE_URL", default_value = LLM_BASE_URL)]
    pub llm_url: String,

    #[arg(long)]
    pub subject: Option<SubjectId>,

    #[arg(long)]
    pub course: Option<CourseId>,

    #[arg(long)]
    pub module: Option<ModuleId>,

    /// Filter directive, e.g. `info` or `services=debug`. `RUST_LOG` wins when set.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Print subjects, courses and modules with mastery, then exit.
    #[arg(long)]
    pub info: bool,

    /// Lower bound of the pause between questions, in seconds.
    #[arg(long, default_value_t = 5)]
    pub min_delay: u64,

    /// Upper bound of the pause between questions, in seconds.
    #[arg(long, default_value_t = 10)]
    pub max_delay: u64,

    /// Stop once module mastery reaches this fraction, e.g. 0.85.
    #[arg(long, value_parser = parse_mastery)]
    pub till_mastery: Option<Mastery>,

    #[arg(long, default_value_t = LlmModel::default())]
    pub model: LlmModel,

    /// Pick answers at random instead of asking the model.
    #[arg(long)]
    pub no_llm: bool,

    /// SQLite database for the answer cache, e.g. `sqlite:drill.sqlite3`.
    #[arg(long, env = "DRILL_DB")]
    pub db: Option<String>,

    #[arg(long, default_value = DEFAULT_CULTURE)]
    pub culture: String,

    /// Per-request timeout for platform calls, in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Flag combinations clap cannot express on its own.
#[derive(Debug)]
pub enum ArgsError {
    MissingScope,
    MissingLlmToken,
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingScope => {
                write!(f, "--subject, --course and --module are required unless --info")
            }
            ArgsError::MissingLlmToken => {
                write!(f, "--llm-token (or DRILL_LLM_TOKEN) is required unless --no-llm")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn parse_mastery(raw: &str) -> Result<Mastery, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("not a number: {raw:?}"))?;
    Mastery::new(value).map_err(|e| e.to_string())
}
