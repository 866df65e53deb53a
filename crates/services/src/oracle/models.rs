use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Completion models the chat endpoint is known to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LlmModel {
    Allam27B,
    GroqCompound,
    GroqCompoundMini,
    Llama31_8BInstant,
    Llama33_70BVersatile,
    Llama4Maverick17B128EInstruct,
    Llama4Scout17B16EInstruct,
    LlamaGuard4_12B,
    LlamaPromptGuard2_22M,
    LlamaPromptGuard2_86M,
    KimiK2Instruct,
    KimiK2Instruct0905,
    #[default]
    GptOss120B,
    GptOss20B,
    GptOssSafeguard20B,
    Qwen3_32B,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown model {0:?}")]
pub struct UnknownModel(pub String);

impl LlmModel {
    pub const ALL: [LlmModel; 16] = [
        LlmModel::Allam27B,
        LlmModel::GroqCompound,
        LlmModel::GroqCompoundMini,
        LlmModel::Llama31_8BInstant,
        LlmModel::Llama33_70BVersatile,
        LlmModel::Llama4Maverick17B128EInstruct,
        LlmModel::Llama4Scout17B16EInstruct,
        LlmModel::LlamaGuard4_12B,
        LlmModel::LlamaPromptGuard2_22M,
        LlmModel::LlamaPromptGuard2_86M,
        LlmModel::KimiK2Instruct,
        LlmModel::KimiK2Instruct0905,
        LlmModel::GptOss120B,
        LlmModel::GptOss20B,
        LlmModel::GptOssSafeguard20B,
        LlmModel::Qwen3_32B,
    ];

    /// Identifier sent in the `model` field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmModel::Allam27B => "allam-2-7b",
            LlmModel::GroqCompound => "groq/compound",
            LlmModel::GroqCompoundMini => "groq/compound-mini",
            LlmModel::Llama31_8BInstant => "llama-3.1-8b-instant",
            LlmModel::Llama33_70BVersatile => "llama-3.3-70b-versatile",
            LlmModel::Llama4Maverick17B128EInstruct => {
                "meta-llama/llama-4-maverick-17b-128e-instruct"
            }
            LlmModel::Llama4Scout17B16EInstruct => "meta-llama/llama-4-scout-17b-16e-instruct",
            LlmModel::LlamaGuard4_12B => "meta-llama/llama-guard-4-12b",
            LlmModel::LlamaPromptGuard2_22M => "meta-llama/llama-prompt-guard-2-22m",
            LlmModel::LlamaPromptGuard2_86M => "meta-llama/llama-prompt-guard-2-86m",
            LlmModel::KimiK2Instruct => "moonshotai/kimi-k2-instruct",
            LlmModel::KimiK2Instruct0905 => "moonshotai/kimi-k2-instruct-0905",
            LlmModel::GptOss120B => "openai/gpt-oss-120b",
            LlmModel::GptOss20B => "openai/gpt-oss-20b",
            LlmModel::GptOssSafeguard20B => "openai/gpt-oss-safeguard-20b",
            LlmModel::Qwen3_32B => "qwen/qwen3-32b",
        }
    }

    /// Comma-separated list of every known identifier, for error messages.
    #[must_use]
    pub fn known() -> String {
        Self::ALL
            .iter()
            .map(LlmModel::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for LlmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmModel {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}
