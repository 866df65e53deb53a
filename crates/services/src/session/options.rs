use drill_core::model::Mastery;

use crate::pacing::Pacing;

/// Knobs that select how a session decides, records and stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    /// Consult and fill the answer cache.
    pub use_cache: bool,
    /// Ask the oracle on a cache miss; otherwise pick at random.
    pub use_llm: bool,
    /// Stop once the module's mastery reaches this value.
    pub mastery_cap: Option<Mastery>,
    pub pacing: Pacing,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            use_cache: false,
            use_llm: true,
            mastery_cap: None,
            pacing: Pacing::default(),
        }
    }
}

impl SessionOptions {
    #[must_use]
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    #[must_use]
    pub fn with_llm(mut self, use_llm: bool) -> Self {
        self.use_llm = use_llm;
        self
    }

    #[must_use]
    pub fn with_mastery_cap(mut self, cap: Option<Mastery>) -> Self {
        self.mastery_cap = cap;
        self
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }
}
