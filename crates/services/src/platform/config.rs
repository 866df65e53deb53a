use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.plario.ru";
pub const DEFAULT_ORIGIN: &str = "https://my.plario.ru";
pub const DEFAULT_CULTURE: &str = "ru";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Date window the module listing is queried with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub from: String,
    pub to: String,
}

impl Default for DateWindow {
    fn default() -> Self {
        Self {
            from: "2025-11-30T21:00:00.000Z".into(),
            to: "2025-12-31T20:59:59.999Z".into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PlatformConfig {
    pub base_url: String,
    /// Browser origin the requests claim; `Referer` is derived from it.
    pub origin: String,
    pub culture: String,
    pub token: String,
    pub modules_window: DateWindow,
    /// Per-request timeout; the platform API has none of its own.
    pub timeout: Duration,
}

impl PlatformConfig {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            origin: DEFAULT_ORIGIN.into(),
            culture: DEFAULT_CULTURE.into(),
            token: token.into(),
            modules_window: DateWindow::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = culture.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    pub(crate) fn referer(&self) -> String {
        format!("{}/", self.origin.trim_end_matches('/'))
    }
}
