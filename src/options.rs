//! Model and transport configuration.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;
use std::time::Duration;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Output token cap used when none is configured.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Model behavior parameters shared by all providers, plus a provider-specific part.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOptions<T> {
    /// Model identifier, e.g. `claude-3-5-sonnet-20241022`.
    pub model: String,

    /// System prompt sent alongside the transcript.
    pub system: Option<String>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Maximum output tokens per model call.
    pub max_tokens: u32,

    /// Provider-specific model options.
    pub provider: T,
}

impl<T: Default> ModelOptions<T> {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            temperature: None,
            top_p: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            provider: T::default(),
        }
    }
}

impl<T: Default> Default for ModelOptions<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl<T> ModelOptions<T> {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// How requests are sent over the network.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Request timeout. If None, the HTTP client has no timeout.
    pub timeout: Option<Duration>,
    /// HTTP proxy URL.
    pub proxy: Option<String>,
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Additional headers sent with every request.
    pub headers: HashMap<String, String>,
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy = Some(proxy_url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}
