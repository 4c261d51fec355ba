//! Environment-driven configuration for the client binary.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::api::anthropic::{AnthropicClient, AnthropicModel, ANTHROPIC_BASE_URL};
use crate::client::ClientError;
use crate::options::{ModelOptions, TransportOptions, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::providers::Anthropic;

/// Agent round limit used when none is configured.
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// Settings for connecting to the model provider and bounding the agent loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub max_rounds: usize,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Read the configuration from the process environment.
    ///
    /// `ANTHROPIC_API_KEY` is required; `ANTHROPIC_BASE_URL`, `TETHER_MODEL`,
    /// `TETHER_MAX_TOKENS`, `TETHER_MAX_ROUNDS` and `TETHER_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("ANTHROPIC_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ClientError::Config("ANTHROPIC_API_KEY must be set".to_string()))?;

        Ok(Self {
            api_key,
            base_url: lookup("ANTHROPIC_BASE_URL").unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string()),
            model: lookup("TETHER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: parse_var(&lookup, "TETHER_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS),
            max_rounds: parse_var(&lookup, "TETHER_MAX_ROUNDS")?.unwrap_or(DEFAULT_MAX_ROUNDS),
            timeout: parse_var(&lookup, "TETHER_TIMEOUT_SECS")?.map(Duration::from_secs),
        })
    }

    pub fn model_options(&self) -> ModelOptions<AnthropicModel> {
        ModelOptions::new(self.model.clone()).with_max_tokens(self.max_tokens)
    }

    pub fn transport_options(&self) -> TransportOptions {
        let options = TransportOptions::new();
        match self.timeout {
            Some(timeout) => options.with_timeout(timeout),
            None => options,
        }
    }

    /// Create the Anthropic client described by this configuration.
    pub fn client(&self) -> AnthropicClient {
        Anthropic::create_with_base_url(
            self.api_key.clone(),
            self.base_url.clone(),
            self.model_options(),
            self.transport_options(),
        )
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ClientError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ClientError::Config(format!("Invalid {}={}: {}", key, raw, e))),
        None => Ok(None),
    }
}
