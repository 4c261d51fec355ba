//! Anthropic provider factory.

pub use crate::api::anthropic::{AnthropicClient, AnthropicModel};
use crate::api::anthropic::ANTHROPIC_BASE_URL;
use crate::options::{ModelOptions, TransportOptions};
use crate::providers::Provider;

pub struct Anthropic;

impl Anthropic {
    /// Create a client against a non-default endpoint, e.g. a proxy or a test server.
    pub fn create_with_base_url(
        api_key: String,
        base_url: String,
        model_options: ModelOptions<AnthropicModel>,
        transport_options: TransportOptions,
    ) -> AnthropicClient {
        AnthropicClient::new(api_key, base_url, model_options, transport_options)
    }
}

impl Provider for Anthropic {
    type Client = AnthropicClient;

    fn create(api_key: String) -> Self::Client {
        Self::create_with_options(api_key, ModelOptions::default(), TransportOptions::default())
    }

    fn create_with_options(
        api_key: String,
        model_options: ModelOptions<AnthropicModel>,
        transport_options: TransportOptions,
    ) -> Self::Client {
        AnthropicClient::new(
            api_key,
            ANTHROPIC_BASE_URL.to_string(),
            model_options,
            transport_options,
        )
    }
}
