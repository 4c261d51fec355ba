//! HTTP plumbing shared by the model client and the weather server.

use reqwest::{Client, RequestBuilder};

use crate::client::ClientError;
use crate::options::TransportOptions;

/// Build a configured HTTP client from transport options.
pub fn build_http_client(transport: &TransportOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(proxy_url) = &transport.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("Invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }
    if let Some(user_agent) = &transport.user_agent {
        builder = builder.user_agent(user_agent);
    }

    Ok(builder.build()?)
}

/// Add the extra headers from transport options to a request.
pub fn add_extra_headers(mut request: RequestBuilder, transport: &TransportOptions) -> RequestBuilder {
    for (key, value) in &transport.headers {
        request = request.header(key, value);
    }
    request
}

/// Extension trait for RequestBuilder that logs the request body.
pub trait RequestBuilderExt {
    fn json_logged<T: serde::Serialize + ?Sized>(self, json: &T) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn json_logged<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        if let Ok(body) = serde_json::to_string_pretty(json) {
            tracing::debug!("API request body ({} bytes):\n{}", body.len(), body);
        }

        self.json(json)
    }
}

/// Extension trait for Response that logs the response body.
#[async_trait::async_trait]
pub trait ResponseExt {
    /// Get response text and log it. Consumes the response.
    async fn text_logged(self) -> Result<String, reqwest::Error>;

    /// Parse response as JSON and log it. Consumes the response.
    async fn json_logged<T: serde::de::DeserializeOwned>(self) -> Result<T, ClientError>;
}

#[async_trait::async_trait]
impl ResponseExt for reqwest::Response {
    async fn text_logged(self) -> Result<String, reqwest::Error> {
        let text = self.text().await?;
        tracing::debug!("API response ({} bytes):\n{}", text.len(), text);
        Ok(text)
    }

    async fn json_logged<T: serde::de::DeserializeOwned>(self) -> Result<T, ClientError> {
        let text = self.text_logged().await?;
        serde_json::from_str(&text).map_err(ClientError::from)
    }
}
