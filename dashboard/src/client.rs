use crate::errors::{Error, Result};
use crate::model::Reading;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Endpoint polled when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/leituras";

/// Fetches the full reading list from a single endpoint.
#[derive(Debug, Clone)]
pub struct ReadingsClient {
    client: Client,
    endpoint: String,
}

impl ReadingsClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(endpoint, client)
    }

    /// Uses a preconfigured reqwest client.
    pub fn with_client(endpoint: &str, client: Client) -> Result<Self> {
        let endpoint = endpoint.trim().to_string();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::InvalidEndpoint(format!(
                "URL must start with http:// or https://, got: {}",
                endpoint
            )));
        }

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// GETs the endpoint and decodes the reading list.
    ///
    /// Transport failures, non-2xx statuses and malformed bodies are all
    /// errors. A well-formed body that is not an array yields no readings.
    pub async fn fetch(&self) -> Result<Vec<Reading>> {
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_readings(&body)
    }
}

pub fn parse_readings(body: &[u8]) -> Result<Vec<Reading>> {
    let value: Value = serde_json::from_slice(body)?;
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        other => {
            debug!(
                "Endpoint returned non-array JSON ({}), treating as no readings",
                json_kind(&other)
            );
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
