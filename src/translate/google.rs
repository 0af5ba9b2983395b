//! Client for the public Google Translate `translate_a/single` endpoint.

use serde_json::Value;

use super::Translator;
use crate::core::{Result, SentimentError, TranslationConfig};

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

pub struct GoogleTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl GoogleTranslator {
    /// Build a client honouring the config's request timeout.
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("hinglish-sentiment/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, chunk: &str, source: &str, target: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", chunk),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SentimentError::Translation(format!(
                "endpoint returned {status}"
            )));
        }

        let body: Value = response.json()?;
        parse_response(&body)
    }
}

/// Concatenate the translated segments of a `translate_a/single` response.
///
/// The body is a nested array whose first element lists sentence segments, each
/// starting with its translation: `[[["Hello", "नमस्ते", ...], ...], ...]`.
pub fn parse_response(body: &Value) -> Result<String> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| SentimentError::Translation("missing segment list in response".into()))?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}
