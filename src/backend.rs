//! Translation backends.
//!
//! The pipeline only needs "text in, translated text out, may fail". The
//! [`TranslationBackend`] trait captures that contract; [`GoogleBackend`]
//! implements it against the Google Translate mobile page.

use crate::config::TranslationConfig;
use crate::error::TranslationError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Longest text the web endpoint accepts in one request.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Selector for the translated text on the mobile page.
static RESULT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.result-container").expect("Invalid RESULT_SELECTOR")
});

/// Something that can translate a piece of text.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Human-readable backend name for log output.
    fn name(&self) -> &'static str;

    /// Translates `text` from `source` (may be "auto") into `target`.
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError>;
}

/// Backend scraping `translate.google.com/m`.
pub struct GoogleBackend {
    client: Client,
    endpoint: Url,
}

impl GoogleBackend {
    /// Creates a backend from translation settings.
    pub fn new(config: &TranslationConfig) -> Result<Self, TranslationError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| TranslationError::InvalidConfig(format!("{}: {}", config.endpoint, e)))?;

        Ok(Self {
            client: create_http_client(config.timeout())?,
            endpoint,
        })
    }

    /// Builds the request URL for one text.
    fn request_url(&self, text: &str, source: &str, target: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("sl", source)
            .append_pair("tl", target)
            .append_pair("q", text);
        url
    }
}

#[async_trait]
impl TranslationBackend for GoogleBackend {
    fn name(&self) -> &'static str {
        "Google Translate"
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        let length = text.chars().count();
        if length > MAX_TEXT_CHARS {
            return Err(TranslationError::TooLong {
                length,
                limit: MAX_TEXT_CHARS,
            });
        }

        let url = self.request_url(text, source, target);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let page = response.text().await?;
        parse_result_page(&page)
    }
}

/// Extracts the translation from the mobile result page.
fn parse_result_page(page: &str) -> Result<String, TranslationError> {
    let doc = Html::parse_document(page);
    let element = doc.select(&RESULT_SELECTOR).next().ok_or_else(|| {
        TranslationError::ParseError("result container not found".to_string())
    })?;

    let translated = element.text().collect::<String>().trim().to_string();
    if translated.is_empty() {
        return Err(TranslationError::EmptyResponse);
    }
    Ok(translated)
}

/// Common HTTP client configuration for the web backend.
pub fn create_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
        .timeout(timeout)
        .build()
}
