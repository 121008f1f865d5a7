//! Cached, best-effort translation of cleaned script text.
//!
//! Each text gets at most one backend attempt. A failure is never fatal:
//! the caller falls back to the original text so output files stay intact.

use crate::backend::TranslationBackend;
use crate::cache::TranslationCache;
use crate::codec;
use crate::error::TranslationError;
use std::sync::Arc;
use std::time::Duration;

/// Result of translating one cleaned line.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing to translate (empty or placeholders only).
    Unchanged,
    /// Served from the translation cache.
    Cached(String),
    /// Fresh translation from the backend, now cached.
    Translated(String),
    /// Backend call failed; the original text should be used.
    Failed(TranslationError),
}

impl Outcome {
    /// Resolves the outcome to the text to emit for `original`.
    pub fn text(self, original: &str) -> String {
        match self {
            Outcome::Cached(text) | Outcome::Translated(text) => text,
            Outcome::Unchanged | Outcome::Failed(_) => original.to_string(),
        }
    }
}

/// Translator combining a backend with the shared cache.
pub struct Translator {
    /// Backend doing the actual work.
    backend: Arc<dyn TranslationBackend>,
    /// Shared translation memory.
    cache: Arc<TranslationCache>,
    /// Source language code ("auto" for detection).
    source_language: String,
    /// Target language code.
    target_language: String,
    /// Upper bound for one backend call.
    timeout: Duration,
}

impl Translator {
    /// Create a new Translator.
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        cache: Arc<TranslationCache>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            cache,
            source_language: source_language.into(),
            target_language: target_language.into(),
            timeout,
        }
    }

    /// The shared cache this translator reads and fills.
    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    /// Name of the underlying backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Translate cleaned text.
    ///
    /// The cache lock is only held for the lookup and the store; the backend
    /// call runs without it, so two workers may translate the same text
    /// concurrently and both store the same entry.
    pub async fn translate(&self, text: &str) -> Outcome {
        if codec::is_placeholder_only(text) {
            return Outcome::Unchanged;
        }

        if let Some(cached) = self.cache.get(text) {
            return Outcome::Cached(cached);
        }

        match self.call_backend(text).await {
            Ok(translated) => {
                self.cache.put(text.to_string(), translated.clone());
                Outcome::Translated(translated)
            }
            Err(e) => Outcome::Failed(e),
        }
    }

    /// Translate cleaned text, returning the original on any failure.
    pub async fn translate_or_original(&self, text: &str) -> String {
        self.translate(text).await.text(text)
    }

    /// Single, time-bounded backend attempt.
    async fn call_backend(&self, text: &str) -> Result<String, TranslationError> {
        let call = self
            .backend
            .translate(text, &self.source_language, &self.target_language);

        let translated = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| TranslationError::Timeout(self.timeout))??;

        if translated.trim().is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        Ok(translated)
    }
}
