//! Chunked, paced translation of texts through an injected [`Translator`].
//!
//! ## Main Types
//!
//! - [`Translator`] - Translates a single chunk between two languages
//! - [`TranslationMode`] - Chunk limit for the kind of text being translated
//! - [`TranslationReport`] - Translated texts plus the error that stopped the run, if any
//! - [`GoogleTranslator`] - HTTP implementation backed by the public Google endpoint
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use hinglish_sentiment::core::TranslationConfig;
//! use hinglish_sentiment::translate::{translate_texts, GoogleTranslator, TranslationMode};
//!
//! let config = TranslationConfig::default();
//! let translator = GoogleTranslator::new(&config)?;
//! let report = translate_texts(
//!     &translator,
//!     &["यह फोन बहुत अच्छा है"],
//!     TranslationMode::Generic,
//!     &config,
//! );
//! println!("translated {} texts", report.count());
//! # Ok::<(), hinglish_sentiment::core::SentimentError>(())
//! ```

pub mod chunking;
pub mod google;

pub use chunking::split_into_chunks;
pub use google::GoogleTranslator;

use rand::Rng;
use std::time::Duration;

use crate::core::{Result, SentimentError, TranslationConfig};

pub trait Translator {
    fn translate(&self, chunk: &str, source: &str, target: &str) -> Result<String>;
}

impl<T: Translator + ?Sized> Translator for &T {
    fn translate(&self, chunk: &str, source: &str, target: &str) -> Result<String> {
        (**self).translate(chunk, source, target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationMode {
    /// Regular text, up to 5000 characters per call.
    #[default]
    Generic,
    /// Romanised Hindi, which the endpoint only accepts in 160-character pieces.
    Hinglish,
}

impl TranslationMode {
    pub fn max_chunk_len(&self) -> usize {
        match self {
            TranslationMode::Generic => 5000,
            TranslationMode::Hinglish => 160,
        }
    }
}

/// Outcome of [`translate_texts`]. `translated` holds the texts finished before the
/// first failure, in input order.
#[derive(Debug)]
pub struct TranslationReport {
    pub translated: Vec<String>,
    pub error: Option<SentimentError>,
}

impl TranslationReport {
    /// Number of texts translated.
    pub fn count(&self) -> usize {
        self.translated.len()
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Drop partial output and surface the failure, if any.
    pub fn into_result(self) -> Result<Vec<String>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.translated),
        }
    }
}

/// Translate every text, chunk by chunk.
///
/// Each text is split with [`split_into_chunks`] at the mode's limit. A random pause
/// drawn from the config's delay range precedes every chunk call. Translated chunks
/// are joined with a single space. The first failing call stops the run, and the
/// report keeps only the texts completed before it.
pub fn translate_texts<T, S>(
    translator: &T,
    texts: &[S],
    mode: TranslationMode,
    config: &TranslationConfig,
) -> TranslationReport
where
    T: Translator + ?Sized,
    S: AsRef<str>,
{
    let mut translated = Vec::with_capacity(texts.len());
    let error = run(translator, texts, mode, config, &mut translated).err();

    if let Some(err) = &error {
        tracing::warn!(
            translated = translated.len(),
            total = texts.len(),
            error = %err,
            "translation aborted"
        );
    }

    TranslationReport { translated, error }
}

fn run<T, S>(
    translator: &T,
    texts: &[S],
    mode: TranslationMode,
    config: &TranslationConfig,
    translated: &mut Vec<String>,
) -> Result<()>
where
    T: Translator + ?Sized,
    S: AsRef<str>,
{
    config.validate()?;

    let chunked = texts
        .iter()
        .map(|text| split_into_chunks(text.as_ref(), mode.max_chunk_len()))
        .collect::<Result<Vec<_>>>()?;

    let mut rng = rand::rng();
    for (index, chunks) in chunked.iter().enumerate() {
        let mut pieces = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let delay = rng.random_range(config.min_delay_ms..=config.max_delay_ms);
            if delay > 0 {
                std::thread::sleep(Duration::from_millis(delay));
            }
            tracing::debug!(text = index, chars = chunk.chars().count(), "translating chunk");
            pieces.push(translator.translate(chunk, &config.source_lang, &config.target_lang)?);
        }
        translated.push(pieces.join(" "));
    }
    Ok(())
}
