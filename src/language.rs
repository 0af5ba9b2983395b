//! Mapping language-detector output onto English, Hindi and Hinglish.
//!
//! The detector itself is an injected collaborator implementing [`LanguageDetector`];
//! [`WhatlangDetector`] is the bundled one.
//! Classification combines its language code and confidence with the dominant
//! Unicode script of the text, so romanised Hindi that a detector labels as
//! low-confidence English ends up as Hinglish, and Devanagari text mislabelled as
//! English ends up as Hindi.

use crate::core::LanguageConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Hindi,
    Hinglish,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Hinglish => "Hinglish",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Devanagari,
    Latin,
    /// No alphabetic characters, or another script dominates.
    Other,
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{00C0}'..='\u{024F}').contains(&c)
}

/// Dominant script among the alphabetic characters of `text`. Ties go to Devanagari.
pub fn detect_script(text: &str) -> Script {
    let (mut devanagari, mut latin, mut other) = (0usize, 0usize, 0usize);
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        if is_devanagari(c) {
            devanagari += 1;
        } else if is_latin(c) {
            latin += 1;
        } else {
            other += 1;
        }
    }

    if devanagari == 0 && latin == 0 {
        Script::Other
    } else if devanagari >= latin && devanagari >= other {
        Script::Devanagari
    } else if latin >= other {
        Script::Latin
    } else {
        Script::Other
    }
}

/// Output of a language detector: an ISO 639-1 code and a confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub code: String,
    pub confidence: f64,
}

impl Detection {
    pub fn new(code: impl Into<String>, confidence: f64) -> Self {
        Self {
            code: code.into(),
            confidence,
        }
    }
}

pub trait LanguageDetector {
    fn detect(&self, text: &str) -> Detection;
}

impl<F> LanguageDetector for F
where
    F: Fn(&str) -> Detection,
{
    fn detect(&self, text: &str) -> Detection {
        self(text)
    }
}

/// Statistical trigram detector backed by `whatlang`.
///
/// Codes are ISO 639-1 for English and Hindi and the ISO 639-3 code otherwise.
/// Text the detector cannot place maps to `"und"` with zero confidence.
pub struct WhatlangDetector {
    inner: whatlang::Detector,
}

impl WhatlangDetector {
    pub fn new() -> Self {
        Self {
            inner: whatlang::Detector::new(),
        }
    }

    /// Restrict detection to `langs`.
    pub fn with_allowlist(langs: Vec<whatlang::Lang>) -> Self {
        Self {
            inner: whatlang::Detector::with_allowlist(langs),
        }
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Detection {
        match self.inner.detect(text) {
            Some(info) => {
                let code = match info.lang() {
                    whatlang::Lang::Eng => "en",
                    whatlang::Lang::Hin => "hi",
                    other => other.code(),
                };
                Detection::new(code, info.confidence())
            }
            None => Detection::new("und", 0.0),
        }
    }
}

fn truncate_chars(text: &str, limit: Option<usize>) -> &str {
    match limit.and_then(|n| text.char_indices().nth(n)) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Classify a single text.
///
/// Anything the detector reports as neither English nor Hindi is Hinglish, as is
/// non-Devanagari text detected as English below `config.english_confidence`.
/// Devanagari text detected as English is Hindi.
pub fn classify_language<D>(detector: &D, text: &str, config: &LanguageConfig) -> Language
where
    D: LanguageDetector + ?Sized,
{
    let text = truncate_chars(text, config.truncate_chars);
    let detection = detector.detect(text);
    let script = detect_script(text);

    match detection.code.as_str() {
        "en" if script == Script::Devanagari => Language::Hindi,
        "en" if detection.confidence < config.english_confidence => Language::Hinglish,
        "en" => Language::English,
        "hi" => Language::Hindi,
        _ => Language::Hinglish,
    }
}

/// Classify every text in `texts`, preserving order.
pub fn detect_languages<D, S>(detector: &D, texts: &[S], config: &LanguageConfig) -> Vec<Language>
where
    D: LanguageDetector + ?Sized,
    S: AsRef<str>,
{
    let languages: Vec<Language> = texts
        .iter()
        .map(|text| classify_language(detector, text.as_ref(), config))
        .collect();
    tracing::debug!(texts = texts.len(), "classified languages");
    languages
}
