//! Brand-level sentiment classification for Hinglish (Hindi-English mixed) text.
//!
//! - [`data`] splits texts into words, aligns brand or word labels with sub-tokens
//!   and batches datasets
//! - [`models`] holds the BERT encoder and the per-token classification head
//! - [`pipelines::brand_sentiment`] runs inference end to end and reports one
//!   sentiment per brand mention
//! - [`language`] and [`translate`] cover language triage and chunked translation

pub mod brands;
pub mod core;
pub mod data;
pub mod language;
pub mod loaders;
pub mod models;
pub mod pipelines;
pub mod translate;

// Re-export core types
pub use crate::core::{PipelineConfig, Result, SentimentError};

pub use brands::{BrandLexicon, BrandLocator, BrandSpans};
pub use data::{BatchCollator, BatchLabels, DataLoader, LabelSource, SentimentDataset, TokenizedBatch};
pub use language::{
    classify_language, detect_languages, Detection, Language, LanguageDetector, WhatlangDetector,
};
pub use models::{BertModel, ForwardMode, TokenClassifier};
pub use pipelines::brand_sentiment::{BrandSentiment, BrandSentimentPipeline, BrandSentimentPipelineBuilder};
pub use translate::{translate_texts, GoogleTranslator, TranslationMode, TranslationReport, Translator};
