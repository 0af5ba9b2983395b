pub mod config;
pub mod error;

pub use config::{CollatorConfig, LanguageConfig, PipelineConfig, TranslationConfig};
pub use error::{Result, SentimentError};
