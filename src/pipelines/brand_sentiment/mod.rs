//! Brand-level sentiment over Hinglish social text.
//!
//! Texts are split into words, the configured [`BrandLocator`](crate::brands::BrandLocator)
//! finds the brands they mention, and a token classifier scores every sub-token.
//! Each brand mention gets the class with the highest mean probability over its
//! sub-tokens.
//!
//! ## Main Types
//!
//! - [`BrandSentimentPipeline`] - Runs inference and aggregates per-brand results
//! - [`BrandSentimentPipelineBuilder`] - Loads the checkpoint and tokenizer, selects the device
//! - [`BrandSentiment`] - Label and score for one brand in one text
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hinglish_sentiment::brands::BrandLexicon;
//! use hinglish_sentiment::pipelines::brand_sentiment::*;
//! use hinglish_sentiment::pipelines::utils::DeviceSelectable;
//!
//! let lexicon = BrandLexicon::new().with_aliases("Jio", &["jio", "reliance jio"]);
//! let pipeline = BrandSentimentPipelineBuilder::hinglish(Arc::new(lexicon))
//!     .cpu()
//!     .build()?;
//!
//! for brand in &pipeline.predict(&["Jio ka network bahut slow hai"])?[0] {
//!     println!("{}: {} ({:.2})", brand.brand, brand.label_name, brand.score);
//! }
//! # anyhow::Ok(())
//! ```

pub mod builder;
pub mod pipeline;

pub use builder::BrandSentimentPipelineBuilder;
pub use pipeline::{BrandSentiment, BrandSentimentPipeline};
