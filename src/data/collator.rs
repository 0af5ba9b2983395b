//! Batch collation with sub-token label alignment.
//!
//! A [`SentimentDataset`] pairs a list of texts with a [`LabelSource`] chosen once at
//! construction. Indexing it with a batch of positions splits every text into words,
//! tokenizes the pre-split words with padding and truncation, and projects word-level
//! labels onto sub-tokens through the tokenizer's word ids.
//!
//! ```text
//! words:      I     love   BrandX
//! sub-tokens: [CLS] i love brand ##x [SEP] [PAD]
//! labels:     -100  -100 -100 2  2   -100  -100
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use candle_core::{Device, Tensor};
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::words::split_words_owned;
use super::{validate_label, IGNORE_INDEX};
use crate::brands::{brand_names, BrandLocator, BrandSpans};
use crate::core::{CollatorConfig, Result, SentimentError};

/// Where a dataset's training labels come from.
#[derive(Debug, Clone)]
pub enum LabelSource {
    /// Per text: brand name -> sentiment. Brand positions come from the locator.
    Brands(Vec<HashMap<String, i64>>),
    /// Per text: word index -> sentiment.
    WordIndices(Vec<HashMap<usize, i64>>),
    /// Inference. Brands are detected and attached to the batch instead of labels.
    Unlabeled,
}

impl LabelSource {
    /// Number of per-text entries, or `None` for [`LabelSource::Unlabeled`].
    pub fn len(&self) -> Option<usize> {
        match self {
            LabelSource::Brands(labels) => Some(labels.len()),
            LabelSource::WordIndices(labels) => Some(labels.len()),
            LabelSource::Unlabeled => None,
        }
    }

    pub fn is_labeled(&self) -> bool {
        !matches!(self, LabelSource::Unlabeled)
    }
}

/// Labels for the texts of one batch, in batch order.
#[derive(Debug, Clone)]
pub enum BatchLabels<'a> {
    Brands(Vec<&'a HashMap<String, i64>>),
    WordIndices(Vec<&'a HashMap<usize, i64>>),
    Unlabeled,
}

/// A padded batch ready for the classifier.
#[derive(Debug, Clone)]
pub struct TokenizedBatch {
    /// `(batch, seq_len)` u32
    pub input_ids: Tensor,
    /// `(batch, seq_len)` u32, 1 for real tokens and 0 for padding
    pub attention_mask: Tensor,
    /// `(batch, seq_len)` u32
    pub token_type_ids: Option<Tensor>,
    /// `(batch, seq_len)` i64, present for labeled sources only
    pub labels: Option<Tensor>,
    /// Brands detected per text, present for unlabeled sources only
    pub brands: Option<Vec<Vec<String>>>,
    /// Word-index spans behind `brands`, present for unlabeled sources only
    pub brand_spans: Option<Vec<BrandSpans>>,
    /// Source word index of every sub-token position, `None` for special and padding tokens
    pub word_ids: Vec<Vec<Option<u32>>>,
}

impl TokenizedBatch {
    pub fn batch_size(&self) -> usize {
        self.word_ids.len()
    }

    pub fn seq_len(&self) -> usize {
        self.word_ids.first().map_or(0, Vec::len)
    }
}

/// Tokenizes pre-split words and aligns labels. Owns a tokenizer configured for
/// longest-in-batch padding and truncation.
#[derive(Clone)]
pub struct BatchCollator {
    tokenizer: Tokenizer,
    locator: Arc<dyn BrandLocator + Send + Sync>,
    device: Device,
}

impl BatchCollator {
    pub fn new(
        mut tokenizer: Tokenizer,
        locator: Arc<dyn BrandLocator + Send + Sync>,
        device: Device,
        config: &CollatorConfig,
    ) -> Result<Self> {
        let pad_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .unwrap_or(0);
        let pad_token = tokenizer
            .get_padding()
            .map(|p| p.pad_token.clone())
            .or_else(|| tokenizer.id_to_token(pad_id))
            .unwrap_or_else(|| "[PAD]".to_string());

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id,
            pad_token,
            ..Default::default()
        }));
        tokenizer.with_truncation(Some(TruncationParams {
            max_length: config.max_length,
            ..Default::default()
        }))?;

        Ok(Self {
            tokenizer,
            locator,
            device,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn locator(&self) -> &(dyn BrandLocator + Send + Sync) {
        self.locator.as_ref()
    }

    /// Build one batch from raw texts and the labels aligned with them.
    pub fn collate(&self, texts: &[&str], labels: BatchLabels<'_>) -> Result<TokenizedBatch> {
        let words: Vec<Vec<String>> = texts.iter().map(|t| split_words_owned(t)).collect();

        let word_labels = match &labels {
            BatchLabels::Brands(brand_labels) => {
                check_count(brand_labels.len(), texts.len())?;
                let spans = self.locator.locate(texts);
                let word_labels = spans
                    .iter()
                    .zip(brand_labels)
                    .map(|(spans, labels)| brand_word_labels(spans, labels))
                    .collect::<Result<Vec<_>>>()?;
                Some(word_labels)
            }
            BatchLabels::WordIndices(index_labels) => {
                check_count(index_labels.len(), texts.len())?;
                let word_labels = index_labels
                    .iter()
                    .zip(&words)
                    .enumerate()
                    .map(|(text, (labels, words))| checked_word_labels(text, labels, words.len()))
                    .collect::<Result<Vec<_>>>()?;
                Some(word_labels)
            }
            BatchLabels::Unlabeled => None,
        };

        let encodings = self.tokenizer.encode_batch(words, true)?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map_or(0, Encoding::len);

        let input_ids = self.stack(&encodings, Encoding::get_ids, batch_size, seq_len)?;
        let attention_mask =
            self.stack(&encodings, Encoding::get_attention_mask, batch_size, seq_len)?;
        let token_type_ids = self.stack(&encodings, Encoding::get_type_ids, batch_size, seq_len)?;

        let labels = match word_labels {
            Some(word_labels) => {
                let flat: Vec<i64> = encodings
                    .iter()
                    .zip(&word_labels)
                    .flat_map(|(encoding, labels)| project_labels(encoding.get_word_ids(), labels))
                    .collect();
                Some(Tensor::from_vec(flat, (batch_size, seq_len), &self.device)?)
            }
            None => None,
        };

        let brand_spans = if labels.is_some() {
            None
        } else {
            Some(self.locator.locate(texts))
        };
        let brands = brand_spans
            .as_ref()
            .map(|spans| spans.iter().map(brand_names).collect());

        let word_ids = encodings
            .iter()
            .map(|e| e.get_word_ids().to_vec())
            .collect();

        tracing::debug!(
            batch_size,
            seq_len,
            labeled = labels.is_some(),
            "collated batch"
        );

        Ok(TokenizedBatch {
            input_ids,
            attention_mask,
            token_type_ids: Some(token_type_ids),
            labels,
            brands,
            brand_spans,
            word_ids,
        })
    }

    fn stack(
        &self,
        encodings: &[Encoding],
        field: fn(&Encoding) -> &[u32],
        batch_size: usize,
        seq_len: usize,
    ) -> Result<Tensor> {
        let flat: Vec<u32> = encodings
            .iter()
            .flat_map(|e| field(e).iter().copied())
            .collect();
        Ok(Tensor::from_vec(flat, (batch_size, seq_len), &self.device)?)
    }
}

fn check_count(labels: usize, texts: usize) -> Result<()> {
    if labels != texts {
        return Err(SentimentError::LabelCountMismatch { labels, texts });
    }
    Ok(())
}

/// Word index -> label for every word covered by a brand span. Brands without a
/// label entry mark their words with [`IGNORE_INDEX`].
fn brand_word_labels(
    spans: &BrandSpans,
    brand_labels: &HashMap<String, i64>,
) -> Result<HashMap<usize, i64>> {
    let mut word_labels = HashMap::new();
    for (brand, indices) in spans {
        let label = match brand_labels.get(brand) {
            Some(&label) => validate_label(label)?,
            None => IGNORE_INDEX,
        };
        for &index in indices {
            word_labels.insert(index, label);
        }
    }
    Ok(word_labels)
}

fn checked_word_labels(
    text: usize,
    labels: &HashMap<usize, i64>,
    words: usize,
) -> Result<HashMap<usize, i64>> {
    labels
        .iter()
        .map(|(&index, &label)| {
            if index >= words {
                return Err(SentimentError::WordIndexOutOfRange { text, index, words });
            }
            Ok((index, validate_label(label)?))
        })
        .collect()
}

/// One label per sub-token: the label of its source word, or [`IGNORE_INDEX`].
fn project_labels(word_ids: &[Option<u32>], word_labels: &HashMap<usize, i64>) -> Vec<i64> {
    word_ids
        .iter()
        .map(|&word| {
            word.and_then(|w| word_labels.get(&(w as usize)).copied())
                .unwrap_or(IGNORE_INDEX)
        })
        .collect()
}

/// Texts plus the label source they were annotated with.
pub struct SentimentDataset {
    texts: Vec<String>,
    labels: LabelSource,
    collator: BatchCollator,
}

impl SentimentDataset {
    pub fn new(texts: Vec<String>, labels: LabelSource, collator: BatchCollator) -> Result<Self> {
        if let Some(count) = labels.len() {
            check_count(count, texts.len())?;
        }
        Ok(Self {
            texts,
            labels,
            collator,
        })
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn label_source(&self) -> &LabelSource {
        &self.labels
    }

    pub fn collator(&self) -> &BatchCollator {
        &self.collator
    }

    /// Collate the texts at `indices`, in that order, into one batch.
    pub fn batch(&self, indices: &[usize]) -> Result<TokenizedBatch> {
        let len = self.texts.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(SentimentError::IndexOutOfRange { index, len });
        }

        let texts: Vec<&str> = indices.iter().map(|&i| self.texts[i].as_str()).collect();
        let labels = match &self.labels {
            LabelSource::Brands(all) => {
                BatchLabels::Brands(indices.iter().map(|&i| &all[i]).collect())
            }
            LabelSource::WordIndices(all) => {
                BatchLabels::WordIndices(indices.iter().map(|&i| &all[i]).collect())
            }
            LabelSource::Unlabeled => BatchLabels::Unlabeled,
        };

        self.collator.collate(&texts, labels)
    }
}
