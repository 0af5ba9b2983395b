use std::collections::BTreeSet;

use candle_core::D;
use candle_nn::ops::softmax;

use crate::core::Result;
use crate::data::{BatchCollator, BatchLabels, TokenizedBatch};
use crate::models::{BertModel, ClassifierOutput, Encoder, ForwardMode, TokenClassifier};

/// Sentiment of one brand mentioned in a text.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandSentiment {
    pub brand: String,
    /// Winning class id.
    pub label: u32,
    pub label_name: String,
    /// Mean probability of the winning class over the brand's sub-tokens.
    pub score: f32,
}

pub struct BrandSentimentPipeline<E: Encoder = BertModel> {
    pub(crate) classifier: TokenClassifier<E>,
    pub(crate) collator: BatchCollator,
}

impl<E: Encoder> BrandSentimentPipeline<E> {
    /// The classifier is switched to inference mode.
    pub fn new(mut classifier: TokenClassifier<E>, collator: BatchCollator) -> Self {
        classifier.set_mode(ForwardMode::Inference);
        Self {
            classifier,
            collator,
        }
    }

    pub fn classifier(&self) -> &TokenClassifier<E> {
        &self.classifier
    }

    pub fn collator(&self) -> &BatchCollator {
        &self.collator
    }

    pub fn device(&self) -> &candle_core::Device {
        self.collator.device()
    }

    /// Tokenize `texts` as an unlabelled batch and run the classifier over it.
    pub fn forward(&self, texts: &[&str]) -> Result<(TokenizedBatch, ClassifierOutput)> {
        let batch = self.collator.collate(texts, BatchLabels::Unlabeled)?;
        let output = self.classifier.forward(&batch)?;
        Ok((batch, output))
    }

    /// One [`BrandSentiment`] per brand mentioned in each text, in brand-name order.
    ///
    /// Token probabilities are averaged over every sub-token of the brand's words.
    /// Brands whose words were all truncated away are left out.
    pub fn predict(&self, texts: &[&str]) -> Result<Vec<Vec<BrandSentiment>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let (batch, output) = self.forward(texts)?;
        let probs = softmax(&output.logits, D::Minus1)?.to_vec3::<f32>()?;
        let spans = batch.brand_spans.unwrap_or_default();

        let results = spans
            .iter()
            .zip(&batch.word_ids)
            .zip(&probs)
            .map(|((spans, word_ids), token_probs)| {
                spans
                    .iter()
                    .filter_map(|(brand, words)| {
                        let mean = mean_probs(words, word_ids, token_probs)?;
                        let (label, score) = argmax(&mean);
                        Some(BrandSentiment {
                            brand: brand.clone(),
                            label,
                            label_name: self.classifier.label_name(label),
                            score,
                        })
                    })
                    .collect()
            })
            .collect();

        Ok(results)
    }
}

/// Mean class distribution over the sub-tokens belonging to `words`.
fn mean_probs(
    words: &BTreeSet<usize>,
    word_ids: &[Option<u32>],
    token_probs: &[Vec<f32>],
) -> Option<Vec<f32>> {
    let mut sum: Option<Vec<f32>> = None;
    let mut count = 0usize;

    for (word, probs) in word_ids.iter().zip(token_probs) {
        if !word.is_some_and(|w| words.contains(&(w as usize))) {
            continue;
        }
        let acc = sum.get_or_insert_with(|| vec![0.0; probs.len()]);
        acc.iter_mut().zip(probs).for_each(|(a, p)| *a += p);
        count += 1;
    }

    sum.map(|mut acc| {
        acc.iter_mut().for_each(|a| *a /= count as f32);
        acc
    })
}

fn argmax(probs: &[f32]) -> (u32, f32) {
    probs
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, best_p), (i, p)| {
            if p > best_p {
                (i as u32, p)
            } else {
                (best, best_p)
            }
        })
}
