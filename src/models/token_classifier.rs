use candle_core::{DType, Tensor, D};
use candle_nn::ops::log_softmax;
use candle_nn::{linear, Dropout, Linear, Module, VarBuilder};
use std::collections::HashMap;

use super::bert::{BertModel, Config, Encoder};
use crate::core::{Result, SentimentError};
use crate::data::{TokenizedBatch, IGNORE_INDEX, NUM_CLASSES};

/// Per-class loss weights. Class 0 is a real class that contributes nothing to the loss,
/// unlike [`IGNORE_INDEX`] positions which are skipped entirely.
pub const CLASS_WEIGHTS: [f32; NUM_CLASSES] = [0.0, 1.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMode {
    /// Dropout active, labels required, loss computed.
    Training,
    /// Dropout off, no loss.
    Inference,
}

#[derive(Debug, Clone)]
pub struct ClassifierOutput {
    /// Scalar loss, `None` in inference mode.
    pub loss: Option<Tensor>,
    /// `(batch, seq_len, NUM_CLASSES)`
    pub logits: Tensor,
}

/// Pretrained encoder, dropout and a linear layer producing per-token sentiment logits.
#[derive(Debug, Clone)]
pub struct TokenClassifier<E: Encoder> {
    encoder: E,
    dropout: Dropout,
    classifier: Linear,
    mode: ForwardMode,
    id2label: HashMap<u32, String>,
    span: tracing::Span,
}

impl<E: Encoder> TokenClassifier<E> {
    /// Wrap `encoder` with a classification layer loaded from `vb` (`weight`, `bias`).
    pub fn new(encoder: E, vb: VarBuilder, dropout: f64, mode: ForwardMode) -> Result<Self> {
        let classifier = linear(encoder.hidden_size(), NUM_CLASSES, vb)?;
        Ok(Self {
            encoder,
            dropout: Dropout::new(dropout as f32),
            classifier,
            mode,
            id2label: default_id2label(),
            span: tracing::span!(tracing::Level::TRACE, "token-classifier"),
        })
    }

    pub fn with_labels(mut self, id2label: HashMap<u32, String>) -> Self {
        self.id2label = id2label;
        self
    }

    pub fn mode(&self) -> ForwardMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ForwardMode) {
        self.mode = mode;
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Human-readable name of a class id, falling back to the id itself.
    pub fn label_name(&self, class: u32) -> String {
        self.id2label
            .get(&class)
            .cloned()
            .unwrap_or_else(|| class.to_string())
    }

    /// Encode, apply dropout and project to per-token logits. In training mode the
    /// class-weighted cross-entropy against `batch.labels` is returned as well.
    pub fn forward(&self, batch: &TokenizedBatch) -> Result<ClassifierOutput> {
        let _enter = self.span.enter();
        let train = self.mode == ForwardMode::Training;

        let hidden = self.encoder.encode(
            &batch.input_ids,
            &batch.attention_mask,
            batch.token_type_ids.as_ref(),
            train,
        )?;
        let hidden = self.dropout.forward(&hidden, train)?;
        let logits = self.classifier.forward(&hidden)?;

        let loss = if train {
            let labels = batch.labels.as_ref().ok_or(SentimentError::MissingLabels)?;
            let flat_logits = logits.reshape(((), NUM_CLASSES))?;
            let flat_labels = labels.flatten_all()?;
            Some(weighted_cross_entropy(&flat_logits, &flat_labels)?)
        } else {
            None
        };

        Ok(ClassifierOutput { loss, logits })
    }
}

impl TokenClassifier<BertModel> {
    /// Build from a Hugging Face `BertForSequenceClassification`-style checkpoint:
    /// encoder under `bert.*`, classification layer under `classifier.*`.
    pub fn from_checkpoint(vb: VarBuilder, config: &Config, mode: ForwardMode) -> Result<Self> {
        let encoder = BertModel::load(vb.pp("bert"), config)?;
        let classifier = Self::new(encoder, vb.pp("classifier"), config.head_dropout(), mode)?;
        let id2label = match &config.id2label {
            Some(labels) => labels
                .iter()
                .filter_map(|(id, label)| id.parse::<u32>().ok().map(|id| (id, label.clone())))
                .collect(),
            None => default_id2label(),
        };
        Ok(classifier.with_labels(id2label))
    }
}

fn default_id2label() -> HashMap<u32, String> {
    (0..NUM_CLASSES as u32).map(|id| (id, id.to_string())).collect()
}

/// Cross-entropy over `(n, NUM_CLASSES)` logits and `(n,)` i64 targets.
///
/// Positions labelled [`IGNORE_INDEX`] are skipped. The rest are weighted by
/// [`CLASS_WEIGHTS`] and averaged by the sum of their weights. When that sum is zero
/// the loss is zero and every gradient through it is zero.
pub fn weighted_cross_entropy(logits: &Tensor, targets: &Tensor) -> Result<Tensor> {
    let device = logits.device();
    let logits = logits.to_dtype(DType::F32)?;
    let targets = targets.to_dtype(DType::I64)?;

    let ignore = Tensor::full(IGNORE_INDEX, targets.shape(), device)?;
    let keep = targets.ne(&ignore)?;
    let safe_targets = keep
        .where_cond(&targets, &targets.zeros_like()?)?
        .to_dtype(DType::U32)?;

    let class_weights = Tensor::new(&CLASS_WEIGHTS, device)?;
    let weights = class_weights
        .index_select(&safe_targets, 0)?
        .mul(&keep.to_dtype(DType::F32)?)?;

    let log_probs = log_softmax(&logits, D::Minus1)?;
    let picked = log_probs
        .gather(&safe_targets.unsqueeze(1)?, 1)?
        .squeeze(1)?;

    let total_weight = weights.sum_all()?.to_scalar::<f32>()?;
    let denominator = if total_weight > 0.0 {
        total_weight as f64
    } else {
        1.0
    };
    let weighted_nll = picked.mul(&weights)?.sum_all()?.neg()?;
    Ok((weighted_nll / denominator)?)
}
