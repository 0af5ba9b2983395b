//! BERT encoder.
//!
//! The bidirectional encoder underneath the Hinglish token classifier:
//! - Word, position and segment embeddings followed by LayerNorm
//! - Post-norm transformer layers (self-attention, GELU feed-forward)
//! - Weight names follow Hugging Face `BertModel` checkpoints (`bert.embeddings.*`,
//!   `bert.encoder.layer.{i}.*`)
//!
//! Only the encoder lives here. Task heads wrap it through the [`Encoder`] trait.

use candle_core::{DType, Device, Result, Tensor, D};
use candle_nn::{embedding, linear, ops::softmax, Dropout, Embedding, Linear, VarBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const MIN_VALUE_F64: f64 = f32::MIN as f64;

/// Anything that turns token ids into per-token hidden states.
pub trait Encoder {
    /// Hidden states with shape `(batch_size, sequence_length, hidden_size)`.
    /// `train` enables the encoder's internal dropout.
    fn encode(
        &self,
        input_ids: &Tensor,
        attention_mask: &Tensor,
        token_type_ids: Option<&Tensor>,
        train: bool,
    ) -> Result<Tensor>;

    fn hidden_size(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HiddenAct {
    #[default]
    Gelu,
    #[serde(alias = "gelu_new", alias = "gelu_pytorch_tanh")]
    GeluApproximate,
    Relu,
}

impl HiddenAct {
    fn apply(&self, xs: &Tensor) -> Result<Tensor> {
        match self {
            HiddenAct::Gelu => xs.gelu_erf(),
            HiddenAct::GeluApproximate => xs.gelu(),
            HiddenAct::Relu => xs.relu(),
        }
    }
}

fn default_dropout() -> f64 {
    0.1
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

fn default_type_vocab_size() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    #[serde(default)]
    pub hidden_act: HiddenAct,
    #[serde(default = "default_dropout")]
    pub hidden_dropout_prob: f64,
    #[serde(default = "default_dropout")]
    pub attention_probs_dropout_prob: f64,
    pub max_position_embeddings: usize,
    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default)]
    pub pad_token_id: u32,
    #[serde(default)]
    pub classifier_dropout: Option<f64>,
    #[serde(default)]
    pub id2label: Option<HashMap<String, String>>,
}

impl Config {
    /// Dropout applied in front of the classification layer.
    pub fn head_dropout(&self) -> f64 {
        self.classifier_dropout.unwrap_or(self.hidden_dropout_prob)
    }
}

/// LayerNorm over the last dimension, built from primitive ops so gradients
/// reach its inputs and affine parameters.
#[derive(Debug, Clone)]
struct Norm {
    weight: Tensor,
    bias: Tensor,
    eps: f64,
}

impl Norm {
    fn load(size: usize, eps: f64, vb: VarBuilder) -> Result<Self> {
        let weight = vb.get_with_hints(size, "weight", candle_nn::Init::Const(1.))?;
        let bias = vb.get_with_hints(size, "bias", candle_nn::Init::Const(0.))?;
        Ok(Self { weight, bias, eps })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let dtype = xs.dtype();
        let xs = xs.to_dtype(DType::F32)?;
        let centered = xs.broadcast_sub(&xs.mean_keepdim(D::Minus1)?)?;
        let variance = centered.sqr()?.mean_keepdim(D::Minus1)?;
        let normed = centered.broadcast_div(&(variance + self.eps)?.sqrt()?)?;
        normed
            .to_dtype(dtype)?
            .broadcast_mul(&self.weight)?
            .broadcast_add(&self.bias)
    }
}

#[derive(Debug, Clone)]
struct Embeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    norm: Norm,
    dropout: Dropout,
}

impl Embeddings {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let word_embeddings = embedding(
            config.vocab_size,
            config.hidden_size,
            vb.pp("word_embeddings"),
        )?;
        let position_embeddings = embedding(
            config.max_position_embeddings,
            config.hidden_size,
            vb.pp("position_embeddings"),
        )?;
        let token_type_embeddings = embedding(
            config.type_vocab_size,
            config.hidden_size,
            vb.pp("token_type_embeddings"),
        )?;
        let norm = Norm::load(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?;

        Ok(Self {
            word_embeddings,
            position_embeddings,
            token_type_embeddings,
            norm,
            dropout: Dropout::new(config.hidden_dropout_prob as f32),
        })
    }

    fn forward(&self, input_ids: &Tensor, token_type_ids: &Tensor, train: bool) -> Result<Tensor> {
        let seq_len = input_ids.dim(1)?;
        let position_ids = Tensor::arange(0u32, seq_len as u32, input_ids.device())?.unsqueeze(0)?;

        let words = input_ids.apply(&self.word_embeddings)?;
        let positions = position_ids.apply(&self.position_embeddings)?;
        let segments = token_type_ids.apply(&self.token_type_embeddings)?;

        let embeddings = words.broadcast_add(&positions)?.add(&segments)?;
        self.dropout.forward(&self.norm.forward(&embeddings)?, train)
    }
}

/// Multi-head self-attention with a post-attention residual block.
#[derive(Debug, Clone)]
struct SelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    norm: Norm,
    attention_dropout: Dropout,
    output_dropout: Dropout,
    num_attention_heads: usize,
    attention_head_size: usize,
}

impl SelfAttention {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let hidden = config.hidden_size;
        let query = linear(hidden, hidden, vb.pp("self.query"))?;
        let key = linear(hidden, hidden, vb.pp("self.key"))?;
        let value = linear(hidden, hidden, vb.pp("self.value"))?;
        let output = linear(hidden, hidden, vb.pp("output.dense"))?;
        let norm = Norm::load(hidden, config.layer_norm_eps, vb.pp("output.LayerNorm"))?;

        Ok(Self {
            query,
            key,
            value,
            output,
            norm,
            attention_dropout: Dropout::new(config.attention_probs_dropout_prob as f32),
            output_dropout: Dropout::new(config.hidden_dropout_prob as f32),
            num_attention_heads: config.num_attention_heads,
            attention_head_size: hidden / config.num_attention_heads,
        })
    }

    /// `(batch, seq, hidden)` -> `(batch, heads, seq, head_dim)`
    fn split_heads(&self, xs: &Tensor) -> Result<Tensor> {
        let (batch, seq_len, _) = xs.dims3()?;
        xs.reshape((
            batch,
            seq_len,
            self.num_attention_heads,
            self.attention_head_size,
        ))?
        .transpose(1, 2)?
        .contiguous()
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor, train: bool) -> Result<Tensor> {
        let (batch, seq_len, hidden_size) = hidden_states.dims3()?;

        let q = self.split_heads(&hidden_states.apply(&self.query)?)?;
        let k = self.split_heads(&hidden_states.apply(&self.key)?)?;
        let v = self.split_heads(&hidden_states.apply(&self.value)?)?;

        let scale = (self.attention_head_size as f64).powf(-0.5);
        let attention_scores = (q.matmul(&k.t()?)? * scale)?;
        let attention_scores = attention_scores.broadcast_add(attention_mask)?;
        let attention_probs = softmax(&attention_scores, D::Minus1)?;
        let attention_probs = self.attention_dropout.forward(&attention_probs, train)?;

        let context = attention_probs
            .matmul(&v)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch, seq_len, hidden_size))?;

        let projected = self.output_dropout.forward(&context.apply(&self.output)?, train)?;
        self.norm.forward(&(projected + hidden_states)?)
    }
}

#[derive(Debug, Clone)]
struct FeedForward {
    intermediate: Linear,
    output: Linear,
    norm: Norm,
    dropout: Dropout,
    act: HiddenAct,
}

impl FeedForward {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let intermediate = linear(
            config.hidden_size,
            config.intermediate_size,
            vb.pp("intermediate.dense"),
        )?;
        let output = linear(
            config.intermediate_size,
            config.hidden_size,
            vb.pp("output.dense"),
        )?;
        let norm = Norm::load(
            config.hidden_size,
            config.layer_norm_eps,
            vb.pp("output.LayerNorm"),
        )?;
        Ok(Self {
            intermediate,
            output,
            norm,
            dropout: Dropout::new(config.hidden_dropout_prob as f32),
            act: config.hidden_act,
        })
    }

    fn forward(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let hidden = self.act.apply(&xs.apply(&self.intermediate)?)?;
        let projected = self.dropout.forward(&hidden.apply(&self.output)?, train)?;
        self.norm.forward(&(projected + xs)?)
    }
}

#[derive(Debug, Clone)]
struct TransformerLayer {
    attention: SelfAttention,
    feed_forward: FeedForward,
}

impl TransformerLayer {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let attention = SelfAttention::load(vb.pp("attention"), config)?;
        let feed_forward = FeedForward::load(vb.clone(), config)?;
        Ok(Self {
            attention,
            feed_forward,
        })
    }

    fn forward(&self, hidden_states: &Tensor, attention_mask: &Tensor, train: bool) -> Result<Tensor> {
        let attended = self.attention.forward(hidden_states, attention_mask, train)?;
        self.feed_forward.forward(&attended, train)
    }
}

#[derive(Debug, Clone)]
struct ModelWeights {
    embeddings: Embeddings,
    layers: Vec<TransformerLayer>,
    hidden_size: usize,
    device: Device,
    dtype: DType,
}

impl ModelWeights {
    fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let embeddings = Embeddings::load(vb.pp("embeddings"), config)?;

        let mut layers = Vec::with_capacity(config.num_hidden_layers);
        for layer_idx in 0..config.num_hidden_layers {
            layers.push(TransformerLayer::load(
                vb.pp(format!("encoder.layer.{layer_idx}")),
                config,
            )?);
        }

        Ok(Self {
            embeddings,
            layers,
            hidden_size: config.hidden_size,
            device: vb.device().clone(),
            dtype: vb.dtype(),
        })
    }

    /// `(batch, seq)` padding mask -> additive `(batch, 1, 1, seq)` mask.
    fn create_attention_mask(&self, mask: &Tensor) -> Result<Tensor> {
        let mask = mask.unsqueeze(1)?.unsqueeze(2)?.to_dtype(self.dtype)?;
        let inverted_mask = (1.0 - mask)?;
        (inverted_mask * MIN_VALUE_F64)?.to_dtype(self.dtype)
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        attention_mask: &Tensor,
        token_type_ids: Option<&Tensor>,
        train: bool,
    ) -> Result<Tensor> {
        let token_type_ids = match token_type_ids {
            Some(ids) => ids.clone(),
            None => input_ids.zeros_like()?,
        };
        let attention_mask = self.create_attention_mask(attention_mask)?;

        let mut hidden_states = self.embeddings.forward(input_ids, &token_type_ids, train)?;
        for layer in &self.layers {
            hidden_states = layer.forward(&hidden_states, &attention_mask, train)?;
        }
        Ok(hidden_states)
    }
}

/// BERT encoder without task head. Cloning shares the weights.
#[derive(Debug, Clone)]
pub struct BertModel {
    weights: Arc<ModelWeights>,
}

impl BertModel {
    /// Load from a `VarBuilder` already scoped to the encoder (e.g. `vb.pp("bert")`).
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let weights = Arc::new(ModelWeights::load(vb, config)?);
        Ok(Self { weights })
    }

    /// Forward pass returning hidden states.
    ///
    /// # Arguments
    /// * `input_ids` - Token IDs with shape `(batch_size, sequence_length)`
    /// * `attention_mask` - Attention mask with shape `(batch_size, sequence_length)` (1 for unmasked, 0 for padded)
    /// * `token_type_ids` - Segment IDs, zeros when `None`
    /// * `train` - Apply embedding, attention and hidden-state dropout
    ///
    /// # Returns
    /// Hidden states with shape `(batch_size, sequence_length, hidden_size)`
    pub fn forward(
        &self,
        input_ids: &Tensor,
        attention_mask: &Tensor,
        token_type_ids: Option<&Tensor>,
        train: bool,
    ) -> Result<Tensor> {
        self.weights
            .forward(input_ids, attention_mask, token_type_ids, train)
    }

    pub fn num_layers(&self) -> usize {
        self.weights.layers.len()
    }

    pub fn device(&self) -> &Device {
        &self.weights.device
    }
}

impl Encoder for BertModel {
    fn encode(
        &self,
        input_ids: &Tensor,
        attention_mask: &Tensor,
        token_type_ids: Option<&Tensor>,
        train: bool,
    ) -> Result<Tensor> {
        self.forward(input_ids, attention_mask, token_type_ids, train)
    }

    fn hidden_size(&self) -> usize {
        self.weights.hidden_size
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;

    pub(crate) fn tiny_config() -> Config {
        serde_json::from_str(
            r#"{
                "vocab_size": 32,
                "hidden_size": 16,
                "num_hidden_layers": 2,
                "num_attention_heads": 4,
                "intermediate_size": 32,
                "hidden_act": "gelu",
                "max_position_embeddings": 64,
                "id2label": {"0": "negative", "1": "neutral", "2": "positive"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = tiny_config();
        assert_eq!(config.type_vocab_size, 2);
        assert_eq!(config.layer_norm_eps, 1e-12);
        assert_eq!(config.head_dropout(), 0.1);
        assert_eq!(config.hidden_act, HiddenAct::Gelu);
    }

    #[test]
    fn test_forward_shape_and_padding_independence() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = BertModel::load(vb, &tiny_config())?;
        assert_eq!(model.num_layers(), 2);

        let ids = Tensor::new(&[[2u32, 5, 6, 3, 0, 0]], &device)?;
        let mask = Tensor::new(&[[1u32, 1, 1, 1, 0, 0]], &device)?;
        let hidden = model.forward(&ids, &mask, None, false)?;
        assert_eq!(hidden.dims(), &[1, 6, 16]);

        // Real-token states must not change when the padding is removed.
        let short_ids = Tensor::new(&[[2u32, 5, 6, 3]], &device)?;
        let short_mask = Tensor::new(&[[1u32, 1, 1, 1]], &device)?;
        let short = model.forward(&short_ids, &short_mask, None, false)?;

        let padded = hidden.narrow(1, 0, 4)?.flatten_all()?.to_vec1::<f32>()?;
        let unpadded = short.flatten_all()?.to_vec1::<f32>()?;
        for (a, b) in padded.iter().zip(unpadded.iter()) {
            assert!((a - b).abs() < 1e-4, "{a} != {b}");
        }
        Ok(())
    }

    #[test]
    fn test_dropout_only_in_training() -> Result<()> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = BertModel::load(vb, &tiny_config())?;

        let ids = Tensor::new(&[[2u32, 5, 6, 7, 3]], &device)?;
        let mask = Tensor::ones((1, 5), DType::U32, &device)?;

        let eval_a = model.forward(&ids, &mask, None, false)?.flatten_all()?.to_vec1::<f32>()?;
        let eval_b = model.forward(&ids, &mask, None, false)?.flatten_all()?.to_vec1::<f32>()?;
        assert_eq!(eval_a, eval_b);

        let train = model.forward(&ids, &mask, None, true)?.flatten_all()?.to_vec1::<f32>()?;
        assert_ne!(eval_a, train);
        Ok(())
    }

    #[test]
    fn test_norm_matches_fused_layer_norm() -> Result<()> {
        let device = Device::Cpu;
        let xs = Tensor::new(&[[[1f32, 2.0, 3.0, 6.0], [-1.0, 0.5, 0.0, 4.0]]], &device)?;
        let weight = Tensor::new(&[1f32, 0.5, 2.0, 1.0], &device)?;
        let bias = Tensor::new(&[0f32, 0.1, -0.1, 0.0], &device)?;

        let norm = Norm {
            weight: weight.clone(),
            bias: bias.clone(),
            eps: 1e-5,
        };
        let ours = norm.forward(&xs)?.flatten_all()?.to_vec1::<f32>()?;
        let fused = candle_nn::ops::layer_norm(&xs, &weight, &bias, 1e-5)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        for (a, b) in ours.iter().zip(&fused) {
            assert!((a - b).abs() < 1e-4, "{a} != {b}");
        }
        Ok(())
    }
}
