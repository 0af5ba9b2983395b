#![allow(dead_code)]

use std::sync::Arc;

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use hinglish_sentiment::brands::BrandLexicon;
use hinglish_sentiment::core::CollatorConfig;
use hinglish_sentiment::data::BatchCollator;
use hinglish_sentiment::models::{BertModel, Config, ForwardMode, TokenClassifier};
use tokenizers::Tokenizer;

/// Lowercasing WordPiece tokenizer over a tiny Hinglish vocabulary.
const TOKENIZER_JSON: &str = r###"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [
    {"id": 0, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 1, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 2, "content": "[CLS]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 3, "content": "[SEP]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
  ],
  "normalizer": {
    "type": "BertNormalizer",
    "clean_text": true,
    "handle_chinese_chars": true,
    "strip_accents": null,
    "lowercase": true
  },
  "pre_tokenizer": {"type": "BertPreTokenizer"},
  "post_processor": {
    "type": "BertProcessing",
    "sep": ["[SEP]", 3],
    "cls": ["[CLS]", 2]
  },
  "decoder": {"type": "WordPiece", "prefix": "##", "cleanup": true},
  "model": {
    "type": "WordPiece",
    "unk_token": "[UNK]",
    "continuing_subword_prefix": "##",
    "max_input_chars_per_word": 100,
    "vocab": {
      "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3,
      "i": 4, "love": 5, "brand": 6, "##x": 7, "##y": 8,
      "jio": 9, "ka": 10, "network": 11, "bahut": 12, "slow": 13,
      "hai": 14, ",": 15, ".": 16, "!": 17, "phone": 18,
      "accha": 19, "bura": 20, "yeh": 21, "aur": 22, "the": 23
    }
  }
}"###;

pub const VOCAB_SIZE: usize = 32;

pub fn tokenizer() -> anyhow::Result<Tokenizer> {
    TOKENIZER_JSON
        .parse::<Tokenizer>()
        .map_err(anyhow::Error::msg)
}

pub fn lexicon() -> BrandLexicon {
    BrandLexicon::new()
        .with_brand("BrandX")
        .with_brand("BrandY")
        .with_aliases("Jio", &["jio", "reliance jio"])
}

pub fn collator() -> anyhow::Result<BatchCollator> {
    collator_with(CollatorConfig::default())
}

pub fn collator_with(config: CollatorConfig) -> anyhow::Result<BatchCollator> {
    Ok(BatchCollator::new(
        tokenizer()?,
        Arc::new(lexicon()),
        Device::Cpu,
        &config,
    )?)
}

pub fn tiny_config() -> anyhow::Result<Config> {
    Ok(serde_json::from_str(&format!(
        r#"{{
            "vocab_size": {VOCAB_SIZE},
            "hidden_size": 16,
            "num_hidden_layers": 2,
            "num_attention_heads": 4,
            "intermediate_size": 32,
            "hidden_act": "gelu",
            "max_position_embeddings": 64,
            "id2label": {{"0": "negative", "1": "neutral", "2": "positive"}}
        }}"#
    ))?)
}

/// Randomly initialised classifier with the checkpoint's weight layout.
pub fn classifier(mode: ForwardMode) -> anyhow::Result<TokenClassifier<BertModel>> {
    Ok(classifier_with_vars(mode)?.0)
}

/// Like [`classifier`], also returning the variables backing its weights.
pub fn classifier_with_vars(
    mode: ForwardMode,
) -> anyhow::Result<(TokenClassifier<BertModel>, VarMap)> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let classifier = TokenClassifier::from_checkpoint(vb, &tiny_config()?, mode)?;
    Ok((classifier, varmap))
}

/// Sum of absolute gradient values for the named variable, `None` when it got no gradient.
pub fn grad_magnitude(
    varmap: &VarMap,
    grads: &candle_core::backprop::GradStore,
    name: &str,
) -> anyhow::Result<Option<f32>> {
    let data = varmap.data().lock().expect("varmap lock");
    let var = data
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("no variable named {name}"))?;
    match grads.get(var.as_tensor()) {
        Some(grad) => Ok(Some(grad.abs()?.sum_all()?.to_scalar::<f32>()?)),
        None => Ok(None),
    }
}
