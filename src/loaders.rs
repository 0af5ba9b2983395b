//! Checkpoint and tokenizer loading from the Hugging Face Hub or a local directory.
//!
//! ## Main Types
//!
//! - [`ModelSource`] - Where a checkpoint lives (hub repository or local directory)
//! - [`HfLoader`] - Single-file hub download with retry logic
//! - [`TokenizerLoader`] - Loads `tokenizer.json`
//! - [`CheckpointLoader`] - Loads `config.json` and the weight file into a `VarBuilder`
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use hinglish_sentiment::loaders::{CheckpointLoader, ModelSource, TokenizerLoader};
//!
//! let source = ModelSource::default();
//! let tokenizer = TokenizerLoader::new(source.clone()).load()?;
//! let checkpoint = CheckpointLoader::new(source).load(&candle_core::Device::Cpu)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::Error as E;
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use std::path::PathBuf;
use tokenizers::Tokenizer;

use crate::models::bert::Config;
use crate::models::HINGLISH_SENTIMENT_REPO;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A model repository on the Hugging Face Hub.
    Hub(String),
    /// A directory holding `config.json`, `tokenizer.json` and the weights.
    Local(PathBuf),
}

impl Default for ModelSource {
    fn default() -> Self {
        ModelSource::Hub(HINGLISH_SENTIMENT_REPO.to_string())
    }
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::Hub(repo) => write!(f, "{repo}"),
            ModelSource::Local(dir) => write!(f, "{}", dir.display()),
        }
    }
}

impl ModelSource {
    /// Resolve `filename` to a local path, downloading it when needed.
    pub fn fetch(&self, filename: &str) -> anyhow::Result<PathBuf> {
        match self {
            ModelSource::Hub(repo) => HfLoader::new(repo, filename).load(),
            ModelSource::Local(dir) => {
                let path = dir.join(filename);
                if path.exists() {
                    Ok(path)
                } else {
                    anyhow::bail!("{} not found in {}", filename, dir.display())
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> anyhow::Result<PathBuf> {
        let hf_api = ApiBuilder::new().build()?;
        let hf_repo = hf_api.repo(Repo::new(self.repo.clone(), RepoType::Model));

        // Retry logic for lock acquisition failures
        let max_retries = 3;
        let mut attempt = 0;

        loop {
            match hf_repo.get(self.filename.as_str()) {
                Ok(path) => return Ok(path),
                Err(e) => {
                    let error_msg = e.to_string();
                    if error_msg.contains("Lock acquisition failed") && attempt < max_retries - 1 {
                        // Wait before retrying, with exponential backoff
                        let wait_time = std::time::Duration::from_millis(100 * (1 << attempt));
                        tracing::debug!(
                            repo = %self.repo,
                            file = %self.filename,
                            attempt,
                            "hub lock busy, retrying"
                        );
                        std::thread::sleep(wait_time);
                        attempt += 1;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenizerLoader {
    source: ModelSource,
}

impl TokenizerLoader {
    pub fn new(source: ModelSource) -> Self {
        Self { source }
    }

    pub fn load(&self) -> anyhow::Result<Tokenizer> {
        let tokenizer_file_path = self.source.fetch("tokenizer.json")?;
        tracing::info!(source = %self.source, "loading tokenizer");

        let tokenizer = Tokenizer::from_file(tokenizer_file_path).map_err(E::msg)?;

        Ok(tokenizer)
    }
}

/// A parsed model config and a `VarBuilder` over its weights.
pub struct Checkpoint<'a> {
    pub config: Config,
    pub vb: VarBuilder<'a>,
}

#[derive(Debug, Clone)]
pub struct CheckpointLoader {
    source: ModelSource,
    dtype: DType,
}

impl CheckpointLoader {
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            dtype: DType::F32,
        }
    }

    pub fn dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn load(&self, device: &Device) -> anyhow::Result<Checkpoint<'static>> {
        tracing::info!(source = %self.source, ?device, "loading checkpoint");

        let config_filename = self.source.fetch("config.json")?;
        let weights_filename = match self.source.fetch("model.safetensors") {
            Ok(safetensors) => safetensors,
            Err(_) => match self.source.fetch("pytorch_model.bin") {
                Ok(pytorch_model) => pytorch_model,
                Err(e) => {
                    anyhow::bail!("Model weights not found in {}. Expected `model.safetensors` or `pytorch_model.bin`. Error: {e}", self.source)
                }
            },
        };

        let config_content = std::fs::read_to_string(&config_filename).map_err(|e| {
            E::msg(format!(
                "Failed to read config file {config_filename:?}: {e}"
            ))
        })?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| E::msg(format!("Failed to parse model config: {e}")))?;

        let vb = if weights_filename
            .extension()
            .is_some_and(|ext| ext == "safetensors")
        {
            // SAFETY: the mmapped file must not be modified while the model is alive.
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_filename], self.dtype, device)? }
        } else if weights_filename
            .extension()
            .is_some_and(|ext| ext == "bin")
        {
            VarBuilder::from_pth(&weights_filename, self.dtype, device)?
        } else {
            anyhow::bail!("Unsupported weight file format: {:?}", weights_filename);
        };

        Ok(Checkpoint { config, vb })
    }
}
