use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentimentError {
    // Collation
    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Index {index} out of range for dataset of {len} texts")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid sentiment label {0}: expected 0, 1, 2 or -100")]
    InvalidLabel(i64),

    #[error("Word index {index} out of range for text {text} with {words} words")]
    WordIndexOutOfRange {
        text: usize,
        index: usize,
        words: usize,
    },

    #[error("Label source has {labels} entries but the dataset has {texts} texts")]
    LabelCountMismatch { labels: usize, texts: usize },

    // Sampling
    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,

    // Classification head
    #[error("Labels are required when the classifier runs in training mode")]
    MissingLabels,

    // Translation
    #[error("Chunk length must be greater than zero")]
    InvalidChunkLength,

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Invalid config: {0}")]
    Config(String),

    // Pass-through from dependencies
    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SentimentError>;

impl From<tokenizers::Error> for SentimentError {
    fn from(value: tokenizers::Error) -> Self {
        SentimentError::Tokenization(value.to_string())
    }
}
