pub mod bert;
pub mod token_classifier;

pub use bert::{BertModel, Config, Encoder};
pub use token_classifier::{
    weighted_cross_entropy, ClassifierOutput, ForwardMode, TokenClassifier, CLASS_WEIGHTS,
};

/// Hub repository of the pretrained Hinglish sentiment checkpoint.
pub const HINGLISH_SENTIMENT_REPO: &str = "ganeshkharad/gk-hinglish-sentiment";
