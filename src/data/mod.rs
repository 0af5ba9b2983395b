//! Dataset, collation and batch sampling.

pub mod collator;
pub mod sampler;
pub mod words;

pub use collator::{BatchCollator, BatchLabels, LabelSource, SentimentDataset, TokenizedBatch};
pub use sampler::{BatchSampler, Batches, DataLoader};
pub use words::{split_words, split_words_owned};

use crate::core::{Result, SentimentError};

/// Label value excluded from the loss.
pub const IGNORE_INDEX: i64 = -100;

/// Number of sentiment classes predicted per token.
pub const NUM_CLASSES: usize = 3;

/// Accept a class code in `0..NUM_CLASSES` or [`IGNORE_INDEX`].
pub fn validate_label(label: i64) -> Result<i64> {
    if label == IGNORE_INDEX || (0..NUM_CLASSES as i64).contains(&label) {
        Ok(label)
    } else {
        Err(SentimentError::InvalidLabel(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_label() {
        for label in [0, 1, 2, IGNORE_INDEX] {
            assert_eq!(validate_label(label).unwrap(), label);
        }
        for label in [-1, 3, 100] {
            assert!(validate_label(label).is_err());
        }
    }
}
