//! Index batching over a fixed-size dataset.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::collator::{SentimentDataset, TokenizedBatch};
use crate::core::{Result, SentimentError};

/// Splits `0..len` into batches, optionally shuffled and optionally dropping a
/// trailing partial batch. Every call to [`BatchSampler::epoch`] starts a fresh
/// pass and re-shuffles when shuffling is on.
#[derive(Debug, Clone)]
pub struct BatchSampler {
    len: usize,
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    rng: StdRng,
}

impl BatchSampler {
    pub fn new(len: usize, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(SentimentError::InvalidBatchSize);
        }
        Ok(Self {
            len,
            batch_size,
            shuffle: false,
            drop_last: false,
            rng: StdRng::from_os_rng(),
        })
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// Make shuffled passes reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches one pass yields.
    pub fn num_batches(&self) -> usize {
        if self.drop_last {
            self.len / self.batch_size
        } else {
            self.len.div_ceil(self.batch_size)
        }
    }

    /// Start a new pass over the dataset.
    pub fn epoch(&mut self) -> Batches {
        let mut order: Vec<usize> = (0..self.len).collect();
        if self.shuffle {
            order.shuffle(&mut self.rng);
        }
        Batches {
            order,
            batch_size: self.batch_size,
            remaining: self.num_batches(),
            cursor: 0,
        }
    }
}

/// The batches of a single pass.
#[derive(Debug, Clone)]
pub struct Batches {
    order: Vec<usize>,
    batch_size: usize,
    remaining: usize,
    cursor: usize,
}

impl Iterator for Batches {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        self.remaining -= 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Batches {}

/// Drives a [`BatchSampler`] over a [`SentimentDataset`], collating each index batch.
pub struct DataLoader<'a> {
    dataset: &'a SentimentDataset,
    sampler: BatchSampler,
}

impl<'a> DataLoader<'a> {
    pub fn new(dataset: &'a SentimentDataset, batch_size: usize) -> Result<Self> {
        Ok(Self {
            dataset,
            sampler: BatchSampler::new(dataset.len(), batch_size)?,
        })
    }

    /// Use a custom sampler. Its length is reset to the dataset's.
    pub fn with_sampler(dataset: &'a SentimentDataset, mut sampler: BatchSampler) -> Self {
        sampler.len = dataset.len();
        Self { dataset, sampler }
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.sampler = self.sampler.shuffle(shuffle);
        self
    }

    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.sampler = self.sampler.drop_last(drop_last);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.sampler = self.sampler.seed(seed);
        self
    }

    /// Number of batches per pass.
    pub fn len(&self) -> usize {
        self.sampler.num_batches()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One pass over the dataset. Batches are collated lazily.
    pub fn iter(&mut self) -> impl Iterator<Item = Result<TokenizedBatch>> + '_ {
        let dataset = self.dataset;
        self.sampler
            .epoch()
            .map(move |indices| dataset.batch(&indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(batches: Batches) -> Vec<usize> {
        batches.map(|b| b.len()).collect()
    }

    #[test]
    fn test_sequential_keeps_partial_batch() {
        let mut sampler = BatchSampler::new(10, 3).unwrap();
        assert_eq!(sampler.num_batches(), 4);

        let batches: Vec<_> = sampler.epoch().collect();
        assert_eq!(
            batches,
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8], vec![9]]
        );
    }

    #[test]
    fn test_drop_last_discards_partial_batch() {
        let mut sampler = BatchSampler::new(10, 3).unwrap().drop_last(true);
        assert_eq!(sampler.num_batches(), 3);

        let batches: Vec<_> = sampler.epoch().collect();
        assert_eq!(sizes(sampler.epoch()), vec![3, 3, 3]);
        let covered: usize = batches.iter().map(Vec::len).sum();
        assert_eq!(covered, 9);
    }

    #[test]
    fn test_shuffle_is_a_permutation_per_pass() {
        let mut sampler = BatchSampler::new(10, 3).unwrap().shuffle(true).seed(7);

        for _ in 0..3 {
            let mut seen: Vec<usize> = sampler.epoch().flatten().collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..10).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let mut a = BatchSampler::new(50, 8).unwrap().shuffle(true).seed(42);
        let mut b = BatchSampler::new(50, 8).unwrap().shuffle(true).seed(42);

        let first_a: Vec<_> = a.epoch().collect();
        let first_b: Vec<_> = b.epoch().collect();
        assert_eq!(first_a, first_b);

        let second_a: Vec<_> = a.epoch().collect();
        assert_ne!(first_a, second_a);
    }

    #[test]
    fn test_exact_size() {
        let mut sampler = BatchSampler::new(7, 2).unwrap();
        let mut batches = sampler.epoch();
        assert_eq!(batches.len(), 4);
        batches.next();
        assert_eq!(batches.len(), 3);
    }

    #[test]
    fn test_empty_dataset_and_zero_batch_size() {
        let mut sampler = BatchSampler::new(0, 4).unwrap();
        assert_eq!(sampler.epoch().count(), 0);
        assert!(matches!(
            BatchSampler::new(4, 0),
            Err(SentimentError::InvalidBatchSize)
        ));
    }
}
