//! Brand mention lookup over split words.
//!
//! The collator only needs two things from a locator: where each brand sits in a
//! text (as indices into [`split_words`](crate::data::split_words) output) and which
//! brands a text mentions at all. [`BrandLexicon`] is a dictionary-backed
//! implementation that matches case-insensitive, possibly multi-word aliases.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::split_words;

/// Brand name -> word indices covered by that brand's mentions.
pub type BrandSpans = BTreeMap<String, BTreeSet<usize>>;

pub trait BrandLocator {
    /// Word-index spans of every brand mentioned in each text.
    fn locate(&self, texts: &[&str]) -> Vec<BrandSpans>;

    /// Names of the brands mentioned in each text, without positions.
    fn detect(&self, texts: &[&str]) -> Vec<Vec<String>> {
        self.locate(texts).iter().map(brand_names).collect()
    }
}

/// Brand names of one text's spans, in name order.
pub fn brand_names(spans: &BrandSpans) -> Vec<String> {
    spans.keys().cloned().collect()
}

#[derive(Debug, Clone)]
struct Alias {
    brand: String,
    words: Vec<String>,
}

/// Dictionary of brands and the surface forms they appear under.
#[derive(Debug, Clone, Default)]
pub struct BrandLexicon {
    aliases: Vec<Alias>,
}

impl BrandLexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a brand under its own name.
    pub fn with_brand(self, brand: &str) -> Self {
        self.with_aliases(brand, &[brand])
    }

    /// Register a brand under one or more aliases, e.g. `("Jio", &["jio", "reliance jio"])`.
    pub fn with_aliases(mut self, brand: &str, aliases: &[&str]) -> Self {
        for alias in aliases {
            let words: Vec<String> = split_words(alias)
                .into_iter()
                .map(|w| w.to_lowercase())
                .collect();
            if words.is_empty() {
                continue;
            }
            self.aliases.push(Alias {
                brand: brand.to_string(),
                words,
            });
        }
        // Longest alias first so "reliance jio" wins over "jio".
        self.aliases.sort_by(|a, b| b.words.len().cmp(&a.words.len()));
        self
    }

    pub fn len(&self) -> usize {
        self.aliases
            .iter()
            .map(|a| a.brand.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    fn locate_one(&self, text: &str) -> BrandSpans {
        let words: Vec<String> = split_words(text)
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        let mut claimed = vec![false; words.len()];
        let mut spans = BrandSpans::new();

        for alias in &self.aliases {
            let n = alias.words.len();
            if n > words.len() {
                continue;
            }
            for start in 0..=words.len() - n {
                let window = start..start + n;
                if claimed[window.clone()].iter().any(|&c| c) {
                    continue;
                }
                if words[window.clone()] == alias.words[..] {
                    claimed[window.clone()].iter_mut().for_each(|c| *c = true);
                    spans
                        .entry(alias.brand.clone())
                        .or_default()
                        .extend(window);
                }
            }
        }

        spans
    }
}

impl BrandLocator for BrandLexicon {
    fn locate(&self, texts: &[&str]) -> Vec<BrandSpans> {
        texts.iter().map(|text| self.locate_one(text)).collect()
    }
}
