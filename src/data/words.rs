use once_cell::sync::Lazy;
use regex::Regex;

/// Runs of word characters, or a single character that is neither whitespace nor a word character.
static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\w]+|[^\s\w]").expect("word pattern is a valid regex")
});

/// Split `text` into the word sequence that word indices refer to.
///
/// Punctuation marks become standalone words, so `"BrandX!!"` yields
/// `["BrandX", "!", "!"]`.
pub fn split_words(text: &str) -> Vec<&str> {
    WORD_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Owned variant of [`split_words`], in the shape the tokenizer accepts as pre-split input.
pub fn split_words_owned(text: &str) -> Vec<String> {
    split_words(text).into_iter().map(str::to_string).collect()
}
