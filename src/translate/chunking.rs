use crate::core::{Result, SentimentError};

/// Split `text` into chunks of at most `max_len` characters.
///
/// While the remainder is longer than `max_len`, the next chunk ends at the last `.`
/// within its first `max_len` characters (inclusive), or is hard-cut at `max_len`
/// characters when there is none. The remainder becomes the final chunk, so
/// concatenating the chunks reproduces `text` exactly.
pub fn split_into_chunks(text: &str, max_len: usize) -> Result<Vec<String>> {
    if max_len == 0 {
        return Err(SentimentError::InvalidChunkLength);
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.chars().count() > max_len {
        // Byte offset just past the `max_len`-th character.
        let window_end = rest
            .char_indices()
            .nth(max_len)
            .map_or(rest.len(), |(byte, _)| byte);
        let cut = match rest[..window_end].rfind('.') {
            Some(stop) => stop + 1,
            None => window_end,
        };
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    chunks.push(rest.to_string());
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lengths(chunks: &[String]) -> Vec<usize> {
        chunks.iter().map(|c| c.chars().count()).collect()
    }

    #[test]
    fn test_short_text_is_one_chunk() -> Result<()> {
        assert_eq!(split_into_chunks("Jio is great.", 160)?, vec!["Jio is great."]);
        assert_eq!(split_into_chunks("", 160)?, vec![""]);
        Ok(())
    }

    #[test]
    fn test_hard_cut_without_periods() -> Result<()> {
        let text = "a".repeat(12000);
        let chunks = split_into_chunks(&text, 5000)?;
        assert_eq!(lengths(&chunks), vec![5000, 5000, 2000]);
        Ok(())
    }

    #[test]
    fn test_splits_after_last_period() -> Result<()> {
        let text = "AAA. ".repeat(2000);
        let chunks = split_into_chunks(&text, 5000)?;

        assert_eq!(lengths(&chunks), vec![4999, 5000, 1]);
        assert!(chunks[0].ends_with('.'));
        assert!(chunks[1].ends_with('.'));
        assert_eq!(chunks[2], " ");
        assert_eq!(chunks.concat(), text);
        Ok(())
    }

    #[test]
    fn test_hinglish_limit() -> Result<()> {
        let text = "yeh phone accha hai. ".repeat(20);
        let chunks = split_into_chunks(&text, 160)?;

        assert!(chunks.iter().all(|c| c.chars().count() <= 160));
        assert_eq!(chunks.concat(), text);
        Ok(())
    }

    #[test]
    fn test_counts_characters_not_bytes() -> Result<()> {
        let text = "अ".repeat(10);
        let chunks = split_into_chunks(&text, 4)?;
        assert_eq!(lengths(&chunks), vec![4, 4, 2]);
        Ok(())
    }

    #[test]
    fn test_zero_length_is_rejected() {
        assert!(matches!(
            split_into_chunks("abc", 0),
            Err(SentimentError::InvalidChunkLength)
        ));
    }
}
