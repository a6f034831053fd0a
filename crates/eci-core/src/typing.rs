//! Word chunking for the typing animation. Timing lives in the display layer.

/// Splits `text` into words, each chunk keeping the whitespace that follows it.
/// Leading whitespace is its own chunk. Concatenating the chunks gives back `text`.
pub fn word_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            in_space = true;
        } else if in_space && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            in_space = false;
        } else {
            in_space = false;
        }
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
