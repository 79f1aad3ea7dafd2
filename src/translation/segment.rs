//! Splitting long input into bounded chunks at natural boundaries.
//!
//! Lengths are counted in `char`s, never bytes, so a cut can never land
//! inside a multi-byte character.

/// Sentence terminators: full-width period, `.`, `!`, `?` and newline.
pub const SENTENCE_BOUNDARIES: &[char] = &['。', '.', '!', '?', '\n'];

/// Sentence terminators plus full-width and ASCII commas.
pub const CLAUSE_BOUNDARIES: &[char] = &['。', '.', '!', '?', '\n', '，', '、', ','];

/// Splits `text` into a chunk of at most `max_length` characters and the
/// remaining suffix.
///
/// The chunk ends at the last boundary marker within the first `max_length`
/// characters (the marker stays in the chunk). Without a marker the text is
/// hard-cut at `max_length`. A `max_length` of zero is treated as one so that
/// repeated splitting always makes progress.
///
/// ```
/// use tlstream::translation::{SENTENCE_BOUNDARIES, split};
///
/// let (chunk, rest) = split("Hello world. This is a test.", 15, SENTENCE_BOUNDARIES);
/// assert_eq!(chunk, "Hello world.");
/// assert_eq!(rest, " This is a test.");
/// ```
pub fn split(text: &str, max_length: usize, boundaries: &[char]) -> (String, String) {
    let max_length = max_length.max(1);

    // Byte offset just past the `max_length`-th character, if the text is longer.
    let Some((window_end, _)) = text.char_indices().nth(max_length) else {
        return (text.to_string(), String::new());
    };

    let window = &text[..window_end];
    let cut = window
        .char_indices()
        .rev()
        .find(|(_, c)| boundaries.contains(c))
        .map_or(window_end, |(idx, c)| idx + c.len_utf8());

    let (chunk, rest) = text.split_at(cut);
    (chunk.to_string(), rest.to_string())
}

/// Iterates over successive chunks of `text`, as the orchestrator does.
pub fn chunks<'a>(
    text: &'a str,
    max_length: usize,
    boundaries: &'a [char],
) -> impl Iterator<Item = String> + 'a {
    let mut remaining = text.to_string();
    std::iter::from_fn(move || {
        if remaining.is_empty() {
            return None;
        }
        let (chunk, rest) = split(&remaining, max_length, boundaries);
        remaining = rest;
        Some(chunk)
    })
}
