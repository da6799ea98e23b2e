use unicode_segmentation::UnicodeSegmentation;

/// A word produced by the tokenizer, borrowed from the input text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawToken<'a> {
    pub text: &'a str,
    /// Position among all words of the input (0-indexed)
    pub position: u32,
    /// Byte offset of the first char
    pub start: usize,
    /// Byte offset one past the last char
    pub end: usize,
}

/// Unicode word tokenizer (UAX #29 word boundaries)
///
/// Splits on non-letter/digit boundaries and drops tokens that consist only of
/// punctuation or whitespace. Words longer than `max_token_length` chars are
/// skipped but still consume a position.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    max_token_length: usize,
}

impl Tokenizer {
    pub fn new(max_token_length: usize) -> Self {
        Self { max_token_length }
    }

    pub fn max_token_length(&self) -> usize {
        self.max_token_length
    }

    /// Lazily tokenize text; restartable by calling again on the same input
    pub fn tokenize<'a>(&self, text: &'a str) -> impl Iterator<Item = RawToken<'a>> + 'a {
        let max_len = self.max_token_length;
        text.unicode_word_indices()
            .enumerate()
            .filter_map(move |(position, (start, word))| {
                if word.chars().count() > max_len {
                    return None;
                }
                Some(RawToken {
                    text: word,
                    position: position as u32,
                    start,
                    end: start + word.len(),
                })
            })
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(255)
    }
}
