//! Token estimation

/// Multiplier applied to the raw sub-word count to approximate the remote tokenizer.
const CORRECTION_FACTOR: f64 = 1.11;

/// Characters that separate words for estimation purposes.
fn is_delimiter(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t'
            | '\n'
            | '\r'
            | '\x0B'
            | '\x0C'
            | '.'
            | ','
            | ':'
            | ';'
            | '?'
            | '!'
            | '-'
            | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '\''
            | '"'
            | '&'
            | '*'
            | '%'
            | '$'
            | '#'
    )
}

fn word_units(len: usize) -> usize {
    len.div_ceil(4)
}

fn apply_correction(units: usize) -> usize {
    (units as f64 * CORRECTION_FACTOR).ceil() as usize
}

/// Estimate tokens without calling the remote tokenizer.
///
/// Every run of non-delimiter characters of length `L` costs `ceil(L / 4)`;
/// the sum is scaled by 1.11 and rounded up. Length counts Unicode code
/// points, not bytes.
pub fn estimate_tokens(text: &str) -> usize {
    let mut counter = TokenCounter::new();
    counter.push_str(text);
    counter.estimate()
}

/// Incremental form of [`estimate_tokens`].
///
/// Feeding text in pieces yields exactly the estimate of the concatenation,
/// including words that straddle two pieces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenCounter {
    units: usize,
    word_len: usize,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, text: &str) {
        for c in text.chars() {
            if is_delimiter(c) {
                self.units += word_units(self.word_len);
                self.word_len = 0;
            } else {
                self.word_len += 1;
            }
        }
    }

    pub fn estimate(&self) -> usize {
        apply_correction(self.units + word_units(self.word_len))
    }
}
