//! Shared helpers: token estimation, lossy reduction, hashing, input decoding.

pub mod encoding;
pub mod hashing;
pub mod reduce;
pub mod tokens;

pub use encoding::{read_text, read_text_file};
pub use hashing::stable_hash;
pub use reduce::{reduce_for_cap, strip_comment_lines};
pub use tokens::{estimate_tokens, TokenCounter};

/// Format an integer with thousands separators (`12345` -> `12,345`).
pub fn format_with_commas(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::format_with_commas;

    #[test]
    fn test_format_with_commas() {
        assert_eq!(format_with_commas(0), "0");
        assert_eq!(format_with_commas(999), "999");
        assert_eq!(format_with_commas(7000), "7,000");
        assert_eq!(format_with_commas(1_234_567), "1,234,567");
    }
}
