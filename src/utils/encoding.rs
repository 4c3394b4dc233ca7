//! Encoding detection for input text.
//!
//! Input may come from a file or from stdin, so everything here works on byte
//! buffers:
//! - BOM detection (UTF-8, UTF-16 LE/BE)
//! - UTF-8 fast path with strict validation
//! - Fallback detection using chardetng
//! - Binary detection so that non-text input is rejected early

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use std::io::Read;
use std::path::Path;

const DEFAULT_SAMPLE_SIZE: usize = 8192;

/// Guess the encoding of `bytes`, inspecting at most the first 8 KiB.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];

    if let Some((encoding, _bom_len)) = Encoding::for_bom(sample) {
        return encoding;
    }

    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, sample.len() == bytes.len());
    detector.guess(None, true)
}

/// Heuristic binary check: a NUL byte, or fewer than 70% printable bytes.
///
/// UTF-16 input legitimately contains NUL bytes, so a UTF-16 BOM short-circuits
/// the check.
pub fn is_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(DEFAULT_SAMPLE_SIZE)];
    if sample.is_empty() {
        return false;
    }
    if matches!(Encoding::for_bom(sample), Some((enc, _)) if enc == UTF_16LE || enc == UTF_16BE) {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }

    let printable = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == b'\t' || b == b'\n' || b == b'\r' || b >= 0x80)
        .count();

    (printable as f64 / sample.len() as f64) < 0.70
}

/// Decode `bytes` into a `String`, returning the label of the encoding used.
///
/// Invalid sequences are replaced rather than reported.
pub fn decode_text(bytes: &[u8]) -> (String, &'static str) {
    let encoding = detect_encoding(bytes);
    let (decoded, used, _had_errors) = encoding.decode(bytes);
    (decoded.into_owned(), used.name())
}

/// Read a whole file as text.
pub fn read_text_file(path: &Path) -> Result<(String, &'static str)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    if is_binary(&bytes) {
        anyhow::bail!("Input looks binary, refusing to explain it: {}", path.display());
    }
    Ok(decode_text(&bytes))
}

/// Read all of `reader` (typically stdin) as text.
pub fn read_text<R: Read>(mut reader: R) -> Result<(String, &'static str)> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).context("Failed to read input")?;
    if is_binary(&bytes) {
        anyhow::bail!("Input looks binary, refusing to explain it");
    }
    Ok(decode_text(&bytes))
}
