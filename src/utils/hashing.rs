//! Stable hashing for batch IDs

use sha2::{Digest, Sha256};

/// Short, stable identifier for a batch, used to correlate log lines.
///
/// Only the first 1000 characters of the payload contribute, so hashing stays
/// cheap for large batches.
pub fn stable_hash(content: &str, index: usize, start_line: usize, end_line: usize) -> String {
    let content_prefix: String = content.chars().take(1000).collect();
    let hash_input = format!("{index}:{start_line}-{end_line}:{content_prefix}");
    let mut hasher = Sha256::new();
    hasher.update(hash_input.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}
