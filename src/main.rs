//! chunked-explain: explain large texts through a rate-limited completion API
//!
//! Inputs that fit in one request are sent as-is; larger inputs are compressed
//! chunk by chunk and summarized, all without exceeding the token budget.

use anyhow::Result;

fn main() -> Result<()> {
    chunked_explain::cli::run()
}
