//! Line-based chunking under a per-request token cap.

use crate::domain::Batch;
use crate::utils::{stable_hash, TokenCounter};

pub struct LineChunker<'p> {
    prefix: &'p str,
    max_tokens: usize,
}

impl<'p> LineChunker<'p> {
    /// `prefix` is prepended to every batch and counts toward `max_tokens`.
    pub fn new(prefix: &'p str, max_tokens: usize) -> Self {
        Self { prefix, max_tokens }
    }

    /// Split `content` into batches along line boundaries, preserving order.
    ///
    /// Each line is appended before the estimate is checked, so the line that
    /// reaches or crosses the cap closes its batch. Lines are never split.
    pub fn chunk(&self, content: &str) -> Vec<Batch> {
        let mut builder = BatchBuilder::new(self.prefix);
        let mut batches = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            builder.push_line(idx + 1, line);

            if builder.counter.estimate() >= self.max_tokens {
                let batch = builder.seal(batches.len());
                if batch.line_count() == 1 && batch.token_estimate > self.max_tokens {
                    tracing::warn!(
                        batch = batch.index,
                        line = batch.start_line,
                        tokens = batch.token_estimate,
                        cap = self.max_tokens,
                        "single line exceeds the per-request cap; sending it oversized"
                    );
                }
                batches.push(batch);
                builder = BatchBuilder::new(self.prefix);
            }
        }

        if builder.has_lines() {
            batches.push(builder.seal(batches.len()));
        }

        batches
    }
}

struct BatchBuilder {
    prompt: String,
    counter: TokenCounter,
    start_line: usize,
    end_line: usize,
}

impl BatchBuilder {
    fn new(prefix: &str) -> Self {
        let mut counter = TokenCounter::new();
        counter.push_str(prefix);
        Self { prompt: prefix.to_string(), counter, start_line: 0, end_line: 0 }
    }

    fn has_lines(&self) -> bool {
        self.end_line > 0
    }

    fn push_line(&mut self, line_no: usize, line: &str) {
        if !self.has_lines() {
            self.start_line = line_no;
        }
        self.end_line = line_no;
        self.prompt.push_str(line);
        self.prompt.push('\n');
        self.counter.push_str(line);
        self.counter.push_str("\n");
    }

    fn seal(self, index: usize) -> Batch {
        Batch {
            index,
            id: stable_hash(&self.prompt, index, self.start_line, self.end_line),
            start_line: self.start_line,
            end_line: self.end_line,
            token_estimate: self.counter.estimate(),
            prompt: self.prompt,
        }
    }
}
