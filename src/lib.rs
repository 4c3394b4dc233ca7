//! chunked-explain: quota-aware, chunking client for explaining large texts
//!
//! Estimates token cost locally, keeps calls under a per-minute token budget
//! with a shared sliding-window tracker, and splits oversized input into
//! line-bounded batches whose digests are summarized in a final request.

pub mod chunk;
pub mod cli;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod orchestrate;
pub mod quota;
pub mod utils;

pub use domain::{Batch, Config, Stage};
pub use gateway::{Completion, CompletionGateway, GatewayError};
pub use orchestrate::{ExplainError, ExplainTask, Explainer, Progress};
pub use quota::{Admission, QuotaTracker};
