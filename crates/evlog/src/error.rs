use thiserror::Error;

/// Errors surfaced by log producers and subscriptions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogError {
    #[error("invalid topic name `{0}`")]
    InvalidTopic(String),

    #[error("subscription lagged behind, {skipped} records skipped")]
    Lagged { skipped: u64 },

    #[error("log closed")]
    Closed,
}
