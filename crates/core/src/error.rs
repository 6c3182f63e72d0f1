use thiserror::Error;

#[derive(Error, Debug)]
pub enum TapError {
    #[error("Invalid settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Invalid subscription: {reason}")]
    InvalidSubscription { reason: String },

    #[error("Delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),

    #[error("Collection endpoint rejected the event with status {status}")]
    Rejected { status: u16 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TapError>;
