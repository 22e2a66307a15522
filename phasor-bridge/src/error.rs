use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("bridge I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("invalid bridge endpoint '{0}' (expected host:port)")]
    InvalidEndpoint(String),
}
