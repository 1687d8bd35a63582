// thiserror-based error types for the ground client
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("IO: {0}")] Io(#[from] std::io::Error),
    #[error("JSON: {0}")] Json(#[from] serde_json::Error),
    #[error("Decode: {0}")] Decode(#[from] datavis_protocol::DecodeError),
}
