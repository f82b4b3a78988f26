use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown source type: {0}")]
    UnknownSource(String),
}
