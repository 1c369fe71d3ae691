use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableChartError {
    /// The table specification or render configuration cannot be laid out.
    #[error("invalid table spec: {0}")]
    InvalidSpec(String),
    /// The drawing surface failed to encode its output.
    #[error("render failure: {0}")]
    RenderFailure(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TableChartError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TableChartError::InvalidSpec(message.into())
    }

    pub fn is_invalid_spec(&self) -> bool {
        matches!(self, TableChartError::InvalidSpec(_))
    }
}

pub type Result<T, E = TableChartError> = std::result::Result<T, E>;
