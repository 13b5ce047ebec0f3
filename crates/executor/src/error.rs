use api_client::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Invalid order request: {0}")]
    InvalidOrder(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

impl ExecutorError {
    pub fn is_clock_skew(&self) -> bool {
        matches!(self, ExecutorError::Api(e) if e.is_clock_skew())
    }
}
