use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Price bars are not strictly increasing in time: {previous} is followed by {next}")]
    UnorderedBars {
        previous: DateTime<Utc>,
        next: DateTime<Utc>,
    },
}
