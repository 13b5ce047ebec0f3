use thiserror::Error;

/// Binance rejects signed requests whose timestamp is outside `recvWindow`
/// with this code.
pub const CLOCK_SKEW_CODE: i16 = -1021;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Binance API error {0}: {1}")]
    BinanceError(i16, String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("API credentials are missing or unusable: {0}")]
    InvalidCredentials(String),

    #[error("No exchange filters loaded for symbol {0}")]
    MissingSymbolInfo(String),

    #[error("Order {0} was accepted but reported no fills")]
    Unfilled(String),
}

impl ApiError {
    /// Whether the exchange rejected the request because the local clock drifted.
    pub fn is_clock_skew(&self) -> bool {
        matches!(self, ApiError::BinanceError(code, _) if *code == CLOCK_SKEW_CODE)
    }
}
