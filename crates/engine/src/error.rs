use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API client error: {0}")]
    ApiClient(#[from] api_client::ApiError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Risk management error: {0}")]
    Risk(#[from] risk::RiskError),

    #[error("Execution error: {0}")]
    Executor(#[from] executor::ExecutorError),
}

impl EngineError {
    /// The one recoverable failure: the exchange rejected a request because of
    /// clock drift. The loop pauses and retries the whole cycle.
    pub fn is_clock_skew(&self) -> bool {
        match self {
            EngineError::ApiClient(e) => e.is_clock_skew(),
            EngineError::Executor(e) => e.is_clock_skew(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::ApiError;

    #[test]
    fn clock_skew_is_detected_through_wrappers() {
        let direct = EngineError::from(ApiError::BinanceError(-1021, "skew".into()));
        let wrapped = EngineError::from(executor::ExecutorError::from(ApiError::BinanceError(
            -1021,
            "skew".into(),
        )));
        let other = EngineError::from(ApiError::BinanceError(-2015, "Invalid API-key".into()));

        assert!(direct.is_clock_skew());
        assert!(wrapped.is_clock_skew());
        assert!(!other.is_clock_skew());
        assert!(!EngineError::Configuration("x".into()).is_clock_skew());
    }
}
