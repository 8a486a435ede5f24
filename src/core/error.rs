use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("no average return known for {ticker}")]
    MissingRateData { ticker: String },
}
