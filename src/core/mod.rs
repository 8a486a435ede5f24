mod catalog;
mod engine;
mod error;
mod rates;
mod types;

pub use catalog::{Catalog, Instrument, InstrumentMetrics, Volatility};
pub use engine::{simulate, summarize, validate_config, yearly_points};
pub use error::{RateError, SimulationError};
pub use rates::{
    LONG_HORIZON_HAIRCUT, LONG_HORIZON_YEARS, RateLookup, ResolvedRate, ReturnAssumption,
    RiskProfile, annual_rate_from_percent, resolve_or_flat,
};
pub use types::{
    ContributionFrequency, MAX_YEARS_OF_GROWTH, MIN_YEARS_OF_GROWTH, MONTHS_PER_YEAR,
    ProjectionSummary, SimulationConfig, SimulationPoint,
};
