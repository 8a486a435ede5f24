use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::RateError;

/// Horizons longer than this many years get a more conservative rate.
pub const LONG_HORIZON_YEARS: u32 = 20;
pub const LONG_HORIZON_HAIRCUT: f64 = 0.002;

/// Read-only ticker to average-return-percent lookup. Matches are exact but
/// case-insensitive.
pub trait RateLookup {
    fn average_return_percent(&self, ticker: &str) -> Option<f64>;
}

impl RateLookup for HashMap<String, f64> {
    fn average_return_percent(&self, ticker: &str) -> Option<f64> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(ticker))
            .map(|(_, percent)| *percent)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    Average,
    Aggressive,
}

impl RiskProfile {
    pub fn average_return_percent(self) -> f64 {
        match self {
            RiskProfile::Conservative => 5.0,
            RiskProfile::Average => 8.0,
            RiskProfile::Aggressive => 11.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReturnAssumption {
    Instrument(String),
    Profile(RiskProfile),
    CustomPercent(f64),
}

impl ReturnAssumption {
    pub fn resolve(&self, lookup: &dyn RateLookup, years_of_growth: u32) -> Result<f64, RateError> {
        let (label, percent) = match self {
            ReturnAssumption::Instrument(ticker) => {
                (ticker.clone(), lookup.average_return_percent(ticker))
            }
            ReturnAssumption::Profile(profile) => {
                (format!("{profile:?}"), Some(profile.average_return_percent()))
            }
            ReturnAssumption::CustomPercent(percent) => {
                ("custom return".to_string(), Some(*percent))
            }
        };

        match percent {
            Some(percent) if percent.is_finite() && self.is_user_supplied() => {
                Ok((percent / 100.0).max(0.0))
            }
            Some(percent) if percent.is_finite() => {
                Ok(annual_rate_from_percent(percent, years_of_growth))
            }
            _ => Err(RateError::MissingRateData { ticker: label }),
        }
    }

    /// A percentage typed by the user is taken as-is; only historical
    /// averages get the long-horizon adjustment.
    fn is_user_supplied(&self) -> bool {
        matches!(self, ReturnAssumption::CustomPercent(_))
    }

    pub fn label(&self) -> String {
        match self {
            ReturnAssumption::Instrument(ticker) => ticker.to_ascii_uppercase(),
            ReturnAssumption::Profile(profile) => format!("{profile:?} profile"),
            ReturnAssumption::CustomPercent(percent) => format!("custom {percent}%"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRate {
    pub annual_rate: f64,
    pub missing: Option<RateError>,
}

/// Resolves `assumption`, falling back to a flat 0 rate when data is missing.
pub fn resolve_or_flat(
    assumption: &ReturnAssumption,
    lookup: &dyn RateLookup,
    years_of_growth: u32,
) -> ResolvedRate {
    match assumption.resolve(lookup, years_of_growth) {
        Ok(annual_rate) => ResolvedRate {
            annual_rate,
            missing: None,
        },
        Err(err) => {
            tracing::warn!(error = %err, "falling back to a flat projection");
            ResolvedRate {
                annual_rate: 0.0,
                missing: Some(err),
            }
        }
    }
}

/// Converts an average annual return in percent to the decimal rate used for
/// a projection of `years_of_growth` years. Never negative.
pub fn annual_rate_from_percent(percent: f64, years_of_growth: u32) -> f64 {
    let mut rate = percent / 100.0;
    if years_of_growth > LONG_HORIZON_YEARS {
        rate -= LONG_HORIZON_HAIRCUT;
    }
    rate.max(0.0)
}
