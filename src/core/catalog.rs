use serde::Serialize;

use super::rates::RateLookup;

const RISK_FREE_RATE_PERCENT: f64 = 2.0;
const RANGE_52W_BAND: f64 = 0.15;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Volatility {
    Low,
    Medium,
    High,
}

impl Volatility {
    fn score(self) -> f64 {
        match self {
            Volatility::Low => 0.5,
            Volatility::Medium => 1.0,
            Volatility::High => 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub ticker: &'static str,
    pub name: &'static str,
    pub expense_ratio: f64,
    pub average_return_percent: f64,
    pub volatility: Volatility,
    pub dividend_yield: f64,
}

const BUILTIN_INSTRUMENTS: &[Instrument] = &[
    Instrument {
        ticker: "VOO",
        name: "Vanguard S&P 500 ETF",
        expense_ratio: 0.03,
        average_return_percent: 10.0,
        volatility: Volatility::Medium,
        dividend_yield: 1.5,
    },
    Instrument {
        ticker: "SPY",
        name: "SPDR S&P 500 ETF Trust",
        expense_ratio: 0.09,
        average_return_percent: 9.8,
        volatility: Volatility::Medium,
        dividend_yield: 1.4,
    },
    Instrument {
        ticker: "QQQ",
        name: "Invesco QQQ Trust",
        expense_ratio: 0.20,
        average_return_percent: 12.0,
        volatility: Volatility::High,
        dividend_yield: 0.7,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    instruments: &'static [Instrument],
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            instruments: BUILTIN_INSTRUMENTS,
        }
    }

    pub fn find(&self, ticker: &str) -> Option<&'static Instrument> {
        let ticker = ticker.trim();
        self.instruments
            .iter()
            .find(|instrument| instrument.ticker.eq_ignore_ascii_case(ticker))
    }

    /// Instruments whose ticker contains `query`, in catalog order.
    pub fn search(&self, query: &str) -> Vec<&'static Instrument> {
        let needle = query.trim().to_ascii_uppercase();
        self.instruments
            .iter()
            .filter(|instrument| instrument.ticker.contains(needle.as_str()))
            .collect()
    }
}

impl RateLookup for Catalog {
    fn average_return_percent(&self, ticker: &str) -> Option<f64> {
        self.find(ticker)
            .map(|instrument| instrument.average_return_percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentMetrics {
    pub sharpe_ratio: f64,
    pub pe_ratio: Option<f64>,
    pub assets_under_management: &'static str,
    pub reference_price: f64,
    pub high_52w: f64,
    pub low_52w: f64,
}

impl InstrumentMetrics {
    /// Rough display figures derived from the catalog entry alone.
    pub fn for_instrument(instrument: &Instrument) -> Self {
        let sharpe_ratio = round_to(
            (instrument.average_return_percent - RISK_FREE_RATE_PERCENT)
                / instrument.volatility.score(),
            2,
        );
        let pe_ratio = (instrument.average_return_percent > 0.0)
            .then(|| round_to(100.0 / instrument.average_return_percent, 1));

        let assets_under_management = match instrument.ticker {
            "VOO" => "$850B",
            "SPY" => "$450B",
            "QQQ" => "$200B",
            _ => "$100B",
        };
        let reference_price = match instrument.ticker {
            "QQQ" => 380.0,
            "VOO" => 450.0,
            _ => 420.0,
        };

        Self {
            sharpe_ratio,
            pe_ratio,
            assets_under_management,
            reference_price,
            high_52w: round_to(reference_price * (1.0 + RANGE_52W_BAND), 2),
            low_52w: round_to(reference_price * (1.0 - RANGE_52W_BAND), 2),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
