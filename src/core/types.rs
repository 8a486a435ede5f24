use serde::{Deserialize, Serialize};

pub const MIN_YEARS_OF_GROWTH: u32 = 1;
pub const MAX_YEARS_OF_GROWTH: u32 = 100;
pub const MONTHS_PER_YEAR: u32 = 12;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionFrequency {
    Daily,
    Weekly,
    Monthly,
    Annually,
}

impl ContributionFrequency {
    /// Amount added in `month` (1-based) for a contribution of `amount` at this frequency.
    pub fn contribution_for_month(self, amount: f64, month: u32) -> f64 {
        match self {
            ContributionFrequency::Daily => amount * 30.0,
            ContributionFrequency::Weekly => amount * 4.0,
            ContributionFrequency::Monthly => amount,
            ContributionFrequency::Annually => {
                if month % MONTHS_PER_YEAR == 1 {
                    amount
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_deposit: f64,
    pub years_of_growth: u32,
    pub primary_rate: f64,
    pub contribution_amount: f64,
    pub contribution_frequency: ContributionFrequency,
    pub compare_rate: Option<f64>,
}

impl SimulationConfig {
    /// Pulls years and monetary inputs back inside the engine's preconditions.
    /// Non-finite amounts become 0.
    pub fn clamped(mut self) -> Self {
        self.years_of_growth = self
            .years_of_growth
            .clamp(MIN_YEARS_OF_GROWTH, MAX_YEARS_OF_GROWTH);
        self.initial_deposit = non_negative_or_zero(self.initial_deposit);
        self.contribution_amount = non_negative_or_zero(self.contribution_amount);
        self
    }

    pub fn total_months(&self) -> u32 {
        self.years_of_growth * MONTHS_PER_YEAR
    }
}

fn non_negative_or_zero(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// One month of a projection. Currency values are whole units held as `f64`
/// and keep growing past the integer range on long, high-rate horizons.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationPoint {
    pub month: u32,
    pub year: f64,
    pub balance: f64,
    pub compare_balance: Option<f64>,
    pub total_deposits: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub final_balance: f64,
    pub final_compare_balance: Option<f64>,
    pub total_deposits: f64,
    pub total_growth: f64,
    pub compare_difference: Option<f64>,
}
