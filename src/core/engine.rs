use super::error::SimulationError;
use super::types::{
    MAX_YEARS_OF_GROWTH, MIN_YEARS_OF_GROWTH, MONTHS_PER_YEAR, ProjectionSummary,
    SimulationConfig, SimulationPoint,
};

#[derive(Debug, Clone, Copy)]
struct Account {
    balance: f64,
    monthly_rate: f64,
}

impl Account {
    fn new(initial_deposit: f64, annual_rate: f64) -> Self {
        Self {
            balance: initial_deposit,
            monthly_rate: annual_rate / MONTHS_PER_YEAR as f64,
        }
    }

    fn step(&mut self, contribution: f64) {
        self.balance += contribution;
        self.balance *= 1.0 + self.monthly_rate;
    }

    fn reported(self) -> f64 {
        round_currency(self.balance)
    }
}

/// Runs the month-by-month projection for `config`.
///
/// Returns `years_of_growth * 12 + 1` points; month 0 is the starting state.
/// Contributions land before growth in every month. Rates that are negative
/// or non-finite are treated as missing data and replaced by 0.
pub fn simulate(config: &SimulationConfig) -> Result<Vec<SimulationPoint>, SimulationError> {
    validate_config(config)?;

    let primary_rate = usable_rate(config.primary_rate, "primary");
    let compare_rate = config
        .compare_rate
        .map(|rate| usable_rate(rate, "compare"));

    let total_months = config.total_months();
    let mut primary = Account::new(config.initial_deposit, primary_rate);
    let mut compare = compare_rate.map(|rate| Account::new(config.initial_deposit, rate));
    let mut total_deposits = config.initial_deposit;

    let mut points = Vec::with_capacity(total_months as usize + 1);
    points.push(point(0, primary, compare, total_deposits));

    for month in 1..=total_months {
        let contribution = config
            .contribution_frequency
            .contribution_for_month(config.contribution_amount, month);
        total_deposits += contribution;

        primary.step(contribution);
        if let Some(account) = compare.as_mut() {
            account.step(contribution);
        }

        points.push(point(month, primary, compare, total_deposits));
    }

    tracing::debug!(
        years = config.years_of_growth,
        primary_rate,
        compare_rate = ?compare_rate,
        points = points.len(),
        "projection computed"
    );

    Ok(points)
}

/// Checks the preconditions the input layer is expected to have enforced.
pub fn validate_config(config: &SimulationConfig) -> Result<(), SimulationError> {
    let years = config.years_of_growth;
    if !(MIN_YEARS_OF_GROWTH..=MAX_YEARS_OF_GROWTH).contains(&years) {
        return Err(SimulationError::InvalidConfiguration(format!(
            "years of growth must be between {MIN_YEARS_OF_GROWTH} and {MAX_YEARS_OF_GROWTH}, \
             got {years}"
        )));
    }

    for (name, value) in [
        ("initial deposit", config.initial_deposit),
        ("contribution amount", config.contribution_amount),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "{name} must be a finite amount >= 0, got {value}"
            )));
        }
    }

    Ok(())
}

pub fn summarize(points: &[SimulationPoint]) -> Option<ProjectionSummary> {
    let last = points.last()?;
    Some(ProjectionSummary {
        final_balance: last.balance,
        final_compare_balance: last.compare_balance,
        total_deposits: last.total_deposits,
        total_growth: last.balance - last.total_deposits,
        compare_difference: last.compare_balance.map(|compare| last.balance - compare),
    })
}

/// Points falling on whole years, month 0 included.
pub fn yearly_points(points: &[SimulationPoint]) -> Vec<SimulationPoint> {
    points
        .iter()
        .filter(|p| p.month % MONTHS_PER_YEAR == 0)
        .cloned()
        .collect()
}

fn usable_rate(rate: f64, series: &str) -> f64 {
    if rate.is_finite() && rate >= 0.0 {
        return rate;
    }
    tracing::warn!(series, rate, "unusable rate of return, projecting flat growth");
    0.0
}

fn point(
    month: u32,
    primary: Account,
    compare: Option<Account>,
    total_deposits: f64,
) -> SimulationPoint {
    SimulationPoint {
        month,
        year: month as f64 / MONTHS_PER_YEAR as f64,
        balance: primary.reported(),
        compare_balance: compare.map(Account::reported),
        total_deposits: round_currency(total_deposits),
    }
}

fn round_currency(value: f64) -> f64 {
    value.round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::annual_rate_from_percent;
    use crate::core::types::ContributionFrequency;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_config() -> SimulationConfig {
        SimulationConfig {
            initial_deposit: 5_000.0,
            years_of_growth: 1,
            primary_rate: 0.12,
            contribution_amount: 100.0,
            contribution_frequency: ContributionFrequency::Monthly,
            compare_rate: None,
        }
    }

    fn frequency_from_index(index: u8) -> ContributionFrequency {
        match index % 4 {
            0 => ContributionFrequency::Daily,
            1 => ContributionFrequency::Weekly,
            2 => ContributionFrequency::Monthly,
            _ => ContributionFrequency::Annually,
        }
    }

    #[test]
    fn monthly_contribution_is_added_before_growth() {
        let points = simulate(&sample_config()).expect("valid config");

        assert_eq!(points.len(), 13);
        assert_eq!(points[0].balance, 5_000.0);
        assert_eq!(points[1].balance, 5_151.0);
        assert_eq!(points[2].balance, 5_304.0);
        assert_eq!(points[12].balance, 6_915.0);
        assert_eq!(points[12].total_deposits, 6_200.0);
        assert_approx(points[12].year, 1.0);
    }

    #[test]
    fn annual_contribution_lands_in_first_month_of_each_year() {
        let mut config = sample_config();
        config.initial_deposit = 1_000.0;
        config.contribution_amount = 1_200.0;
        config.contribution_frequency = ContributionFrequency::Annually;
        config.primary_rate = 0.0;
        config.years_of_growth = 3;

        let points = simulate(&config).expect("valid config");
        assert_eq!(points[0].total_deposits, 1_000.0);
        assert_eq!(points[1].total_deposits, 2_200.0);
        for month in 2..=12 {
            assert_eq!(points[month].total_deposits, 2_200.0, "month {month}");
        }
        assert_eq!(points[13].total_deposits, 3_400.0);
        assert_eq!(points[24].total_deposits, 3_400.0);
        assert_eq!(points[25].total_deposits, 4_600.0);
        assert_eq!(points[36].balance, 4_600.0);
    }

    #[test]
    fn annual_contribution_compounds_from_month_one() {
        let mut config = sample_config();
        config.initial_deposit = 1_000.0;
        config.contribution_amount = 1_200.0;
        config.contribution_frequency = ContributionFrequency::Annually;
        config.primary_rate = 0.06;
        config.years_of_growth = 2;

        let points = simulate(&config).expect("valid config");
        assert_eq!(points[1].balance, 2_211.0);
        assert_eq!(points[12].balance, 2_336.0);
        assert_eq!(points[13].balance, 3_553.0);
        assert_eq!(points[24].balance, 3_754.0);
    }

    #[test]
    fn daily_and_weekly_contributions_use_monthly_equivalents() {
        let mut config = sample_config();
        config.initial_deposit = 0.0;
        config.primary_rate = 0.0;
        config.contribution_amount = 10.0;

        config.contribution_frequency = ContributionFrequency::Daily;
        let daily = simulate(&config).expect("valid config");
        assert_eq!(daily[1].total_deposits, 300.0);
        assert_eq!(daily[12].balance, 3_600.0);

        config.contribution_frequency = ContributionFrequency::Weekly;
        let weekly = simulate(&config).expect("valid config");
        assert_eq!(weekly[1].total_deposits, 40.0);
        assert_eq!(weekly[12].balance, 480.0);
    }

    #[test]
    fn daily_contributions_over_a_decade_match_loop() {
        let mut config = sample_config();
        config.initial_deposit = 10_000.0;
        config.contribution_amount = 10.0;
        config.contribution_frequency = ContributionFrequency::Daily;
        config.primary_rate = 0.08;
        config.years_of_growth = 10;

        let points = simulate(&config).expect("valid config");
        assert_eq!(points[120].balance, 77_446.0);
        assert_eq!(points[120].total_deposits, 46_000.0);
    }

    #[test]
    fn compare_series_starts_at_initial_deposit_and_tracks_its_own_rate() {
        let mut config = sample_config();
        config.compare_rate = Some(0.0);

        let points = simulate(&config).expect("valid config");
        assert_eq!(points[0].compare_balance, Some(5_000.0));
        assert_eq!(points[1].compare_balance, Some(5_100.0));
        assert_eq!(points[12].compare_balance, Some(6_200.0));
        assert_eq!(points[12].balance, 6_915.0);
    }

    #[test]
    fn flat_projection_without_contributions_keeps_initial_deposit() {
        let config = SimulationConfig {
            initial_deposit: 2_500.0,
            years_of_growth: 1,
            primary_rate: 0.0,
            contribution_amount: 0.0,
            contribution_frequency: ContributionFrequency::Monthly,
            compare_rate: None,
        };

        let points = simulate(&config).expect("valid config");
        assert!(points.iter().all(|p| p.balance == 2_500.0));
        assert!(points.iter().all(|p| p.total_deposits == 2_500.0));
    }

    #[test]
    fn non_finite_or_negative_rates_project_flat() {
        let mut config = sample_config();
        config.contribution_amount = 0.0;
        config.primary_rate = f64::NAN;
        config.compare_rate = Some(-0.05);

        let points = simulate(&config).expect("rates never reject");
        let last = points.last().expect("non-empty");
        assert_eq!(last.balance, 5_000.0);
        assert_eq!(last.compare_balance, Some(5_000.0));

        config.primary_rate = f64::INFINITY;
        let points = simulate(&config).expect("rates never reject");
        assert_eq!(points.last().map(|p| p.balance), Some(5_000.0));
    }

    #[test]
    fn rejects_years_outside_supported_range() {
        let mut config = sample_config();
        config.years_of_growth = 0;
        let err = simulate(&config).expect_err("zero years must be rejected");
        assert!(matches!(err, SimulationError::InvalidConfiguration(_)));

        config.years_of_growth = 101;
        let err = simulate(&config).expect_err("101 years must be rejected");
        assert!(err.to_string().contains("years of growth"));
    }

    #[test]
    fn rejects_negative_or_non_finite_amounts() {
        let mut config = sample_config();
        config.initial_deposit = -1.0;
        let err = simulate(&config).expect_err("negative deposit must be rejected");
        assert!(err.to_string().contains("initial deposit"));

        let mut config = sample_config();
        config.contribution_amount = f64::NAN;
        let err = simulate(&config).expect_err("NaN contribution must be rejected");
        assert!(err.to_string().contains("contribution amount"));
    }

    #[test]
    fn clamped_config_is_always_accepted() {
        let config = SimulationConfig {
            initial_deposit: -50.0,
            years_of_growth: 0,
            primary_rate: 0.07,
            contribution_amount: f64::NEG_INFINITY,
            contribution_frequency: ContributionFrequency::Weekly,
            compare_rate: None,
        }
        .clamped();

        assert_eq!(config.years_of_growth, 1);
        assert_approx(config.initial_deposit, 0.0);
        assert_approx(config.contribution_amount, 0.0);
        let points = simulate(&config).expect("clamped config is valid");
        assert_eq!(points.len(), 13);

        let long = SimulationConfig {
            years_of_growth: 250,
            ..config
        }
        .clamped();
        assert_eq!(long.years_of_growth, 100);
        assert_eq!(simulate(&long).map(|p| p.len()), Ok(1_201));
    }

    #[test]
    fn summary_reports_growth_and_compare_gap() {
        let mut config = sample_config();
        config.compare_rate = Some(0.0);
        let points = simulate(&config).expect("valid config");

        let summary = summarize(&points).expect("non-empty projection");
        assert_eq!(summary.final_balance, 6_915.0);
        assert_eq!(summary.total_deposits, 6_200.0);
        assert_eq!(summary.total_growth, 715.0);
        assert_eq!(summary.final_compare_balance, Some(6_200.0));
        assert_eq!(summary.compare_difference, Some(715.0));

        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn yearly_points_keep_whole_years_only() {
        let mut config = sample_config();
        config.years_of_growth = 3;
        let points = simulate(&config).expect("valid config");

        let yearly = yearly_points(&points);
        let months = yearly.iter().map(|p| p.month).collect::<Vec<_>>();
        assert_eq!(months, vec![0, 12, 24, 36]);
        assert_eq!(yearly[1], points[12]);
    }

    #[test]
    fn century_at_high_rate_keeps_growing_past_integer_range() {
        let config = SimulationConfig {
            initial_deposit: 10_000.0,
            years_of_growth: 100,
            primary_rate: annual_rate_from_percent(50.0, 100),
            contribution_amount: 0.0,
            contribution_frequency: ContributionFrequency::Monthly,
            compare_rate: Some(annual_rate_from_percent(50.0, 100)),
        };

        let points = simulate(&config).expect("valid config");
        for pair in points[840..].windows(2) {
            assert!(
                pair[1].balance > pair[0].balance,
                "balance stalled at month {}",
                pair[1].month
            );
        }

        let last = points.last().expect("non-empty");
        assert!(last.balance.is_finite());
        assert!(last.balance > i64::MAX as f64);
        assert_eq!(last.balance, last.balance.round());
        assert_eq!(last.compare_balance, Some(last.balance));

        let summary = summarize(&points).expect("non-empty projection");
        assert_eq!(summary.total_growth, last.balance - 10_000.0);
        assert_eq!(summary.compare_difference, Some(0.0));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_projection_shape_and_invariants(
            years in 1u32..=100,
            initial in 0u32..1_000_000,
            contribution in 0u32..5_000,
            frequency in 0u8..4,
            rate_bp in 0u32..2_500,
            compare_bp in proptest::option::of(0u32..2_500)
        ) {
            let config = SimulationConfig {
                initial_deposit: initial as f64,
                years_of_growth: years,
                primary_rate: rate_bp as f64 / 10_000.0,
                contribution_amount: contribution as f64,
                contribution_frequency: frequency_from_index(frequency),
                compare_rate: compare_bp.map(|bp| bp as f64 / 10_000.0),
            };

            let points = simulate(&config).expect("valid config");
            prop_assert_eq!(points.len(), years as usize * 12 + 1);
            prop_assert_eq!(points[0].balance, initial as f64);
            prop_assert_eq!(points[0].total_deposits, initial as f64);
            prop_assert_eq!(points[0].month, 0);

            match config.compare_rate {
                Some(_) => {
                    prop_assert_eq!(points[0].compare_balance, Some(initial as f64));
                    prop_assert!(points.iter().all(|p| p.compare_balance.is_some()));
                }
                None => prop_assert!(points.iter().all(|p| p.compare_balance.is_none())),
            }

            for pair in points.windows(2) {
                prop_assert_eq!(pair[1].month, pair[0].month + 1);
                prop_assert!(pair[1].total_deposits >= pair[0].total_deposits);
                prop_assert!(pair[1].balance >= pair[0].balance);
                if let (Some(prev), Some(next)) =
                    (pair[0].compare_balance, pair[1].compare_balance)
                {
                    prop_assert!(next >= prev);
                }
            }
        }

        #[test]
        fn prop_simulation_is_deterministic(
            years in 1u32..=40,
            initial in 0u32..200_000,
            contribution in 0u32..2_000,
            frequency in 0u8..4,
            rate_bp in 0u32..2_000
        ) {
            let config = SimulationConfig {
                initial_deposit: initial as f64,
                years_of_growth: years,
                primary_rate: rate_bp as f64 / 10_000.0,
                contribution_amount: contribution as f64,
                contribution_frequency: frequency_from_index(frequency),
                compare_rate: Some(0.05),
            };

            let first = simulate(&config).expect("valid config");
            let second = simulate(&config).expect("valid config");
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_zero_rate_balance_equals_deposits(
            years in 1u32..=30,
            initial in 0u32..100_000,
            contribution in 0u32..1_000,
            frequency in 0u8..4
        ) {
            let config = SimulationConfig {
                initial_deposit: initial as f64,
                years_of_growth: years,
                primary_rate: 0.0,
                contribution_amount: contribution as f64,
                contribution_frequency: frequency_from_index(frequency),
                compare_rate: None,
            };

            let points = simulate(&config).expect("valid config");
            for point in &points {
                prop_assert_eq!(point.balance, point.total_deposits);
            }
        }
    }
}
