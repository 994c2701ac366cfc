use super::types::{CalculationResult, CalculatorInputs, CompoundFrequency, YearlyData};

const MONTHS_PER_YEAR: u32 = 12;
const DAYS_PER_YEAR: f64 = 365.0;

/// Output of the month-stepped loop before the closed-form principal is applied.
#[derive(Debug, Clone)]
struct Trajectory {
    end_balance: f64,
    yearly_data: Vec<YearlyData>,
}

/// Running state of the account while stepping month by month.
#[derive(Debug)]
struct Account {
    balance: f64,
    principal: f64,
    // Balance at the start of the current compounding period (low-frequency path only).
    period_anchor: f64,
}

impl Account {
    fn open(initial_investment: f64) -> Self {
        Self {
            balance: initial_investment,
            principal: initial_investment,
            period_anchor: initial_investment,
        }
    }

    fn contribute(&mut self, amount: f64) {
        self.balance += amount;
        self.principal += amount;
    }

    fn snapshot(&self, year: u32) -> YearlyData {
        YearlyData {
            year,
            total_principal: self.principal,
            total_interest: self.balance - self.principal,
            balance: self.balance,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum AccrualRule {
    /// Whole balance grows by a fixed factor every month.
    DailyGrowth { monthly_factor: f64 },
    /// Whole balance earns `rate` every month.
    MonthlyRate { rate: f64 },
    /// Opening balance of each period earns `rate` at the period's last month.
    PeriodEnd { months_per_period: u32, rate: f64 },
}

impl AccrualRule {
    fn for_inputs(inputs: &CalculatorInputs) -> Self {
        let annual_rate = inputs.interest_rate / 100.0;
        let frequency = inputs.compound_frequency;
        match frequency {
            CompoundFrequency::Daily => {
                let daily_rate = annual_rate / DAYS_PER_YEAR;
                let days_per_month = DAYS_PER_YEAR / MONTHS_PER_YEAR as f64;
                AccrualRule::DailyGrowth {
                    monthly_factor: (1.0 + daily_rate).powf(days_per_month),
                }
            }
            CompoundFrequency::Monthly => AccrualRule::MonthlyRate {
                rate: annual_rate / MONTHS_PER_YEAR as f64,
            },
            CompoundFrequency::Annually
            | CompoundFrequency::Semiannually
            | CompoundFrequency::Quarterly => AccrualRule::PeriodEnd {
                months_per_period: frequency.months_per_period(),
                rate: annual_rate / frequency.periods_per_year() as f64,
            },
        }
    }

    fn apply(self, account: &mut Account, month: u64) {
        match self {
            AccrualRule::DailyGrowth { monthly_factor } => {
                account.balance *= monthly_factor;
            }
            AccrualRule::MonthlyRate { rate } => {
                let interest = account.balance * rate;
                account.balance += interest;
            }
            AccrualRule::PeriodEnd {
                months_per_period,
                rate,
            } => {
                if month % u64::from(months_per_period) == 0 {
                    let interest = account.period_anchor * rate;
                    account.balance += interest;
                    // Capitalizes the interest and every contribution made during the period.
                    account.period_anchor = account.balance;
                }
            }
        }
    }
}

/// Months in the horizon. Widened so any `u32` year count is representable.
fn total_months(years: u32) -> u64 {
    u64::from(years) * u64::from(MONTHS_PER_YEAR)
}

fn calculate_trajectory(inputs: &CalculatorInputs) -> Trajectory {
    let horizon_months = total_months(inputs.years);
    let months_per_year = u64::from(MONTHS_PER_YEAR);
    let rule = AccrualRule::for_inputs(inputs);
    let mut account = Account::open(inputs.initial_investment);

    let mut yearly_data = Vec::with_capacity(inputs.years as usize + 1);
    yearly_data.push(YearlyData {
        year: 0,
        total_principal: inputs.initial_investment,
        total_interest: 0.0,
        balance: inputs.initial_investment,
    });

    for month in 1..=horizon_months {
        // Contributions land at the start of the month, before interest.
        account.contribute(inputs.monthly_contribution);
        rule.apply(&mut account, month);

        if month % months_per_year == 0 {
            // month / 12 never exceeds `inputs.years`, so it fits back into u32.
            yearly_data.push(account.snapshot((month / months_per_year) as u32));
        }
    }

    Trajectory {
        end_balance: account.balance,
        yearly_data,
    }
}

/// Cash contributed over the whole horizon, computed without the loop's running sum.
pub fn exact_total_principal(inputs: &CalculatorInputs) -> f64 {
    inputs.initial_investment
        + inputs.monthly_contribution * inputs.years as f64 * MONTHS_PER_YEAR as f64
}

/// Runs the projection for `inputs`. Total over finite input; never validates.
pub fn calculate_compound_interest(inputs: &CalculatorInputs) -> CalculationResult {
    let trajectory = calculate_trajectory(inputs);
    let total_principal = exact_total_principal(inputs);

    CalculationResult {
        end_balance: trajectory.end_balance,
        total_principal,
        total_interest: trajectory.end_balance - total_principal,
        yearly_data: trajectory.yearly_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{Just, Strategy, prop_assert, prop_assert_eq, prop_oneof, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_rel(actual: f64, expected: f64) {
        let scale = expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= EPS * scale,
            "expected {expected}, got {actual}"
        );
    }

    fn inputs(
        initial_investment: f64,
        monthly_contribution: f64,
        years: u32,
        interest_rate: f64,
        compound_frequency: CompoundFrequency,
    ) -> CalculatorInputs {
        CalculatorInputs {
            initial_investment,
            monthly_contribution,
            years,
            interest_rate,
            compound_frequency,
        }
    }

    fn frequency_strategy() -> impl Strategy<Value = CompoundFrequency> {
        prop_oneof![
            Just(CompoundFrequency::Annually),
            Just(CompoundFrequency::Semiannually),
            Just(CompoundFrequency::Quarterly),
            Just(CompoundFrequency::Monthly),
            Just(CompoundFrequency::Daily),
        ]
    }

    #[test]
    fn annual_compounding_without_contributions_adds_one_year_of_interest() {
        let result =
            calculate_compound_interest(&inputs(10_000.0, 0.0, 1, 10.0, CompoundFrequency::Annually));
        assert_approx(result.end_balance, 11_000.0);
        assert_approx(result.total_principal, 10_000.0);
        assert_approx(result.total_interest, 1_000.0);
    }

    #[test]
    fn monthly_compounding_matches_closed_form() {
        let result =
            calculate_compound_interest(&inputs(1_000.0, 0.0, 1, 12.0, CompoundFrequency::Monthly));
        assert_rel(result.end_balance, 1_000.0 * 1.01f64.powi(12));
        assert!((result.end_balance - 1_126.83).abs() < 0.01);
    }

    #[test]
    fn annual_compounding_defers_interest_on_contributions_made_during_the_period() {
        let result =
            calculate_compound_interest(&inputs(0.0, 100.0, 1, 12.0, CompoundFrequency::Annually));
        assert_eq!(result.end_balance, 1_200.0);
        assert_eq!(result.total_interest, 0.0);
    }

    #[test]
    fn quarterly_anchor_capitalizes_contributions_at_period_end() {
        let result =
            calculate_compound_interest(&inputs(1_000.0, 100.0, 1, 8.0, CompoundFrequency::Quarterly));

        // Each quarter credits 2% on the opening balance, then folds in that quarter's deposits.
        let mut anchor = 1_000.0;
        for _ in 0..4 {
            anchor = anchor + 300.0 + anchor * 0.02;
        }
        assert_rel(result.end_balance, anchor);
        assert_approx(result.total_principal, 2_200.0);
    }

    #[test]
    fn semiannual_compounding_credits_twice_per_year() {
        let result = calculate_compound_interest(&inputs(
            2_000.0,
            0.0,
            3,
            6.0,
            CompoundFrequency::Semiannually,
        ));
        assert_rel(result.end_balance, 2_000.0 * 1.03f64.powi(6));
    }

    #[test]
    fn daily_compounding_uses_fractional_days_per_month() {
        let result =
            calculate_compound_interest(&inputs(1_000.0, 0.0, 1, 10.0, CompoundFrequency::Daily));
        let monthly_factor = (1.0 + 0.1 / 365.0f64).powf(365.0 / 12.0);
        assert_rel(result.end_balance, 1_000.0 * monthly_factor.powi(12));
        assert_rel(result.end_balance, 1_000.0 * (1.0 + 0.1 / 365.0f64).powi(365));
    }

    #[test]
    fn high_frequency_contributions_earn_interest_in_their_first_month() {
        let result =
            calculate_compound_interest(&inputs(0.0, 100.0, 1, 12.0, CompoundFrequency::Monthly));
        let expected = (1..=12).fold(0.0, |balance: f64, _| (balance + 100.0) * 1.01);
        assert_rel(result.end_balance, expected);
        assert!(result.total_interest > 0.0);
    }

    #[test]
    fn zero_years_yields_only_the_opening_point() {
        for frequency in CompoundFrequency::ALL {
            let result = calculate_compound_interest(&inputs(5_000.0, 250.0, 0, 9.0, frequency));
            assert_eq!(result.yearly_data.len(), 1);
            assert_eq!(result.yearly_data[0].year, 0);
            assert_eq!(result.end_balance, 5_000.0);
            assert_eq!(result.total_principal, 5_000.0);
            assert_eq!(result.total_interest, 0.0);
        }
    }

    #[test]
    fn default_inputs_reproduce_known_projection() {
        let result = calculate_compound_interest(&CalculatorInputs::default());
        assert_eq!(result.yearly_data.len(), 21);
        assert_approx(result.total_principal, 130_000.0);

        // Year 1: 700 interest on the opening 10k, contributions wait a period.
        let year_one = result.yearly_data[1];
        assert_approx(year_one.balance, 16_700.0);
        assert_approx(year_one.total_interest, 700.0);

        let mut anchor = 10_000.0;
        for _ in 0..20 {
            anchor = anchor + 6_000.0 + anchor * 0.07;
        }
        assert_rel(result.end_balance, anchor);
        assert_rel(result.total_interest, anchor - 130_000.0);
    }

    #[test]
    fn month_count_does_not_overflow_for_any_year_count() {
        assert_eq!(total_months(0), 0);
        assert_eq!(total_months(20), 240);
        assert_eq!(total_months(u32::MAX), u64::from(u32::MAX) * 12);
    }

    #[test]
    fn negative_contribution_still_produces_consistent_result() {
        let result =
            calculate_compound_interest(&inputs(1_000.0, -10.0, 2, 5.0, CompoundFrequency::Monthly));
        assert_eq!(result.yearly_data.len(), 3);
        assert_approx(result.total_principal, 760.0);
        assert_approx(
            result.total_interest,
            result.end_balance - result.total_principal,
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_total_principal_is_exact_closed_form(
            initial in 0u32..1_000_000,
            contribution_cents in 0u32..1_000_000,
            years in 0u32..101,
            rate_bp in 0u32..10_001,
            frequency in frequency_strategy()
        ) {
            let initial = initial as f64;
            let contribution = contribution_cents as f64 / 100.0;
            let inputs = inputs(initial, contribution, years, rate_bp as f64 / 100.0, frequency);
            let result = calculate_compound_interest(&inputs);

            prop_assert_eq!(result.total_principal, initial + contribution * years as f64 * 12.0);
            prop_assert_eq!(result.total_interest, result.end_balance - result.total_principal);
        }

        #[test]
        fn prop_samples_every_year_in_order(
            initial in 0u32..100_000,
            contribution in 0u32..5_000,
            years in 0u32..101,
            rate_bp in 0u32..10_001,
            frequency in frequency_strategy()
        ) {
            let inputs = inputs(initial as f64, contribution as f64, years, rate_bp as f64 / 100.0, frequency);
            let result = calculate_compound_interest(&inputs);

            prop_assert_eq!(result.yearly_data.len(), years as usize + 1);
            for (index, point) in result.yearly_data.iter().enumerate() {
                prop_assert_eq!(point.year as usize, index);
                let identity_gap = point.balance - (point.total_principal + point.total_interest);
                prop_assert!(identity_gap.abs() <= 1e-6 * point.balance.abs().max(1.0));
            }
            let last = result.yearly_data[result.yearly_data.len() - 1];
            prop_assert_eq!(last.balance, result.end_balance);
        }

        #[test]
        fn prop_zero_rate_earns_no_interest(
            initial in 0u32..1_000_000,
            contribution in 0u32..10_000,
            years in 0u32..101,
            frequency in frequency_strategy()
        ) {
            let inputs = inputs(initial as f64, contribution as f64, years, 0.0, frequency);
            let result = calculate_compound_interest(&inputs);

            for point in &result.yearly_data {
                prop_assert_eq!(point.total_interest, 0.0);
                prop_assert_eq!(point.balance, point.total_principal);
            }
            prop_assert_eq!(result.end_balance, exact_total_principal(&inputs));
        }

        #[test]
        fn prop_balance_never_decreases_year_over_year(
            initial in 0u32..1_000_000,
            contribution in 0u32..10_000,
            years in 1u32..61,
            rate_bp in 0u32..10_001,
            frequency in frequency_strategy()
        ) {
            let inputs = inputs(initial as f64, contribution as f64, years, rate_bp as f64 / 100.0, frequency);
            let result = calculate_compound_interest(&inputs);

            for window in result.yearly_data.windows(2) {
                prop_assert!(window[1].balance >= window[0].balance);
            }
        }

        #[test]
        fn prop_higher_rate_never_lowers_end_balance(
            initial in 0u32..1_000_000,
            contribution in 0u32..10_000,
            years in 1u32..41,
            rate_bp in 0u32..5_001,
            delta_bp in 1u32..2_001,
            frequency in frequency_strategy()
        ) {
            let lower = inputs(initial as f64, contribution as f64, years, rate_bp as f64 / 100.0, frequency);
            let mut higher = lower;
            higher.interest_rate += delta_bp as f64 / 100.0;

            let lower_result = calculate_compound_interest(&lower);
            let higher_result = calculate_compound_interest(&higher);
            prop_assert!(higher_result.end_balance + 1e-9 >= lower_result.end_balance);
        }
    }
}
