use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundFrequency {
    #[default]
    Annually,
    Semiannually,
    Quarterly,
    Monthly,
    Daily,
}

impl CompoundFrequency {
    pub const ALL: [CompoundFrequency; 5] = [
        CompoundFrequency::Annually,
        CompoundFrequency::Semiannually,
        CompoundFrequency::Quarterly,
        CompoundFrequency::Monthly,
        CompoundFrequency::Daily,
    ];

    /// Number of times per year interest is capitalized.
    pub const fn periods_per_year(self) -> u32 {
        match self {
            CompoundFrequency::Annually => 1,
            CompoundFrequency::Semiannually => 2,
            CompoundFrequency::Quarterly => 4,
            CompoundFrequency::Monthly => 12,
            CompoundFrequency::Daily => 365,
        }
    }

    pub fn from_periods_per_year(periods: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|frequency| frequency.periods_per_year() == periods)
    }

    /// Length of one compounding period in months. Only meaningful below monthly.
    pub const fn months_per_period(self) -> u32 {
        match self {
            CompoundFrequency::Annually => 12,
            CompoundFrequency::Semiannually => 6,
            CompoundFrequency::Quarterly => 3,
            CompoundFrequency::Monthly | CompoundFrequency::Daily => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CompoundFrequency::Annually => "Annually",
            CompoundFrequency::Semiannually => "Semiannually",
            CompoundFrequency::Quarterly => "Quarterly",
            CompoundFrequency::Monthly => "Monthly",
            CompoundFrequency::Daily => "Daily",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorInputs {
    pub initial_investment: f64,
    pub monthly_contribution: f64,
    pub years: u32,
    /// Nominal annual rate in percent, e.g. 7.0 for 7%.
    pub interest_rate: f64,
    pub compound_frequency: CompoundFrequency,
}

impl Default for CalculatorInputs {
    fn default() -> Self {
        Self {
            initial_investment: 10_000.0,
            monthly_contribution: 500.0,
            years: 20,
            interest_rate: 7.0,
            compound_frequency: CompoundFrequency::Annually,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyData {
    pub year: u32,
    pub total_principal: f64,
    pub total_interest: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub end_balance: f64,
    pub total_principal: f64,
    pub total_interest: f64,
    pub yearly_data: Vec<YearlyData>,
}
