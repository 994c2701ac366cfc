use crate::core::{CalculationResult, CalculatorInputs};

pub const MAX_WORDS: u32 = 150;

pub fn build_prompt(inputs: &CalculatorInputs, result: &CalculationResult) -> String {
    format!(
        "You are a friendly financial educator reviewing an investment projection.\n\
         \n\
         Scenario:\n\
         - Initial investment: ${initial}\n\
         - Monthly contribution: ${monthly}\n\
         - Time period: {years} years\n\
         - Annual interest rate: {rate}%\n\
         - Compounding: {frequency} ({periods} times/year)\n\
         \n\
         Projection:\n\
         - Future value: ${future:.2}\n\
         - Total interest earned: ${interest:.2}\n\
         \n\
         Write a concise, encouraging summary of at most {max_words} words that shows how \
         compounding drives this particular outcome. Format with markdown. Keep it educational \
         and do not give specific legal or financial advice.",
        initial = inputs.initial_investment,
        monthly = inputs.monthly_contribution,
        years = inputs.years,
        rate = inputs.interest_rate,
        frequency = inputs.compound_frequency.label(),
        periods = inputs.compound_frequency.periods_per_year(),
        future = result.end_balance,
        interest = result.total_interest,
        max_words = MAX_WORDS,
    )
}
