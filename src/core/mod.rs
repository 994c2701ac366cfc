mod engine;
mod summary;
mod types;

pub use engine::{calculate_compound_interest, exact_total_principal};
pub use summary::ProjectionSummary;
pub use types::{CalculationResult, CalculatorInputs, CompoundFrequency, YearlyData};
