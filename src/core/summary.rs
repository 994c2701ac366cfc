use serde::Serialize;

use super::types::CalculationResult;

/// Headline figures for the summary cards, with each share of the end balance as a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub future_value: f64,
    pub total_contributions: f64,
    pub total_interest_earned: f64,
    pub principal_share_pct: f64,
    pub interest_share_pct: f64,
}

impl ProjectionSummary {
    pub fn from_result(result: &CalculationResult) -> Self {
        Self {
            future_value: result.end_balance,
            total_contributions: result.total_principal,
            total_interest_earned: result.total_interest,
            principal_share_pct: share_pct(result.total_principal, result.end_balance),
            interest_share_pct: share_pct(result.total_interest, result.end_balance),
        }
    }
}

fn share_pct(part: f64, whole: f64) -> f64 {
    if !whole.is_finite() || whole <= 0.0 || !part.is_finite() {
        return 0.0;
    }
    (part / whole * 100.0).clamp(0.0, 100.0)
}
