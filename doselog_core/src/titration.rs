//! Standard titration schedule.
//!
//! Static reference data, not derived from logged entries.

use serde::Serialize;

/// Recommended dose for one week of treatment
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TitrationStep {
    pub week: u32,
    pub dose_mg: f64,
}

const STANDARD_DOSES_MG: [f64; 8] = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 12.0, 12.0];

/// Weeks 1 through 8 of the standard schedule
pub fn standard_schedule() -> Vec<TitrationStep> {
    STANDARD_DOSES_MG
        .iter()
        .zip(1..)
        .map(|(&dose_mg, week)| TitrationStep { week, dose_mg })
        .collect()
}

/// Recommended dose for a 1-based week. Weeks past the table stay on the
/// maintenance dose.
pub fn recommended_dose(week: u32) -> Option<f64> {
    if week == 0 {
        return None;
    }
    let idx = (week as usize - 1).min(STANDARD_DOSES_MG.len() - 1);
    Some(STANDARD_DOSES_MG[idx])
}
