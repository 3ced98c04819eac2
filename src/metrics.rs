//! Ratio metrics over summed measures.
//!
//! A zero denominator is replaced by one. This is a business rule, not a
//! numeric guard: with no leads the reported CPL is the raw spend.

use crate::models::Measures;

fn guarded(denominator: u64) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        denominator as f64
    }
}

pub fn cpl(measures: &Measures) -> f64 {
    measures.spend / guarded(measures.lead)
}

/// Clicks per hundred impressions.
pub fn ctr(measures: &Measures) -> f64 {
    measures.clicks as f64 / guarded(measures.impressions) * 100.0
}

/// Leads per hundred clicks.
pub fn conversion_rate(measures: &Measures) -> f64 {
    measures.lead as f64 / guarded(measures.clicks) * 100.0
}
