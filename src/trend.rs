use std::collections::HashMap;

use crate::aggregate::MonthKey;
use crate::config::PipelineConfig;
use crate::metrics;
use crate::models::{CplStatus, Labels, Measures, MonthlyAggregate, Recommendation};

pub fn cpl_status(avg_cpl: f64, benchmark: f64) -> CplStatus {
    if avg_cpl > benchmark {
        CplStatus::AboveBenchmark
    } else {
        CplStatus::BelowBenchmark
    }
}

/// Relative change from `previous` to `current`.
///
/// Growth from a zero baseline is infinite, so it lands on "monitor next
/// period"; zero to zero is no change.
pub fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        return if current == 0.0 { 0.0 } else { f64::INFINITY };
    }
    (current - previous) / previous
}

pub fn recommend(
    avg_cpl: f64,
    ctr_change: Option<f64>,
    benchmark: f64,
    drop_threshold: f64,
) -> Recommendation {
    if avg_cpl <= benchmark {
        return Recommendation::ContinueMonitoring;
    }

    match ctr_change {
        None => Recommendation::InsufficientData,
        Some(change) if change < -drop_threshold => Recommendation::RefreshCreative,
        Some(change) if change.abs() <= drop_threshold => Recommendation::TestNewAudience,
        Some(_) => Recommendation::MonitorNextPeriod,
    }
}

/// Build monthly rows from grouped sums.
///
/// Groups arrive in key order, so every (Product, Channel, Platform) series is
/// already ascending by (Year, Month) and the previous CTR per series is all
/// the state the pass needs.
pub fn build_monthly(
    groups: &[(MonthKey, Measures)],
    config: &PipelineConfig,
) -> Vec<MonthlyAggregate> {
    let mut previous_ctr: HashMap<Labels, f64> = HashMap::new();
    let mut rows = Vec::with_capacity(groups.len());

    for (key, measures) in groups {
        let avg_cpl = metrics::cpl(measures);
        let avg_ctr = metrics::ctr(measures);
        let ctr_change = previous_ctr
            .insert(key.labels, avg_ctr)
            .map(|previous| percent_change(previous, avg_ctr));

        rows.push(MonthlyAggregate {
            year: key.year,
            month: key.month,
            product: key.labels.product,
            channel: key.labels.channel,
            platform: key.labels.platform,
            spend: measures.spend,
            lead: measures.lead,
            clicks: measures.clicks,
            impressions: measures.impressions,
            avg_cpl,
            avg_ctr,
            variance: avg_cpl - config.benchmark,
            cpl_status: cpl_status(avg_cpl, config.benchmark),
            ctr_change,
            recommendation: recommend(
                avg_cpl,
                ctr_change,
                config.benchmark,
                config.ctr_drop_threshold,
            ),
        });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Channel, Platform, Product};

    const BENCH: f64 = 20.0;
    const DROP: f64 = 0.10;

    fn labels(product: Product) -> Labels {
        Labels {
            product,
            channel: Channel::Google,
            platform: Platform::LeadWeb,
        }
    }

    fn group(
        year: i32,
        month: u32,
        product: Product,
        spend: f64,
        lead: u64,
        clicks: u64,
    ) -> (MonthKey, Measures) {
        (
            MonthKey {
                year,
                month,
                labels: labels(product),
            },
            Measures {
                spend,
                lead,
                clicks,
                impressions: 1000,
            },
        )
    }

    #[test]
    fn first_period_per_group_has_no_ctr_change() {
        let groups = vec![
            group(2024, 1, Product::Dairy, 100.0, 10, 50),
            group(2024, 1, Product::Life, 100.0, 10, 40),
            group(2024, 2, Product::Dairy, 100.0, 10, 40),
            group(2024, 2, Product::Life, 100.0, 10, 60),
        ];
        let rows = build_monthly(&groups, &PipelineConfig::default());

        assert_eq!(rows[0].ctr_change, None);
        assert_eq!(rows[1].ctr_change, None);
        assert!((rows[2].ctr_change.unwrap() - (-0.2)).abs() < 1e-9);
        assert!((rows[3].ctr_change.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn change_spans_year_boundary() {
        let groups = vec![
            group(2024, 12, Product::Life, 100.0, 1, 50),
            group(2025, 1, Product::Life, 100.0, 1, 48),
        ];
        let rows = build_monthly(&groups, &PipelineConfig::default());
        assert!((rows[1].ctr_change.unwrap() - (-0.04)).abs() < 1e-9);
        assert_eq!(rows[1].recommendation, Recommendation::TestNewAudience);
    }

    #[test]
    fn benchmark_derivations() {
        let groups = vec![group(2024, 1, Product::Life, 250.0, 10, 50)];
        let row = &build_monthly(&groups, &PipelineConfig::default())[0];
        assert_eq!(row.avg_cpl, 25.0);
        assert!((row.avg_ctr - 5.0).abs() < 1e-9);
        assert_eq!(row.variance, 5.0);
        assert_eq!(row.cpl_status, CplStatus::AboveBenchmark);
        assert_eq!(row.recommendation, Recommendation::InsufficientData);
    }

    #[test]
    fn cpl_at_benchmark_is_below() {
        assert_eq!(cpl_status(20.0, BENCH), CplStatus::BelowBenchmark);
        assert_eq!(cpl_status(20.01, BENCH), CplStatus::AboveBenchmark);
    }

    #[test]
    fn low_cpl_short_circuits_recommendation() {
        for change in [None, Some(-0.9), Some(0.0), Some(3.0)] {
            assert_eq!(
                recommend(15.0, change, BENCH, DROP),
                Recommendation::ContinueMonitoring
            );
        }
    }

    #[test]
    fn recommendation_priority_above_benchmark() {
        assert_eq!(recommend(25.0, Some(-0.11), BENCH, DROP), Recommendation::RefreshCreative);
        assert_eq!(recommend(25.0, Some(-0.05), BENCH, DROP), Recommendation::TestNewAudience);
        assert_eq!(recommend(25.0, Some(0.10), BENCH, DROP), Recommendation::TestNewAudience);
        assert_eq!(recommend(25.0, Some(0.25), BENCH, DROP), Recommendation::MonitorNextPeriod);
        assert_eq!(recommend(25.0, None, BENCH, DROP), Recommendation::InsufficientData);
    }

    #[test]
    fn zero_baseline_change_is_infinite_or_flat() {
        assert_eq!(percent_change(0.0, 5.0), f64::INFINITY);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(4.0, 5.0), 0.25);
    }

    #[test]
    fn second_month_after_zero_ctr_is_monitored() {
        let groups = vec![
            group(2024, 1, Product::Life, 100.0, 1, 0),
            group(2024, 2, Product::Life, 100.0, 1, 50),
        ];
        let rows = build_monthly(&groups, &PipelineConfig::default());

        assert_eq!(rows[0].ctr_change, None);
        assert_eq!(rows[0].recommendation, Recommendation::InsufficientData);
        assert_eq!(rows[1].ctr_change, Some(f64::INFINITY));
        assert_eq!(rows[1].recommendation, Recommendation::MonitorNextPeriod);
    }
}
