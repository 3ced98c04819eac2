use std::collections::BTreeMap;
use std::fmt::Write;

use crate::metrics;
use crate::models::{Measures, MonthlyAggregate, Product, Recommendation};

#[derive(Debug, Clone)]
pub struct ProductSummary {
    pub product: Product,
    pub measures: Measures,
    pub blended_cpl: f64,
}

pub fn summarize_by_product(rows: &[MonthlyAggregate]) -> Vec<ProductSummary> {
    let mut map: BTreeMap<Product, Measures> = BTreeMap::new();

    for row in rows {
        map.entry(row.product).or_default().add(&Measures {
            spend: row.spend,
            lead: row.lead,
            clicks: row.clicks,
            impressions: row.impressions,
        });
    }

    let mut summaries: Vec<ProductSummary> = map
        .into_iter()
        .map(|(product, measures)| ProductSummary {
            product,
            blended_cpl: metrics::cpl(&measures),
            measures,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.measures
            .spend
            .partial_cmp(&a.measures.spend)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summaries
}

pub fn recommendation_mix(rows: &[MonthlyAggregate]) -> Vec<(Recommendation, usize)> {
    let mut counts: BTreeMap<Recommendation, usize> = BTreeMap::new();
    for row in rows {
        *counts.entry(row.recommendation).or_insert(0) += 1;
    }

    let mut mix: Vec<_> = counts.into_iter().collect();
    mix.sort_by(|a, b| b.1.cmp(&a.1));
    mix
}

pub fn build_report(rows: &[MonthlyAggregate], benchmark: f64) -> String {
    let summaries = summarize_by_product(rows);
    let mix = recommendation_mix(rows);

    let mut output = String::new();

    let _ = writeln!(output, "# Lead Gen CPL Report");
    let _ = writeln!(
        output,
        "Benchmark CPL ${:.2} across {} monthly rows",
        benchmark,
        rows.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Spend by Product");

    if summaries.is_empty() {
        let _ = writeln!(output, "No monthly rows available.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: spend {:.2}, {} leads (blended CPL {:.2})",
                summary.product, summary.measures.spend, summary.measures.lead, summary.blended_cpl
            );
        }
    }

    let mut above: Vec<&MonthlyAggregate> =
        rows.iter().filter(|row| row.avg_cpl > benchmark).collect();
    above.sort_by(|a, b| {
        b.variance
            .partial_cmp(&a.variance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let _ = writeln!(output);
    let _ = writeln!(output, "## Above Benchmark");

    if above.is_empty() {
        let _ = writeln!(output, "All rows are at or below the benchmark.");
    } else {
        for row in above.iter() {
            let change = row
                .ctr_change
                .map(|change| format!("{:+.1}%", change * 100.0))
                .unwrap_or_else(|| "n/a".to_string());
            let _ = writeln!(
                output,
                "- {} {} / {} / {}: CPL {:.2} (+{:.2}), CTR change {}. {}",
                row.period_label(),
                row.product,
                row.channel,
                row.platform,
                row.avg_cpl,
                row.variance,
                change,
                row.recommendation
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendation Mix");

    if mix.is_empty() {
        let _ = writeln!(output, "No recommendations recorded.");
    } else {
        for (recommendation, count) in mix.iter() {
            let _ = writeln!(output, "- {}: {} rows", recommendation, count);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Channel, CplStatus, Platform};

    fn row(
        month: u32,
        product: Product,
        spend: f64,
        lead: u64,
        change: Option<f64>,
    ) -> MonthlyAggregate {
        let avg_cpl = spend / lead.max(1) as f64;
        MonthlyAggregate {
            year: 2024,
            month,
            product,
            channel: Channel::Facebook,
            platform: Platform::LeadForm,
            spend,
            lead,
            clicks: 100,
            impressions: 1000,
            avg_cpl,
            avg_ctr: 10.0,
            variance: avg_cpl - 20.0,
            cpl_status: if avg_cpl > 20.0 {
                CplStatus::AboveBenchmark
            } else {
                CplStatus::BelowBenchmark
            },
            ctr_change: change,
            recommendation: if avg_cpl > 20.0 {
                Recommendation::RefreshCreative
            } else {
                Recommendation::ContinueMonitoring
            },
        }
    }

    #[test]
    fn product_totals_use_blended_cpl() {
        let rows = vec![
            row(1, Product::Life, 100.0, 10, None),
            row(2, Product::Life, 300.0, 10, Some(-0.2)),
            row(1, Product::Dairy, 50.0, 5, None),
        ];
        let summaries = summarize_by_product(&rows);
        assert_eq!(summaries[0].product, Product::Life);
        assert_eq!(summaries[0].measures.lead, 20);
        assert_eq!(summaries[0].blended_cpl, 20.0);
        assert_eq!(summaries[1].product, Product::Dairy);
    }

    #[test]
    fn report_lists_rows_above_benchmark() {
        let rows = vec![
            row(1, Product::Life, 100.0, 10, None),
            row(2, Product::Life, 300.0, 10, Some(-0.2)),
        ];
        let report = build_report(&rows, 20.0);

        assert!(report.starts_with("# Lead Gen CPL Report"));
        assert!(report.contains(
            "- 2024-02 Life / Facebook / Lead Form: CPL 30.00 (+10.00), CTR change -20.0%."
        ));
        assert!(!report.contains("2024-01 Life"));
        assert!(report.contains("- CPL stable — continue monitoring: 1 rows"));
    }

    #[test]
    fn empty_report_has_placeholders() {
        let report = build_report(&[], 20.0);
        assert!(report.contains("No monthly rows available."));
        assert!(report.contains("All rows are at or below the benchmark."));
    }
}
