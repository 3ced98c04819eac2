use tracing::info;

use crate::aggregate::{classify_events, group_daily, group_monthly, DayKey};
use crate::config::PipelineConfig;
use crate::metrics;
use crate::models::{DailyAggregate, Measures, MonthlyAggregate, RawEvent};
use crate::trend;

#[derive(Debug, Clone, Default)]
pub struct AggregateTables {
    pub daily: Vec<DailyAggregate>,
    pub monthly: Vec<MonthlyAggregate>,
}

pub fn build_daily(groups: &[(DayKey, Measures)]) -> Vec<DailyAggregate> {
    groups
        .iter()
        .map(|(key, measures)| DailyAggregate {
            date: key.date,
            product: key.labels.product,
            channel: key.labels.channel,
            platform: key.labels.platform,
            spend: measures.spend,
            lead: measures.lead,
            clicks: measures.clicks,
            impressions: measures.impressions,
            cpl: metrics::cpl(measures),
            ctr: metrics::ctr(measures),
            conversion_rate: metrics::conversion_rate(measures),
        })
        .collect()
}

/// Classify, aggregate and derive both tables from date-valid rows.
pub fn build_tables(events: &[RawEvent], config: &PipelineConfig) -> AggregateTables {
    let classified = classify_events(events);
    let daily = build_daily(&group_daily(&classified));
    let monthly = trend::build_monthly(&group_monthly(&classified), config);

    info!(
        rows = events.len(),
        daily = daily.len(),
        monthly = monthly.len(),
        "built aggregate tables"
    );

    AggregateTables { daily, monthly }
}
