/// CPL threshold above which a month is flagged.
pub const BENCHMARK: f64 = 20.0;

/// Largest absolute CTR change still considered stable.
pub const CTR_DROP_THRESHOLD: f64 = 0.10;

pub const DEFAULT_CAMPAIGN_COLUMN: &str = "UTM Campaign";

pub const DAILY_FILE: &str = "dashboard_CPL_daily.csv";
pub const MONTHLY_FILE: &str = "dashboard_CPL_monthly.csv";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub benchmark: f64,
    pub ctr_drop_threshold: f64,
    pub campaign_column: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            benchmark: BENCHMARK,
            ctr_drop_threshold: CTR_DROP_THRESHOLD,
            campaign_column: DEFAULT_CAMPAIGN_COLUMN.to_string(),
        }
    }
}

pub fn log_format_is_json() -> bool {
    std::env::var("CPL_LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}
