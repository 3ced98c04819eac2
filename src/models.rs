use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    Facebook,
    Google,
    Other,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Facebook => "Facebook",
            Channel::Google => "Google",
            Channel::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "Lead Form")]
    LeadForm,
    #[serde(rename = "Lead Web")]
    LeadWeb,
    Other,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LeadForm => "Lead Form",
            Platform::LeadWeb => "Lead Web",
            Platform::Other => "Other",
        }
    }
}

// Variants are declared in label order so keyed output sorts alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Product {
    Dairy,
    Life,
    Other,
    Sucrose,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Dairy => "Dairy",
            Product::Life => "Life",
            Product::Other => "Other",
            Product::Sucrose => "Sucrose",
        }
    }
}

macro_rules! label_text {
    ($($ty:ident => [$($variant:ident),*]),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    [$($ty::$variant),*]
                        .into_iter()
                        .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
                        .ok_or_else(|| format!("unknown {} {s:?}", stringify!($ty).to_lowercase()))
                }
            }
        )*
    };
}

label_text!(
    Channel => [Facebook, Google, Other],
    Platform => [LeadForm, LeadWeb, Other],
    Product => [Dairy, Life, Other, Sucrose]
);

/// The three labels derived from a campaign identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Labels {
    pub product: Product,
    pub channel: Channel,
    pub platform: Platform,
}

/// One source row after parsing. Immutable once read.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub date: NaiveDate,
    pub campaign: Option<String>,
    pub measures: Measures,
}

/// Summable measures shared by raw rows and aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measures {
    pub spend: f64,
    pub lead: u64,
    pub clicks: u64,
    pub impressions: u64,
}

impl Measures {
    pub fn add(&mut self, other: &Measures) {
        self.spend += other.spend;
        self.lead = self.lead.saturating_add(other.lead);
        self.clicks = self.clicks.saturating_add(other.clicks);
        self.impressions = self.impressions.saturating_add(other.impressions);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Product")]
    pub product: Product,
    #[serde(rename = "Channel")]
    pub channel: Channel,
    #[serde(rename = "Platform")]
    pub platform: Platform,
    #[serde(rename = "Spend")]
    pub spend: f64,
    #[serde(rename = "Lead")]
    pub lead: u64,
    #[serde(rename = "Clicks")]
    pub clicks: u64,
    #[serde(rename = "Impressions")]
    pub impressions: u64,
    #[serde(rename = "CPL")]
    pub cpl: f64,
    #[serde(rename = "CTR")]
    pub ctr: f64,
    #[serde(rename = "Conversion_Rate")]
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CplStatus {
    #[serde(rename = "Above Benchmark")]
    AboveBenchmark,
    #[serde(rename = "Below Benchmark")]
    BelowBenchmark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "CPL stable — continue monitoring")]
    ContinueMonitoring,
    #[serde(rename = "CTR dropped >10% — refresh ad creative")]
    RefreshCreative,
    #[serde(rename = "CTR stable — test new audience segment")]
    TestNewAudience,
    #[serde(rename = "Monitor next period")]
    MonitorNextPeriod,
    #[serde(rename = "Insufficient CTR history — monitor next period")]
    InsufficientData,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::ContinueMonitoring => "CPL stable — continue monitoring",
            Recommendation::RefreshCreative => "CTR dropped >10% — refresh ad creative",
            Recommendation::TestNewAudience => "CTR stable — test new audience segment",
            Recommendation::MonitorNextPeriod => "Monitor next period",
            Recommendation::InsufficientData => "Insufficient CTR history — monitor next period",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CplStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CplStatus::AboveBenchmark => f.write_str("Above Benchmark"),
            CplStatus::BelowBenchmark => f.write_str("Below Benchmark"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Product")]
    pub product: Product,
    #[serde(rename = "Channel")]
    pub channel: Channel,
    #[serde(rename = "Platform")]
    pub platform: Platform,
    #[serde(rename = "Spend")]
    pub spend: f64,
    #[serde(rename = "Lead")]
    pub lead: u64,
    #[serde(rename = "Clicks")]
    pub clicks: u64,
    #[serde(rename = "Impressions")]
    pub impressions: u64,
    #[serde(rename = "Avg_CPL")]
    pub avg_cpl: f64,
    #[serde(rename = "Avg_CTR")]
    pub avg_ctr: f64,
    #[serde(rename = "Variance")]
    pub variance: f64,
    #[serde(rename = "CPL_Status")]
    pub cpl_status: CplStatus,
    #[serde(rename = "CTR_Change")]
    pub ctr_change: Option<f64>,
    #[serde(rename = "Recommendation")]
    pub recommendation: Recommendation,
}

impl MonthlyAggregate {
    pub fn period_label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}
