//! Dashboard query layer over the precomputed tables.
//!
//! The state is loaded once and never mutated; every interaction is a call to
//! [`render`] with the current filter selection.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Channel, DailyAggregate, MonthlyAggregate, Platform, Product};
use crate::pipeline::AggregateTables;

#[derive(Debug, Clone)]
pub struct DashboardState {
    daily: Vec<DailyAggregate>,
    monthly: Vec<MonthlyAggregate>,
    options: FilterOptions,
    benchmark: f64,
}

/// Empty sets place no restriction. Missing dates default to the daily bounds.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub products: BTreeSet<Product>,
    pub platforms: BTreeSet<Platform>,
    pub channels: BTreeSet<Channel>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub products: Vec<Product>,
    pub platforms: Vec<Platform>,
    pub channels: Vec<Channel>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Ok,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkAlert {
    pub level: AlertLevel,
    pub rows_above: usize,
    pub benchmark: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint<X> {
    pub x: X,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series<X> {
    pub platform: Platform,
    pub points: Vec<SeriesPoint<X>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub daily_cpl: Vec<Series<NaiveDate>>,
    pub monthly_cpl: Vec<Series<String>>,
    pub alert: BenchmarkAlert,
    pub options: FilterOptions,
    pub daily_rows: usize,
    pub monthly_rows: usize,
}

impl DashboardState {
    pub fn new(tables: AggregateTables, benchmark: f64) -> Self {
        let options = FilterOptions::from_daily(&tables.daily);
        Self {
            daily: tables.daily,
            monthly: tables.monthly,
            options,
            benchmark,
        }
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.options
    }

    /// Apply the categorical predicates to both tables and the inclusive date
    /// range to the daily table.
    pub fn filter(&self, filters: &Filters) -> (Vec<&DailyAggregate>, Vec<&MonthlyAggregate>) {
        let start = filters.start.or(self.options.min_date);
        let end = filters.end.or(self.options.max_date);

        let daily = self
            .daily
            .iter()
            .filter(|row| filters.matches(row.product, row.platform, row.channel))
            .filter(|row| start.map_or(true, |start| row.date >= start))
            .filter(|row| end.map_or(true, |end| row.date <= end))
            .collect();

        let monthly = self
            .monthly
            .iter()
            .filter(|row| filters.matches(row.product, row.platform, row.channel))
            .collect();

        (daily, monthly)
    }
}

impl FilterOptions {
    /// Dropdown values and date-picker bounds, taken from the daily table.
    fn from_daily(daily: &[DailyAggregate]) -> Self {
        let products: BTreeSet<_> = daily.iter().map(|row| row.product).collect();
        let platforms: BTreeSet<_> = daily.iter().map(|row| row.platform).collect();
        let channels: BTreeSet<_> = daily.iter().map(|row| row.channel).collect();

        Self {
            products: products.into_iter().collect(),
            platforms: platforms.into_iter().collect(),
            channels: channels.into_iter().collect(),
            min_date: daily.iter().map(|row| row.date).min(),
            max_date: daily.iter().map(|row| row.date).max(),
        }
    }
}

impl Filters {
    fn matches(&self, product: Product, platform: Platform, channel: Channel) -> bool {
        (self.products.is_empty() || self.products.contains(&product))
            && (self.platforms.is_empty() || self.platforms.contains(&platform))
            && (self.channels.is_empty() || self.channels.contains(&channel))
    }
}

pub fn benchmark_alert(monthly: &[&MonthlyAggregate], benchmark: f64) -> BenchmarkAlert {
    let rows_above = monthly.iter().filter(|row| row.avg_cpl > benchmark).count();

    if rows_above > 0 {
        BenchmarkAlert {
            level: AlertLevel::Warning,
            rows_above,
            benchmark,
            message: format!(
                "{rows_above} platform rows have CPL > ${benchmark}. Campaigns need re-optimizing."
            ),
        }
    } else {
        BenchmarkAlert {
            level: AlertLevel::Ok,
            rows_above,
            benchmark,
            message: format!(
                "All platform rows have CPL <= ${benchmark}. Performance is stable."
            ),
        }
    }
}

fn series_by_platform<X, I>(points: I) -> Vec<Series<X>>
where
    X: Ord,
    I: IntoIterator<Item = (Platform, X, f64)>,
{
    let mut grouped: BTreeMap<Platform, Vec<SeriesPoint<X>>> = BTreeMap::new();
    for (platform, x, y) in points {
        grouped.entry(platform).or_default().push(SeriesPoint { x, y });
    }

    grouped
        .into_iter()
        .map(|(platform, mut points)| {
            points.sort_by(|a, b| a.x.cmp(&b.x));
            Series { platform, points }
        })
        .collect()
}

pub fn render(state: &DashboardState, filters: &Filters) -> DashboardView {
    let (daily, monthly) = state.filter(filters);

    let daily_cpl =
        series_by_platform(daily.iter().map(|row| (row.platform, row.date, row.cpl)));
    let monthly_cpl = series_by_platform(
        monthly
            .iter()
            .map(|row| (row.platform, row.period_label(), row.avg_cpl)),
    );

    DashboardView {
        daily_cpl,
        monthly_cpl,
        alert: benchmark_alert(&monthly, state.benchmark),
        options: state.filter_options().clone(),
        daily_rows: daily.len(),
        monthly_rows: monthly.len(),
    }
}
