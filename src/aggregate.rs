use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::classify::classify;
use crate::models::{Labels, Measures, RawEvent};

/// Daily grouping key: (Date, Product, Channel, Platform).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DayKey {
    pub date: NaiveDate,
    pub labels: Labels,
}

/// Monthly grouping key: (Year, Month, Product, Channel, Platform).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
    pub labels: Labels,
}

/// A classified row, labels attached once and shared by both groupings.
#[derive(Debug, Clone)]
pub struct ClassifiedEvent {
    pub date: NaiveDate,
    pub labels: Labels,
    pub measures: Measures,
}

pub fn classify_events(events: &[RawEvent]) -> Vec<ClassifiedEvent> {
    events
        .iter()
        .map(|event| ClassifiedEvent {
            date: event.date,
            labels: classify(event.campaign.as_deref()),
            measures: event.measures,
        })
        .collect()
}

/// Sum measures per key. Only keys present in the input appear, in key order.
pub fn group_by<K, F>(events: &[ClassifiedEvent], key: F) -> Vec<(K, Measures)>
where
    K: Ord,
    F: Fn(&ClassifiedEvent) -> K,
{
    let mut groups: BTreeMap<K, Measures> = BTreeMap::new();

    for event in events {
        groups.entry(key(event)).or_default().add(&event.measures);
    }

    groups.into_iter().collect()
}

pub fn group_daily(events: &[ClassifiedEvent]) -> Vec<(DayKey, Measures)> {
    group_by(events, |event| DayKey {
        date: event.date,
        labels: event.labels,
    })
}

pub fn group_monthly(events: &[ClassifiedEvent]) -> Vec<(MonthKey, Measures)> {
    group_by(events, |event| MonthKey {
        year: event.date.year(),
        month: event.date.month(),
        labels: event.labels,
    })
}
