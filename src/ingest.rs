use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{Measures, RawEvent};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    MissingDate,
    UnparseableDate(String),
    InvalidMeasure { column: &'static str, value: String },
    InvalidEncoding { column: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingDate => write!(f, "missing date"),
            RejectReason::UnparseableDate(value) => write!(f, "unparseable date {value:?}"),
            RejectReason::InvalidMeasure { column, value } => {
                write!(f, "invalid {column} value {value:?}")
            }
            RejectReason::InvalidEncoding { column } => write!(f, "invalid UTF-8 in {column}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RowRejection {
    pub partition: String,
    pub line: u64,
    pub reason: RejectReason,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub events: Vec<RawEvent>,
    pub partitions_read: Vec<String>,
    pub partitions_skipped: Vec<String>,
    pub rejections: Vec<RowRejection>,
}

#[derive(Debug, Default)]
pub struct PartitionRows {
    pub events: Vec<RawEvent>,
    pub rejections: Vec<RowRejection>,
}

struct ColumnIndex {
    date: usize,
    campaign: usize,
    spend: usize,
    lead: usize,
    clicks: usize,
    impressions: usize,
}

pub fn partition_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read every partition and concatenate the rows that parse.
///
/// Unreadable partitions are logged and skipped; the call only fails when a
/// partition lacks a required column or when nothing could be read at all.
pub fn load_partitions(paths: &[PathBuf], campaign_column: &str) -> PipelineResult<IngestReport> {
    let mut report = IngestReport::default();

    for path in paths {
        let name = partition_name(path);
        let outcome = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| PipelineError::SourceRead {
                partition: name.clone(),
                source,
            })
            .and_then(|reader| read_partition(&name, reader, campaign_column));

        match outcome {
            Ok(rows) => {
                info!(
                    partition = %name,
                    rows = rows.events.len(),
                    rejected = rows.rejections.len(),
                    "read source partition"
                );
                report.events.extend(rows.events);
                report.rejections.extend(rows.rejections);
                report.partitions_read.push(name);
            }
            Err(err @ PipelineError::SourceRead { .. }) => {
                warn!(partition = %name, error = %err, "skipping unreadable partition");
                report.partitions_skipped.push(name);
            }
            Err(err) => return Err(err),
        }
    }

    if report.partitions_read.is_empty() {
        return Err(PipelineError::NoPartitions {
            attempted: paths.len(),
        });
    }

    if !report.rejections.is_empty() {
        warn!(
            rejected = report.rejections.len(),
            "rows excluded from aggregation"
        );
    }

    Ok(report)
}

pub fn read_partition<R: io::Read>(
    name: &str,
    mut reader: csv::Reader<R>,
    campaign_column: &str,
) -> PipelineResult<PartitionRows> {
    let headers = reader
        .headers()
        .map_err(|source| PipelineError::SourceRead {
            partition: name.to_string(),
            source,
        })?
        .clone();
    let columns = resolve_columns(&headers, name, campaign_column)?;
    let mut rows = PartitionRows::default();

    // Rows are decoded one at a time so a bad byte only costs its own row.
    for result in reader.byte_records() {
        let record = result.map_err(|source| PipelineError::SourceRead {
            partition: name.to_string(),
            source,
        })?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();

        let parsed = StringRecord::from_byte_record(record)
            .map_err(|err| {
                let field = err.utf8_error().field();
                RejectReason::InvalidEncoding {
                    column: headers
                        .get(field)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("field {}", field + 1)),
                }
            })
            .and_then(|record| parse_record(&record, &columns));

        match parsed {
            Ok(event) => rows.events.push(event),
            Err(reason) => {
                debug!(partition = name, line, %reason, "rejected row");
                rows.rejections.push(RowRejection {
                    partition: name.to_string(),
                    line,
                    reason,
                });
            }
        }
    }

    Ok(rows)
}

fn resolve_columns(
    headers: &StringRecord,
    partition: &str,
    campaign_column: &str,
) -> PipelineResult<ColumnIndex> {
    let find = |name: &str| headers.iter().position(|header| header == name);
    let require = |name: &str| {
        find(name).ok_or_else(|| PipelineError::MissingColumn {
            partition: partition.to_string(),
            column: name.to_string(),
        })
    };

    // Sheets label the date column "Day"; "Date" is accepted as well.
    let date = find("Day").or_else(|| find("Date")).ok_or_else(|| {
        PipelineError::MissingColumn {
            partition: partition.to_string(),
            column: "Day".to_string(),
        }
    })?;

    Ok(ColumnIndex {
        date,
        campaign: require(campaign_column)?,
        spend: require("Spend")?,
        lead: require("Lead")?,
        clicks: require("Clicks")?,
        impressions: require("Impressions")?,
    })
}

fn parse_record(record: &StringRecord, columns: &ColumnIndex) -> Result<RawEvent, RejectReason> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let raw_date = field(columns.date);
    if raw_date.is_empty() {
        return Err(RejectReason::MissingDate);
    }
    let date =
        parse_date(raw_date).ok_or_else(|| RejectReason::UnparseableDate(raw_date.to_string()))?;

    let campaign = Some(field(columns.campaign))
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let invalid = |column: &'static str, idx: usize| RejectReason::InvalidMeasure {
        column,
        value: field(idx).to_string(),
    };

    let measures = Measures {
        spend: parse_amount(field(columns.spend)).ok_or_else(|| invalid("Spend", columns.spend))?,
        lead: parse_count(field(columns.lead)).ok_or_else(|| invalid("Lead", columns.lead))?,
        clicks: parse_count(field(columns.clicks))
            .ok_or_else(|| invalid("Clicks", columns.clicks))?,
        impressions: parse_count(field(columns.impressions))
            .ok_or_else(|| invalid("Impressions", columns.impressions))?,
    };

    Ok(RawEvent {
        date,
        campaign,
        measures,
    })
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                .ok()
                .map(|datetime| datetime.date())
        })
}

/// Empty cells count as zero.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    if cleaned.is_empty() {
        return Some(0.0);
    }

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn parse_count(raw: &str) -> Option<u64> {
    let value = parse_amount(raw)?;
    if value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return None;
    }
    Some(value as u64)
}
