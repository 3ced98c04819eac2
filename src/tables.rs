use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{DAILY_FILE, MONTHLY_FILE};
use crate::error::PipelineResult;
use crate::pipeline::AggregateTables;

pub fn write_rows<T: Serialize, W: io::Write>(writer: W, rows: &[T]) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_rows<T: DeserializeOwned, R: io::Read>(reader: R) -> PipelineResult<Vec<T>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Write both tables into `out_dir` and return their paths.
pub fn write_tables(
    out_dir: &Path,
    tables: &AggregateTables,
) -> anyhow::Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let daily_path = out_dir.join(DAILY_FILE);
    let monthly_path = out_dir.join(MONTHLY_FILE);

    let daily_file = std::fs::File::create(&daily_path)
        .with_context(|| format!("failed to create {}", daily_path.display()))?;
    write_rows(daily_file, &tables.daily)?;

    let monthly_file = std::fs::File::create(&monthly_path)
        .with_context(|| format!("failed to create {}", monthly_path.display()))?;
    write_rows(monthly_file, &tables.monthly)?;

    Ok((daily_path, monthly_path))
}

pub fn load_tables(daily_path: &Path, monthly_path: &Path) -> anyhow::Result<AggregateTables> {
    let daily_file = std::fs::File::open(daily_path)
        .with_context(|| format!("failed to open {}", daily_path.display()))?;
    let daily = read_rows(daily_file)
        .with_context(|| format!("failed to parse {}", daily_path.display()))?;

    let monthly_file = std::fs::File::open(monthly_path)
        .with_context(|| format!("failed to open {}", monthly_path.display()))?;
    let monthly = read_rows(monthly_file)
        .with_context(|| format!("failed to parse {}", monthly_path.display()))?;

    Ok(AggregateTables { daily, monthly })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::models::{
        Channel, CplStatus, DailyAggregate, MonthlyAggregate, Platform, Product, Recommendation,
    };

    #[test]
    fn daily_header_matches_dashboard_columns() {
        let row = DailyAggregate {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            product: Product::Life,
            channel: Channel::Facebook,
            platform: Platform::LeadForm,
            spend: 100.0,
            lead: 10,
            clicks: 50,
            impressions: 1000,
            cpl: 10.0,
            ctr: 5.0,
            conversion_rate: 20.0,
        };
        let mut buffer = Vec::new();
        write_rows(&mut buffer, &[row]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some(
                "Date,Product,Channel,Platform,Spend,Lead,Clicks,Impressions,\
                 CPL,CTR,Conversion_Rate"
            )
        );
        assert_eq!(
            lines.next(),
            Some("2024-01-01,Life,Facebook,Lead Form,100.0,10,50,1000,10.0,5.0,20.0")
        );
    }

    #[test]
    fn monthly_undefined_change_is_an_empty_cell() {
        let row = MonthlyAggregate {
            year: 2024,
            month: 2,
            product: Product::Dairy,
            channel: Channel::Google,
            platform: Platform::LeadWeb,
            spend: 250.0,
            lead: 10,
            clicks: 50,
            impressions: 1000,
            avg_cpl: 25.0,
            avg_ctr: 5.0,
            variance: 5.0,
            cpl_status: CplStatus::AboveBenchmark,
            ctr_change: None,
            recommendation: Recommendation::InsufficientData,
        };
        let mut buffer = Vec::new();
        write_rows(&mut buffer, &[row.clone()]).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();

        assert!(text.starts_with(
            "Year,Month,Product,Channel,Platform,Spend,Lead,Clicks,Impressions,\
             Avg_CPL,Avg_CTR,Variance,CPL_Status,CTR_Change,Recommendation\n"
        ));
        assert!(text.contains(",Above Benchmark,,Insufficient CTR history"));

        let loaded: Vec<MonthlyAggregate> = read_rows(buffer.as_slice()).unwrap();
        assert_eq!(loaded, vec![row]);
    }
}
