use anyhow::Context;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::pipeline::AggregateTables;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn bigint(value: u64, column: &str) -> anyhow::Result<i64> {
    i64::try_from(value).with_context(|| format!("{column} value {value} exceeds BIGINT"))
}

/// Store both tables under a fresh run id inside one transaction.
pub async fn publish(
    pool: &PgPool,
    tables: &AggregateTables,
    benchmark: f64,
) -> anyhow::Result<Uuid> {
    let run_id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO cpl_dashboard.pipeline_runs (id, benchmark, daily_rows, monthly_rows)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(run_id)
    .bind(benchmark)
    .bind(i32::try_from(tables.daily.len()).context("too many daily rows")?)
    .bind(i32::try_from(tables.monthly.len()).context("too many monthly rows")?)
    .execute(&mut *tx)
    .await?;

    for row in &tables.daily {
        sqlx::query(
            r#"
            INSERT INTO cpl_dashboard.daily_cpl
            (run_id, day, product, channel, platform, spend, lead, clicks, impressions,
             cpl, ctr, conversion_rate)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(run_id)
        .bind(row.date)
        .bind(row.product.as_str())
        .bind(row.channel.as_str())
        .bind(row.platform.as_str())
        .bind(row.spend)
        .bind(bigint(row.lead, "Lead")?)
        .bind(bigint(row.clicks, "Clicks")?)
        .bind(bigint(row.impressions, "Impressions")?)
        .bind(row.cpl)
        .bind(row.ctr)
        .bind(row.conversion_rate)
        .execute(&mut *tx)
        .await?;
    }

    for row in &tables.monthly {
        sqlx::query(
            r#"
            INSERT INTO cpl_dashboard.monthly_cpl
            (run_id, year, month, product, channel, platform, spend, lead, clicks, impressions,
             avg_cpl, avg_ctr, variance, cpl_status, ctr_change, recommendation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(run_id)
        .bind(row.year)
        .bind(row.month as i32)
        .bind(row.product.as_str())
        .bind(row.channel.as_str())
        .bind(row.platform.as_str())
        .bind(row.spend)
        .bind(bigint(row.lead, "Lead")?)
        .bind(bigint(row.clicks, "Clicks")?)
        .bind(bigint(row.impressions, "Impressions")?)
        .bind(row.avg_cpl)
        .bind(row.avg_ctr)
        .bind(row.variance)
        .bind(row.cpl_status.to_string())
        .bind(row.ctr_change)
        .bind(row.recommendation.as_str())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        %run_id,
        daily = tables.daily.len(),
        monthly = tables.monthly.len(),
        "published aggregate tables"
    );

    Ok(run_id)
}
