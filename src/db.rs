use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::error::{StoreError, StoreResult};
use crate::models::{NewStressRecord, StressRecord};

const SELECT_COLUMNS: &str = "SELECT id, date, stress_level, sleep_hours, mood, \
     activity_minutes, notes, created_at FROM stress_entries";

pub async fn connect(database_url: &str) -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    tracing::debug!(database_url, "connected to record store");
    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Stores one record and returns it as it now reads back from the store.
pub async fn insert_record(
    pool: &SqlitePool,
    record: &NewStressRecord,
    created_at: DateTime<Utc>,
) -> StoreResult<StressRecord> {
    let created_at = created_at.trunc_subsecs(3);
    let result = sqlx::query(
        r#"
        INSERT INTO stress_entries
        (date, stress_level, sleep_hours, mood, activity_minutes, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.date)
    .bind(record.stress_level)
    .bind(record.sleep_hours)
    .bind(record.mood)
    .bind(record.activity_minutes)
    .bind(&record.notes)
    .bind(created_at.timestamp_millis())
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    tracing::debug!(id, date = %record.date, "inserted stress entry");
    Ok(record.clone().into_record(id, created_at))
}

/// Stores all records in one transaction; either every row lands or none do.
pub async fn insert_records(
    pool: &SqlitePool,
    records: &[NewStressRecord],
    created_at: DateTime<Utc>,
) -> StoreResult<usize> {
    let created_at = created_at.trunc_subsecs(3).timestamp_millis();
    let mut tx = pool.begin().await?;

    for record in records {
        let inserted = sqlx::query(
            r#"
            INSERT INTO stress_entries
            (date, stress_level, sleep_hours, mood, activity_minutes, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.date)
        .bind(record.stress_level)
        .bind(record.sleep_hours)
        .bind(record.mood)
        .bind(record.activity_minutes)
        .bind(&record.notes)
        .bind(created_at)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            tracing::warn!(error = %err, date = %record.date, "batch insert failed, rolling back");
            tx.rollback().await?;
            return Err(err.into());
        }
    }

    tx.commit().await?;
    tracing::debug!(count = records.len(), "inserted stress entries");
    Ok(records.len())
}

/// Newest first: by date, then by insertion time.
pub async fn fetch_recent(pool: &SqlitePool, limit: usize) -> StoreResult<Vec<StressRecord>> {
    let query = format!("{SELECT_COLUMNS} ORDER BY date DESC, created_at DESC, id DESC LIMIT ?");
    let rows = sqlx::query(&query)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await?;
    rows.iter().map(record_from_row).collect()
}

/// Inclusive on both ends, oldest first.
pub async fn fetch_between(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> StoreResult<Vec<StressRecord>> {
    let query = format!(
        "{SELECT_COLUMNS} WHERE date BETWEEN ? AND ? ORDER BY date ASC, created_at ASC, id ASC"
    );
    let rows = sqlx::query(&query)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
    rows.iter().map(record_from_row).collect()
}

pub async fn fetch_by_date(pool: &SqlitePool, date: NaiveDate) -> StoreResult<Vec<StressRecord>> {
    let query = format!("{SELECT_COLUMNS} WHERE date = ? ORDER BY created_at DESC, id DESC");
    let rows = sqlx::query(&query).bind(date).fetch_all(pool).await?;
    rows.iter().map(record_from_row).collect()
}

pub async fn fetch_by_id(pool: &SqlitePool, id: i64) -> StoreResult<Option<StressRecord>> {
    let query = format!("{SELECT_COLUMNS} WHERE id = ?");
    let row = sqlx::query(&query).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(record_from_row).transpose()
}

pub async fn fetch_all(pool: &SqlitePool) -> StoreResult<Vec<StressRecord>> {
    let query = format!("{SELECT_COLUMNS} ORDER BY date ASC, created_at ASC, id ASC");
    let rows = sqlx::query(&query).fetch_all(pool).await?;
    rows.iter().map(record_from_row).collect()
}

/// Returns whether a record with `id` existed.
pub async fn delete_by_id(pool: &SqlitePool, id: i64) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM stress_entries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    tracing::debug!(id, deleted = result.rows_affected(), "delete stress entry");
    Ok(result.rows_affected() > 0)
}

pub async fn delete_all(pool: &SqlitePool) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM stress_entries")
        .execute(pool)
        .await?;
    tracing::info!(deleted = result.rows_affected(), "cleared stress entries");
    Ok(result.rows_affected())
}

pub async fn count(pool: &SqlitePool) -> StoreResult<i64> {
    let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM stress_entries")
        .fetch_one(pool)
        .await?
        .try_get("total")?;
    Ok(total)
}

fn record_from_row(row: &SqliteRow) -> StoreResult<StressRecord> {
    let id: i64 = row.try_get("id")?;
    let millis: i64 = row.try_get("created_at")?;
    let created_at = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StoreError::InvalidRow {
            id,
            reason: format!("created_at {millis} is out of range"),
        })?;

    Ok(StressRecord {
        id,
        date: row.try_get("date")?,
        stress_level: row.try_get("stress_level")?,
        sleep_hours: row.try_get("sleep_hours")?,
        mood: row.try_get("mood")?,
        activity_minutes: row.try_get("activity_minutes")?,
        notes: row.try_get("notes")?,
        created_at,
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    stress_level: i32,
    sleep_hours: f64,
    mood: i32,
    activity_minutes: i32,
    notes: Option<String>,
}

/// Parses interchange rows, clamping each into range.
pub fn read_csv<R: Read>(reader: R) -> StoreResult<Vec<NewStressRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        records.push(
            NewStressRecord {
                date: row.date,
                stress_level: row.stress_level,
                sleep_hours: row.sleep_hours,
                mood: row.mood,
                activity_minutes: row.activity_minutes,
                notes: row.notes,
            }
            .normalized(),
        );
    }

    Ok(records)
}

pub fn write_csv<W: Write>(writer: W, records: &[StressRecord]) -> StoreResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(CsvRow {
            date: record.date,
            stress_level: record.stress_level,
            sleep_hours: record.sleep_hours,
            mood: record.mood,
            activity_minutes: record.activity_minutes,
            notes: record.notes.clone(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub async fn import_csv(
    pool: &SqlitePool,
    csv_path: &Path,
    created_at: DateTime<Utc>,
) -> StoreResult<usize> {
    let file = std::fs::File::open(csv_path)?;
    let records = read_csv(file)?;
    insert_records(pool, &records, created_at).await
}

pub async fn export_csv(pool: &SqlitePool, csv_path: &Path) -> StoreResult<usize> {
    let records = fetch_all(pool).await?;
    let file = std::fs::File::create(csv_path)?;
    write_csv(file, &records)?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_db(&pool).await.unwrap();
        pool
    }

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 10).unwrap() + Duration::days(offset)
    }

    fn draft(offset: i64, stress_level: i32) -> NewStressRecord {
        NewStressRecord {
            date: day(offset),
            stress_level,
            sleep_hours: 6.75,
            mood: 3,
            activity_minutes: 25,
            notes: Some("Busy day at work".to_string()),
        }
    }

    #[tokio::test]
    async fn inserted_record_reads_back_unchanged() {
        let pool = memory_pool().await;
        let stored = insert_record(&pool, &draft(0, 6), Utc::now()).await.unwrap();

        let recent = fetch_recent(&pool, 30).await.unwrap();
        assert_eq!(recent, vec![stored.clone()]);
        assert_eq!(fetch_by_id(&pool, stored.id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_limited() {
        let pool = memory_pool().await;
        let base = Utc::now();
        insert_record(&pool, &draft(0, 3), base).await.unwrap();
        insert_record(&pool, &draft(2, 5), base).await.unwrap();
        let later = insert_record(&pool, &draft(2, 8), base + Duration::minutes(5))
            .await
            .unwrap();

        let recent = fetch_recent(&pool, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0], later);
        assert_eq!(recent[1].stress_level, 5);
    }

    #[tokio::test]
    async fn between_is_inclusive_and_ascending() {
        let pool = memory_pool().await;
        let records: Vec<NewStressRecord> = (0..5).rev().map(|offset| draft(offset, 4)).collect();
        assert_eq!(insert_records(&pool, &records, Utc::now()).await.unwrap(), 5);

        let window = fetch_between(&pool, day(1), day(3)).await.unwrap();
        let dates: Vec<NaiveDate> = window.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(fetch_by_date(&pool, day(4)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deletes_and_counts() {
        let pool = memory_pool().await;
        let first = insert_record(&pool, &draft(0, 2), Utc::now()).await.unwrap();
        insert_record(&pool, &draft(1, 9), Utc::now()).await.unwrap();
        assert_eq!(count(&pool).await.unwrap(), 2);

        assert!(delete_by_id(&pool, first.id).await.unwrap());
        assert!(!delete_by_id(&pool, first.id).await.unwrap());
        assert_eq!(count(&pool).await.unwrap(), 1);

        assert_eq!(delete_all(&pool).await.unwrap(), 1);
        assert_eq!(count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_row_rolls_back_whole_batch() {
        let pool = memory_pool().await;
        let mut out_of_range = draft(1, 5);
        out_of_range.stress_level = 42;
        let batch = vec![draft(0, 3), out_of_range, draft(2, 6)];

        let result = insert_records(&pool, &batch, Utc::now()).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(count(&pool).await.unwrap(), 0);

        assert_eq!(insert_records(&pool, &[draft(0, 3)], Utc::now()).await.unwrap(), 1);
    }

    #[test]
    fn csv_rows_are_normalized() {
        let raw = "date,stress_level,sleep_hours,mood,activity_minutes,notes\n\
                   2026-04-10,12,7.5,3,30,Long day\n\
                   2026-04-11,4,8,9,0,\n";
        let records = read_csv(raw.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].stress_level, 10);
        assert_eq!(records[0].notes.as_deref(), Some("Long day"));
        assert_eq!(records[1].mood, 5);
        assert_eq!(records[1].notes, None);
    }

    #[test]
    fn csv_export_can_be_read_back() {
        let stored = draft(0, 7).into_record(1, Utc::now());
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &[stored.clone()]).unwrap();

        let records = read_csv(buffer.as_slice()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, stored.date);
        assert_eq!(records[0].stress_level, 7);
        assert_eq!(records[0].notes, stored.notes);
    }

    #[test]
    fn csv_rejects_bad_dates() {
        let raw = "date,stress_level,sleep_hours,mood,activity_minutes,notes\n\
                   not-a-date,5,7,3,10,\n";
        assert!(matches!(read_csv(raw.as_bytes()), Err(StoreError::Csv(_))));
    }
}
