use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{parse_datetime, parse_outcome, to_limit, to_service_id},
        models::TransactionRecord,
        HistoryStore,
    },
    extraction::ReferenceData,
};

fn row_to_record(row: &Row) -> Result<TransactionRecord> {
    let service_id: i64 = row.get("service_id")?;
    let field_values: String = row.get("field_values")?;
    let outcome: String = row.get("outcome")?;
    let created_at: String = row.get("created_at")?;

    let raw_field_values: BTreeMap<String, String> =
        serde_json::from_str(&field_values).context("failed to parse field_values")?;

    Ok(TransactionRecord {
        id: row.get("id")?,
        service_id: to_service_id(service_id)?,
        service_name: row.get("service_name")?,
        date: row.get("date")?,
        time: row.get("time")?,
        rendered_message: row.get("rendered_message")?,
        reference_data: ReferenceData::new(
            row.get::<_, String>("ref1")?,
            row.get::<_, String>("ref2")?,
        ),
        raw_field_values,
        outcome: parse_outcome(&outcome)?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_transaction(&self, record: &TransactionRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| {
            let field_values = serde_json::to_string(&record.raw_field_values)
                .context("failed to encode field values")?;
            conn.execute(
                "INSERT INTO transactions (id, service_id, service_name, date, time, rendered_message, ref1, ref2, field_values, outcome, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    record.id,
                    i64::from(record.service_id),
                    record.service_name,
                    record.date,
                    record.time,
                    record.rendered_message,
                    record.reference_data.ref1,
                    record.reference_data.ref2,
                    field_values,
                    record.outcome.as_str(),
                    record.created_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert transaction")?;
            Ok(())
        })
        .await
    }

    /// Newest first.
    pub async fn list_transactions(&self, limit: usize) -> Result<Vec<TransactionRecord>> {
        let limit = to_limit(limit)?;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, service_id, service_name, date, time, rendered_message, ref1, ref2, field_values, outcome, created_at
                 FROM transactions
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }
            Ok(records)
        })
        .await
    }

    pub async fn count_transactions(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
    }
}

#[async_trait]
impl HistoryStore for Database {
    async fn append(&self, record: TransactionRecord) -> Result<()> {
        self.insert_transaction(&record).await
    }

    async fn recent(&self, limit: usize) -> Result<Vec<TransactionRecord>> {
        self.list_transactions(limit).await
    }
}
