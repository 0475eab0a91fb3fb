use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::{db::models::TransactionOutcome, services::ServiceId};

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_outcome(value: &str) -> Result<TransactionOutcome> {
    match value {
        "Matched" => Ok(TransactionOutcome::Matched),
        "TimedOut" => Ok(TransactionOutcome::TimedOut),
        "Cancelled" => Ok(TransactionOutcome::Cancelled),
        "Failed" => Ok(TransactionOutcome::Failed),
        other => Err(anyhow!("unknown transaction outcome {other}")),
    }
}

pub fn to_service_id(value: i64) -> Result<ServiceId> {
    ServiceId::try_from(value).map_err(|_| anyhow!("service_id {value} is out of range"))
}

pub fn to_limit(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("limit {value} exceeds SQLite INTEGER range"))
}
