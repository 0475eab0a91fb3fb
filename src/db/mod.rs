//! Transaction history persisted in SQLite.

mod connection;
pub mod helpers;
mod migrations;
pub mod models;
mod repositories;

use anyhow::Result;
use async_trait::async_trait;

pub use connection::Database;
pub use models::{TransactionOutcome, TransactionRecord};

/// Receives every finished transaction, matched or not.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: TransactionRecord) -> Result<()>;

    /// Most recent first.
    async fn recent(&self, limit: usize) -> Result<Vec<TransactionRecord>>;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{Duration, Local};

    use super::*;
    use crate::{extraction::ReferenceData, services::ServiceRuleRegistry};

    fn record(service_id: u16, offset_secs: i64, outcome: TransactionOutcome) -> TransactionRecord {
        let registry = ServiceRuleRegistry::new();
        let rule = registry.get_or_fallback(service_id);
        let fields: HashMap<String, String> =
            [("numero".to_string(), "0991234567".to_string())].into();
        TransactionRecord::new(
            &rule,
            &fields,
            ReferenceData::new("111", "222"),
            format!("{}\nRef1: 111", rule.name),
            outcome,
            Local::now() + Duration::seconds(offset_secs),
        )
    }

    #[tokio::test]
    async fn append_and_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("history.db")).unwrap();

        let oldest = record(0, -20, TransactionOutcome::Matched);
        let middle = record(10, -10, TransactionOutcome::TimedOut);
        let newest = record(22, 0, TransactionOutcome::Cancelled);
        for entry in [&middle, &oldest, &newest] {
            db.append(entry.clone()).await.unwrap();
        }

        let listed = db.recent(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newest.id);
        assert_eq!(listed[1].id, middle.id);
        assert_eq!(listed[1].outcome, TransactionOutcome::TimedOut);
        assert_eq!(db.count_transactions().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn record_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        let entry = record(0, 0, TransactionOutcome::Matched);

        {
            let db = Database::new(path.clone()).unwrap();
            db.append(entry.clone()).await.unwrap();
        }

        let db = Database::new(path).unwrap();
        let listed = db.recent(10).await.unwrap();
        assert_eq!(listed.len(), 1);

        let stored = &listed[0];
        assert_eq!(stored.service_name, "Giros");
        assert_eq!(stored.reference_data, ReferenceData::new("111", "222"));
        assert_eq!(stored.raw_field_values.get("numero").unwrap(), "0991234567");
        assert_eq!(stored.created_at.timestamp(), entry.created_at.timestamp());
    }

    #[tokio::test]
    async fn clones_share_one_worker() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("history.db")).unwrap();
        let clone = db.clone();
        drop(db);

        clone
            .append(record(10, 0, TransactionOutcome::Matched))
            .await
            .unwrap();
        assert_eq!(clone.count_transactions().await.unwrap(), 1);
    }

    #[test]
    fn unopenable_path_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Database::new(dir.path().to_path_buf()).is_err());
    }
}
