//! History records for completed (or abandoned) transactions.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    correlation::CorrelationOutcome,
    extraction::ReferenceData,
    receipt::{DATE_FORMAT, TIME_FORMAT},
    services::{ServiceId, ServiceRule},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransactionOutcome {
    Matched,
    TimedOut,
    Cancelled,
    Failed,
}

impl TransactionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionOutcome::Matched => "Matched",
            TransactionOutcome::TimedOut => "TimedOut",
            TransactionOutcome::Cancelled => "Cancelled",
            TransactionOutcome::Failed => "Failed",
        }
    }
}

impl From<&CorrelationOutcome> for TransactionOutcome {
    fn from(outcome: &CorrelationOutcome) -> Self {
        match outcome {
            CorrelationOutcome::Matched(_) => TransactionOutcome::Matched,
            CorrelationOutcome::TimedOut => TransactionOutcome::TimedOut,
            CorrelationOutcome::Cancelled => TransactionOutcome::Cancelled,
            CorrelationOutcome::Error(_) => TransactionOutcome::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub service_id: ServiceId,
    pub service_name: String,
    pub date: String,
    pub time: String,
    pub rendered_message: String,
    pub reference_data: ReferenceData,
    pub raw_field_values: BTreeMap<String, String>,
    pub outcome: TransactionOutcome,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(
        rule: &ServiceRule,
        fields: &HashMap<String, String>,
        reference_data: ReferenceData,
        rendered_message: String,
        outcome: TransactionOutcome,
        at: DateTime<Local>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            service_id: rule.id,
            service_name: rule.name.clone(),
            date: at.format(DATE_FORMAT).to_string(),
            time: at.format(TIME_FORMAT).to_string(),
            rendered_message,
            reference_data,
            raw_field_values: fields
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            outcome,
            created_at: at.with_timezone(&Utc),
        }
    }
}
