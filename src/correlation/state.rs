use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::{error::PosError, extraction::ReferenceData, services::ServiceId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CorrelationStatus {
    Idle,
    Dispatched,
    Listening,
    Matched,
    TimedOut,
    Cancelled,
    Error,
}

impl Default for CorrelationStatus {
    fn default() -> Self {
        CorrelationStatus::Idle
    }
}

impl CorrelationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CorrelationStatus::Matched
                | CorrelationStatus::TimedOut
                | CorrelationStatus::Cancelled
                | CorrelationStatus::Error
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationStatus::Idle => "Idle",
            CorrelationStatus::Dispatched => "Dispatched",
            CorrelationStatus::Listening => "Listening",
            CorrelationStatus::Matched => "Matched",
            CorrelationStatus::TimedOut => "TimedOut",
            CorrelationStatus::Cancelled => "Cancelled",
            CorrelationStatus::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationSession {
    pub id: String,
    pub service_id: ServiceId,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub status: CorrelationStatus,
}

impl CorrelationSession {
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        if self.status.is_terminal() {
            return 0;
        }
        (self.deadline - now).num_milliseconds().max(0)
    }
}

/// What a session ended with. Delivered exactly once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationOutcome {
    Matched(ReferenceData),
    TimedOut,
    Cancelled,
    Error(String),
}

impl CorrelationOutcome {
    pub fn status(&self) -> CorrelationStatus {
        match self {
            CorrelationOutcome::Matched(_) => CorrelationStatus::Matched,
            CorrelationOutcome::TimedOut => CorrelationStatus::TimedOut,
            CorrelationOutcome::Cancelled => CorrelationStatus::Cancelled,
            CorrelationOutcome::Error(_) => CorrelationStatus::Error,
        }
    }

    pub fn into_result(self, service_id: ServiceId) -> Result<ReferenceData, PosError> {
        match self {
            CorrelationOutcome::Matched(refs) => Ok(refs),
            CorrelationOutcome::TimedOut => Err(PosError::CorrelationTimedOut(service_id)),
            CorrelationOutcome::Cancelled => Err(PosError::CorrelationCancelled(service_id)),
            CorrelationOutcome::Error(message) => Err(PosError::CorrelationFailed(message)),
        }
    }
}

/// Owned by one correlator. Holds the current (or last) session and the
/// reply channel of the live one.
#[derive(Debug, Default)]
pub struct CorrelationState {
    session: Option<CorrelationSession>,
    reply: Option<oneshot::Sender<CorrelationOutcome>>,
}

impl CorrelationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&CorrelationSession> {
        self.session.as_ref()
    }

    pub fn status(&self) -> CorrelationStatus {
        self.session
            .as_ref()
            .map(|session| session.status)
            .unwrap_or_default()
    }

    pub fn begin_session(
        &mut self,
        id: String,
        service_id: ServiceId,
        started_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
        reply: oneshot::Sender<CorrelationOutcome>,
    ) -> CorrelationSession {
        let session = CorrelationSession {
            id,
            service_id,
            started_at,
            deadline,
            status: CorrelationStatus::Dispatched,
        };
        self.session = Some(session.clone());
        self.reply = Some(reply);
        session
    }

    pub fn mark_listening(&mut self, session_id: &str) -> bool {
        match self.session.as_mut() {
            Some(session)
                if session.id == session_id
                    && session.status == CorrelationStatus::Dispatched =>
            {
                session.status = CorrelationStatus::Listening;
                true
            }
            _ => false,
        }
    }

    /// Moves the named session to its terminal status and delivers the
    /// outcome. Returns `false` when the session is gone or already ended.
    pub fn finish(&mut self, session_id: &str, outcome: CorrelationOutcome) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.id != session_id || session.status.is_terminal() {
            return false;
        }

        session.status = outcome.status();
        if let Some(reply) = self.reply.take() {
            // The caller may have dropped its handle; the transition still stands.
            let _ = reply.send(outcome);
        }
        true
    }

    pub fn finish_current(&mut self, outcome: CorrelationOutcome) -> Option<CorrelationSession> {
        let session_id = self.session.as_ref()?.id.clone();
        if self.finish(&session_id, outcome) {
            self.session.clone()
        } else {
            None
        }
    }
}
