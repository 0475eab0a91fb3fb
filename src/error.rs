use thiserror::Error;

use crate::services::{FieldKey, ServiceId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeGenError {
    #[error("service {service_id} has no code template")]
    MissingTemplate { service_id: ServiceId },

    #[error("required field '{}' is empty", .field.as_str())]
    MissingField { service_id: ServiceId, field: FieldKey },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connect failed: {message}")]
    Connect { message: String },

    #[error("write failed: {message}")]
    Write { message: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrintError {
    #[error("printer unavailable after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        attempts: u32,
        last_error: TransportError,
    },

    #[error("nothing to print")]
    EmptyPayload,
}

/// Failure taxonomy surfaced to presentation code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PosError {
    #[error("service {0} is not configured")]
    ConfigNotFound(ServiceId),

    #[error("service {0} has no dial template")]
    MissingTemplate(ServiceId),

    #[error(transparent)]
    CodeGen(#[from] CodeGenError),

    #[error("no confirmation received for service {0} before the deadline")]
    CorrelationTimedOut(ServiceId),

    #[error("correlation for service {0} was cancelled")]
    CorrelationCancelled(ServiceId),

    #[error("correlation failed: {0}")]
    CorrelationFailed(String),

    #[error(transparent)]
    Print(#[from] PrintError),
}
