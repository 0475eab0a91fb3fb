pub mod controller;
pub mod source;
pub mod state;

pub use controller::{CorrelationHandle, ReferenceCorrelator};
pub use source::{InboundMessage, InboxChannel, MessageSource};
pub use state::{CorrelationOutcome, CorrelationSession, CorrelationState, CorrelationStatus};
