pub mod catalog;
pub mod patterns;
pub mod registry;
pub mod rule;

pub use registry::ServiceRuleRegistry;
pub use rule::{
    AmountMountingMode, CaptureMapping, ExtractionRule, FieldKey, FieldMode, FieldRequirements,
    ServiceCategory, ServiceId, ServiceRule, ServiceSummary, SimSelector,
};
