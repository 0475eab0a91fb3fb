use serde::{Deserialize, Serialize};

use crate::services::{CaptureMapping, ExtractionRule, ServiceRule};

/// Confirmation codes pulled out of a carrier reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    pub ref1: String,
    pub ref2: String,
}

impl ReferenceData {
    pub fn new(ref1: impl Into<String>, ref2: impl Into<String>) -> Self {
        Self {
            ref1: ref1.into(),
            ref2: ref2.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ref1.is_empty() && self.ref2.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceExtractor;

impl ReferenceExtractor {
    pub fn new() -> Self {
        Self
    }

    /// First rule that matches wins. `None` means "not this message".
    pub fn extract(&self, rule: &ServiceRule, body: &str) -> Option<ReferenceData> {
        rule.extraction_rules
            .iter()
            .find_map(|extraction| apply(extraction, body))
    }
}

fn apply(extraction: &ExtractionRule, body: &str) -> Option<ReferenceData> {
    let caps = extraction.pattern.captures(body)?;
    let group = |index: usize| {
        caps.get(index)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };

    let data = match extraction.mapping {
        CaptureMapping::TwoRefs => ReferenceData::new(group(1), group(2)),
        CaptureMapping::AmountAndRef => {
            ReferenceData::new(strip_thousands(&group(1)), group(2))
        }
        CaptureMapping::SingleRef => ReferenceData::new(group(1), String::new()),
    };

    Some(data)
}

pub(crate) fn strip_thousands(amount: &str) -> String {
    amount
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | ' ' | '\u{a0}'))
        .collect()
}
