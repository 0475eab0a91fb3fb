use std::collections::HashMap;

use crate::{error::CodeGenError, services::ServiceRule, template};

/// Fills a service's dial template with operator input.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator;

impl CodeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Optional fields left blank collapse to empty segments; required fields
    /// must be present.
    pub fn generate(
        &self,
        rule: &ServiceRule,
        fields: &HashMap<String, String>,
    ) -> Result<String, CodeGenError> {
        if rule.code_template.trim().is_empty() {
            return Err(CodeGenError::MissingTemplate {
                service_id: rule.id,
            });
        }

        if let Some(field) = rule.missing_fields(fields).into_iter().next() {
            return Err(CodeGenError::MissingField {
                service_id: rule.id,
                field,
            });
        }

        let values = rule.resolve_fields(fields);
        let code = template::fill(&rule.code_template, |key| {
            values.get(key).map(|value| value.trim().to_string())
        });

        Ok(code.into_owned())
    }
}
