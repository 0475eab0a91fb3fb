use std::collections::HashMap;

use log::warn;

use super::catalog::build_catalog;
use super::rule::{ServiceId, ServiceRule};
use crate::error::PosError;

/// Read-only lookup table of every service the assistant knows.
///
/// Built once at startup and shared by reference (or `Arc`) afterwards; it
/// holds no interior mutability, so readers never lock.
#[derive(Debug, Clone)]
pub struct ServiceRuleRegistry {
    rules: Vec<ServiceRule>,
    index: HashMap<ServiceId, usize>,
}

impl Default for ServiceRuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRuleRegistry {
    pub fn new() -> Self {
        Self::from_rules(build_catalog())
    }

    /// Later duplicates of an id are ignored so lookups stay stable.
    pub fn from_rules(rules: Vec<ServiceRule>) -> Self {
        let mut index = HashMap::with_capacity(rules.len());
        let mut unique = Vec::with_capacity(rules.len());
        for rule in rules {
            if index.contains_key(&rule.id) {
                warn!("Duplicate service id {} ({}) ignored", rule.id, rule.name);
                continue;
            }
            index.insert(rule.id, unique.len());
            unique.push(rule);
        }

        Self {
            rules: unique,
            index,
        }
    }

    pub fn get(&self, id: ServiceId) -> Option<&ServiceRule> {
        self.index.get(&id).map(|&position| &self.rules[position])
    }

    pub fn lookup(&self, id: ServiceId) -> Result<&ServiceRule, PosError> {
        self.get(id).ok_or(PosError::ConfigNotFound(id))
    }

    /// Lookup that degrades to a generic rule for unknown ids.
    pub fn get_or_fallback(&self, id: ServiceId) -> ServiceRule {
        match self.get(id) {
            Some(rule) => rule.clone(),
            None => {
                warn!("Service {id} not found in catalog; using generic rule");
                ServiceRule::fallback(id)
            }
        }
    }

    /// Case-insensitive substring match over name, description and category.
    /// A blank query returns the whole catalog.
    pub fn search(&self, query: &str) -> Vec<&ServiceRule> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.rules.iter().collect();
        }

        self.rules
            .iter()
            .filter(|rule| {
                rule.name.to_lowercase().contains(&needle)
                    || rule.description.to_lowercase().contains(&needle)
                    || rule.category.label().to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn all(&self) -> &[ServiceRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::services::rule::{AmountMountingMode, CaptureMapping, FieldKey};

    #[test]
    fn catalog_has_unique_contiguous_ids() {
        let registry = ServiceRuleRegistry::new();
        assert_eq!(registry.len(), 76);

        let ids: HashSet<ServiceId> = registry.all().iter().map(|rule| rule.id).collect();
        assert_eq!(ids.len(), registry.len());
        assert!((0..76).all(|id| ids.contains(&id)));
    }

    #[test]
    fn every_rule_has_templates_and_extraction() {
        let registry = ServiceRuleRegistry::new();
        for rule in registry.all() {
            assert!(!rule.code_template.is_empty(), "{} has no code", rule.name);
            assert!(!rule.receipt_template.is_empty(), "{} has no receipt", rule.name);
            assert!(!rule.extraction_rules.is_empty(), "{} extracts nothing", rule.name);
            assert_eq!(rule.has_commission, !rule.commission_rate.is_zero());
        }
    }

    #[test]
    fn amount_in_ref1_rules_extract_amounts() {
        let registry = ServiceRuleRegistry::new();
        for rule in registry
            .all()
            .iter()
            .filter(|rule| rule.amount_mounting_mode == AmountMountingMode::AmountInRef1)
        {
            assert!(rule
                .extraction_rules
                .iter()
                .all(|extraction| extraction.mapping == CaptureMapping::AmountAndRef));
        }
    }

    #[test]
    fn mapped_fields_appear_in_code_templates() {
        let registry = ServiceRuleRegistry::new();
        for rule in registry.all() {
            for specific in rule.special_field_mapping.values() {
                assert!(
                    rule.code_template.contains(&format!("{{{specific}}}")),
                    "{} maps to {specific} but never uses it",
                    rule.name
                );
            }
        }
    }

    #[test]
    fn giros_is_service_zero() {
        let registry = ServiceRuleRegistry::new();
        let giros = registry.get(0).unwrap();
        assert_eq!(giros.name, "Giros");
        assert!(giros.has_commission);
        assert_eq!(
            giros.visible_fields(),
            vec![FieldKey::Phone, FieldKey::NationalId, FieldKey::Amount]
        );
    }

    #[test]
    fn unknown_id_is_none_and_falls_back() {
        let registry = ServiceRuleRegistry::new();
        assert!(registry.get(500).is_none());

        let fallback = registry.get_or_fallback(500);
        assert_eq!(fallback.id, 500);
        assert!(fallback.code_template.is_empty());
        assert!(!fallback.has_commission);
        assert_eq!(registry.lookup(900).unwrap_err(), PosError::ConfigNotFound(900));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let registry = ServiceRuleRegistry::new();

        let names: Vec<&str> = registry
            .search("ANDE")
            .iter()
            .map(|rule| rule.name.as_str())
            .collect();
        assert!(names.contains(&"ANDE"));

        assert!(registry.search("cooperativa").len() >= 10);
        assert_eq!(registry.search("  ").len(), registry.len());
        assert!(registry.search("zzz-nothing").is_empty());
        assert!(registry
            .search("recargas")
            .iter()
            .all(|rule| rule.name.to_lowercase().contains("recarga")
                || rule.name.to_lowercase().contains("paquete")));
    }

    #[test]
    fn duplicate_ids_keep_first_definition() {
        let rules = vec![
            ServiceRule::builder(1, "first").build(),
            ServiceRule::builder(1, "second").build(),
        ];
        let registry = ServiceRuleRegistry::from_rules(rules);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(1).unwrap().name, "first");
    }
}
