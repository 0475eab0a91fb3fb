use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type ServiceId = u16;

/// Generic input fields a service can ask the operator for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Phone,
    NationalId,
    Amount,
    BirthDate,
}

impl FieldKey {
    pub const ALL: [FieldKey; 4] = [
        FieldKey::Phone,
        FieldKey::NationalId,
        FieldKey::Amount,
        FieldKey::BirthDate,
    ];

    /// Placeholder name used in code and receipt templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Phone => "numero",
            FieldKey::NationalId => "cedula",
            FieldKey::Amount => "monto",
            FieldKey::BirthDate => "nacimiento",
        }
    }

    pub fn default_label(&self) -> &'static str {
        match self {
            FieldKey::Phone => "Numero",
            FieldKey::NationalId => "Cedula",
            FieldKey::Amount => "Monto",
            FieldKey::BirthDate => "Fecha de nacimiento",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        FieldKey::ALL.into_iter().find(|field| field.as_str() == key)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FieldMode {
    #[default]
    Hidden,
    Optional,
    Required,
}

impl FieldMode {
    pub fn is_visible(&self) -> bool {
        !matches!(self, FieldMode::Hidden)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldRequirements {
    pub phone: FieldMode,
    pub national_id: FieldMode,
    pub amount: FieldMode,
    pub birth_date: FieldMode,
}

impl FieldRequirements {
    pub const NONE: FieldRequirements = FieldRequirements {
        phone: FieldMode::Hidden,
        national_id: FieldMode::Hidden,
        amount: FieldMode::Hidden,
        birth_date: FieldMode::Hidden,
    };

    pub fn mode(&self, key: FieldKey) -> FieldMode {
        match key {
            FieldKey::Phone => self.phone,
            FieldKey::NationalId => self.national_id,
            FieldKey::Amount => self.amount,
            FieldKey::BirthDate => self.birth_date,
        }
    }

    pub fn with(mut self, key: FieldKey, mode: FieldMode) -> Self {
        match key {
            FieldKey::Phone => self.phone = mode,
            FieldKey::NationalId => self.national_id = mode,
            FieldKey::Amount => self.amount = mode,
            FieldKey::BirthDate => self.birth_date = mode,
        }
        self
    }

    pub fn require(self, keys: &[FieldKey]) -> Self {
        keys.iter()
            .fold(self, |acc, key| acc.with(*key, FieldMode::Required))
    }
}

/// Physical line the dial code is sent from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SimSelector {
    #[default]
    Sim1,
    Sim2,
}

impl SimSelector {
    pub fn slot(&self) -> u8 {
        match self {
            SimSelector::Sim1 => 0,
            SimSelector::Sim2 => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AmountMountingMode {
    /// Amount typed by the operator.
    #[default]
    Normal,
    /// Amount reported by the carrier in the first capture of the reply.
    AmountInRef1,
}

/// How the capture groups of an extraction pattern map onto reference data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CaptureMapping {
    TwoRefs,
    AmountAndRef,
    SingleRef,
}

#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub pattern: Regex,
    pub mapping: CaptureMapping,
}

impl ExtractionRule {
    pub fn new(pattern: &Regex, mapping: CaptureMapping) -> Self {
        Self {
            pattern: pattern.clone(),
            mapping,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ServiceCategory {
    Wallet,
    TopUp,
    Utility,
    Telecom,
    Finance,
    Education,
    Other,
}

impl ServiceCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Wallet => "Billetera",
            ServiceCategory::TopUp => "Recargas",
            ServiceCategory::Utility => "Servicios basicos",
            ServiceCategory::Telecom => "Telefonia e internet",
            ServiceCategory::Finance => "Cooperativas y financieras",
            ServiceCategory::Education => "Educacion",
            ServiceCategory::Other => "Otros",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceRule {
    pub id: ServiceId,
    pub name: String,
    pub description: String,
    pub category: ServiceCategory,
    pub field_requirements: FieldRequirements,
    pub code_template: String,
    pub sim_selector: SimSelector,
    pub receipt_template: String,
    pub has_commission: bool,
    pub commission_rate: Decimal,
    pub amount_mounting_mode: AmountMountingMode,
    pub extraction_rules: Vec<ExtractionRule>,
    pub field_label_overrides: BTreeMap<String, String>,
    pub special_field_mapping: BTreeMap<String, String>,
}

impl ServiceRule {
    pub fn builder(id: ServiceId, name: impl Into<String>) -> ServiceRuleBuilder {
        ServiceRuleBuilder::new(id, name)
    }

    /// Generic rule used when a service id is not in the catalog: empty
    /// templates, no commission, nothing to extract.
    pub fn fallback(id: ServiceId) -> Self {
        ServiceRuleBuilder::new(id, "Servicio").build()
    }

    pub fn label_for(&self, key: &str) -> String {
        if let Some(label) = self.field_label_overrides.get(key) {
            return label.clone();
        }
        FieldKey::from_key(key)
            .map(|field| field.default_label().to_string())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn visible_fields(&self) -> Vec<FieldKey> {
        FieldKey::ALL
            .into_iter()
            .filter(|key| self.field_requirements.mode(*key).is_visible())
            .collect()
    }

    /// Required fields that are absent or blank. A value supplied under the
    /// service-specific key counts as present.
    pub fn missing_fields(&self, fields: &HashMap<String, String>) -> Vec<FieldKey> {
        FieldKey::ALL
            .into_iter()
            .filter(|key| self.field_requirements.mode(*key) == FieldMode::Required)
            .filter(|key| {
                let generic = key.as_str();
                let present = |k: &str| fields.get(k).is_some_and(|v| !v.trim().is_empty());
                let specific = self.special_field_mapping.get(generic);
                !(present(generic) || specific.is_some_and(|k| present(k.as_str())))
            })
            .collect()
    }

    /// Copies generic field values under their service-specific keys so that
    /// templates written against either name resolve.
    pub fn resolve_fields(&self, fields: &HashMap<String, String>) -> HashMap<String, String> {
        let mut resolved = fields.clone();
        for (generic, specific) in &self.special_field_mapping {
            if let Some(value) = fields.get(generic) {
                resolved
                    .entry(specific.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        resolved
    }

    pub fn summary(&self) -> ServiceSummary {
        ServiceSummary {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category,
            sim_selector: self.sim_selector,
            has_commission: self.has_commission,
            commission_rate: self.commission_rate,
            amount_mounting_mode: self.amount_mounting_mode,
            fields: self
                .visible_fields()
                .into_iter()
                .map(|key| FieldSummary {
                    key: key.as_str().to_string(),
                    label: self.label_for(key.as_str()),
                    mode: self.field_requirements.mode(key),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSummary {
    pub key: String,
    pub label: String,
    pub mode: FieldMode,
}

/// Serializable view of a rule for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: ServiceId,
    pub name: String,
    pub description: String,
    pub category: ServiceCategory,
    pub sim_selector: SimSelector,
    pub has_commission: bool,
    pub commission_rate: Decimal,
    pub amount_mounting_mode: AmountMountingMode,
    pub fields: Vec<FieldSummary>,
}

pub struct ServiceRuleBuilder {
    rule: ServiceRule,
}

impl ServiceRuleBuilder {
    fn new(id: ServiceId, name: impl Into<String>) -> Self {
        Self {
            rule: ServiceRule {
                id,
                name: name.into(),
                description: String::new(),
                category: ServiceCategory::Other,
                field_requirements: FieldRequirements::NONE,
                code_template: String::new(),
                sim_selector: SimSelector::Sim1,
                receipt_template: String::new(),
                has_commission: false,
                commission_rate: Decimal::ZERO,
                amount_mounting_mode: AmountMountingMode::Normal,
                extraction_rules: Vec::new(),
                field_label_overrides: BTreeMap::new(),
                special_field_mapping: BTreeMap::new(),
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.rule.description = description.into();
        self
    }

    pub fn category(mut self, category: ServiceCategory) -> Self {
        self.rule.category = category;
        self
    }

    pub fn fields(mut self, requirements: FieldRequirements) -> Self {
        self.rule.field_requirements = requirements;
        self
    }

    pub fn code(mut self, template: impl Into<String>) -> Self {
        self.rule.code_template = template.into();
        self
    }

    pub fn sim(mut self, sim: SimSelector) -> Self {
        self.rule.sim_selector = sim;
        self
    }

    pub fn receipt(mut self, template: impl Into<String>) -> Self {
        self.rule.receipt_template = template.into();
        self
    }

    /// Rate expressed in hundredths, e.g. `commission(6)` is 6%.
    pub fn commission(self, percent_hundredths: i64) -> Self {
        self.commission_rate(Decimal::new(percent_hundredths, 2))
    }

    pub fn commission_rate(mut self, rate: Decimal) -> Self {
        self.rule.has_commission = !rate.is_zero();
        self.rule.commission_rate = rate;
        self
    }

    pub fn mounting(mut self, mode: AmountMountingMode) -> Self {
        self.rule.amount_mounting_mode = mode;
        self
    }

    pub fn extract(mut self, pattern: &Regex, mapping: CaptureMapping) -> Self {
        self.rule
            .extraction_rules
            .push(ExtractionRule::new(pattern, mapping));
        self
    }

    pub fn label(mut self, key: &str, label: impl Into<String>) -> Self {
        self.rule
            .field_label_overrides
            .insert(key.to_string(), label.into());
        self
    }

    pub fn map_field(mut self, generic: FieldKey, specific: &str) -> Self {
        self.rule
            .special_field_mapping
            .insert(generic.as_str().to_string(), specific.to_string());
        self
    }

    pub fn build(self) -> ServiceRule {
        self.rule
    }
}
