//! Receipt rendering.
//!
//! Rendering never fails: malformed amounts are shown as typed, unknown
//! placeholders disappear, and a rule without a receipt template gets a
//! generic layout so the transaction can still be printed or logged.

pub mod amount;

use std::collections::HashMap;

use chrono::{Local, NaiveDateTime};
use log::warn;

use crate::{
    extraction::ReferenceData,
    services::{AmountMountingMode, FieldKey, ServiceRule},
    template,
};

pub use amount::{commission, display_amount, format_thousands, parse_amount};

pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiptRenderer;

impl ReceiptRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        rule: &ServiceRule,
        fields: &HashMap<String, String>,
        refs: &ReferenceData,
    ) -> String {
        self.render_at(rule, fields, refs, Local::now().naive_local())
    }

    /// Same as [`render`](Self::render) with an explicit timestamp.
    pub fn render_at(
        &self,
        rule: &ServiceRule,
        fields: &HashMap<String, String>,
        refs: &ReferenceData,
        at: NaiveDateTime,
    ) -> String {
        let values = rule.resolve_fields(fields);
        let typed_amount = values
            .get(FieldKey::Amount.as_str())
            .map(|value| value.trim().to_string())
            .unwrap_or_default();

        let (amount, refs) = mount_amount(rule.amount_mounting_mode, typed_amount, refs);

        let commission_text = rule.has_commission.then(|| {
            parse_amount(&amount)
                .map(|value| format_thousands(commission(value, rule.commission_rate)))
                .unwrap_or_else(|| "0".to_string())
        });

        let layout;
        let source = if rule.receipt_template.trim().is_empty() {
            warn!("Service {} has no receipt template; using generic layout", rule.id);
            layout = generic_layout(&values);
            layout.as_str()
        } else {
            rule.receipt_template.as_str()
        };

        let rendered = template::fill(source, |key| match key {
            "servicio" => Some(rule.name.clone()),
            "fecha" => Some(at.format(DATE_FORMAT).to_string()),
            "hora" => Some(at.format(TIME_FORMAT).to_string()),
            "monto" => Some(display_amount(&amount)),
            "comision" => commission_text.clone(),
            "ref" | "ref1" => Some(refs.ref1.clone()),
            "ref2" => Some(refs.ref2.clone()),
            other => values.get(other).map(|value| value.trim().to_string()),
        });

        rendered.into_owned()
    }
}

/// In `AmountInRef1` mode the carrier's first capture is the amount and the
/// reference shown to the customer is the second capture. A reply that
/// carried no amount leaves the typed one in place.
fn mount_amount(
    mode: AmountMountingMode,
    typed_amount: String,
    refs: &ReferenceData,
) -> (String, ReferenceData) {
    match mode {
        AmountMountingMode::Normal => (typed_amount, refs.clone()),
        AmountMountingMode::AmountInRef1 => {
            let amount = if refs.ref1.is_empty() {
                typed_amount
            } else {
                refs.ref1.clone()
            };
            (amount, ReferenceData::new(refs.ref2.clone(), String::new()))
        }
    }
}

fn generic_layout(values: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = values
        .keys()
        .filter(|key| key.as_str() != FieldKey::Amount.as_str())
        .collect();
    keys.sort();

    let mut layout = String::from("{servicio}\nFecha: {fecha} Hora: {hora}\n");
    for key in keys {
        let label = FieldKey::from_key(key)
            .map(|field| field.default_label().to_string())
            .unwrap_or_else(|| key.clone());
        layout.push_str(&format!("{label}: {{{key}}}\n"));
    }
    layout.push_str("Monto: {monto} Gs.\nRef1: {ref1}\nRef2: {ref2}\n");
    layout
}
