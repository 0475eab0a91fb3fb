use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::{prelude::ToPrimitive, Decimal};

use pos_assistant_lib::{
    receipt::format_thousands,
    services::{AmountMountingMode, CaptureMapping, ServiceCategory},
    CodeGenerator, ReceiptRenderer, ReferenceData, ReferenceExtractor, ServiceRuleRegistry,
};

fn sample_fields() -> HashMap<String, String> {
    [
        ("numero", "0991234567"),
        ("cedula", "1234567"),
        ("monto", "100000"),
        ("nacimiento", "01/01/1990"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[test]
fn every_service_generates_a_code() {
    let registry = ServiceRuleRegistry::new();
    let generator = CodeGenerator::new();
    let fields = sample_fields();

    for rule in registry.all() {
        let code = generator.generate(rule, &fields).unwrap();
        assert!(code.starts_with('*'), "{}: {code}", rule.name);
        assert!(code.ends_with('#'), "{}: {code}", rule.name);
        assert!(!code.contains('{'), "{}: {code}", rule.name);
        assert_eq!(code, generator.generate(rule, &fields).unwrap());
    }
}

#[test]
fn commission_is_floor_of_amount_times_rate() {
    let registry = ServiceRuleRegistry::new();
    let renderer = ReceiptRenderer::new();
    let at = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();

    for rule in registry.all().iter().filter(|rule| rule.has_commission) {
        if !rule.receipt_template.contains("{comision}") {
            continue;
        }
        let refs = match rule.amount_mounting_mode {
            AmountMountingMode::Normal => ReferenceData::new("1", "2"),
            AmountMountingMode::AmountInRef1 => ReferenceData::new("100000", "2"),
        };
        let expected = (Decimal::from(100_000) * rule.commission_rate)
            .floor()
            .to_i64()
            .unwrap();

        let receipt = renderer.render_at(rule, &sample_fields(), &refs, at);
        assert!(
            receipt.contains(&format!("Comision: {} Gs.", format_thousands(expected))),
            "{}: {receipt}",
            rule.name
        );
    }
}

#[test]
fn two_reference_replies_extract_both_refs() {
    let registry = ServiceRuleRegistry::new();
    let extractor = ReferenceExtractor::new();

    for rule in registry.all().iter().filter(|rule| {
        rule.extraction_rules
            .first()
            .is_some_and(|first| first.mapping == CaptureMapping::TwoRefs)
    }) {
        assert_eq!(
            extractor.extract(rule, "Operacion exitosa. Ref 1: 1234 Ref 2: 5678"),
            Some(ReferenceData::new("1234", "5678")),
            "{}",
            rule.name
        );
    }
}

#[test]
fn categories_cover_the_catalog() {
    let registry = ServiceRuleRegistry::new();
    for category in [
        ServiceCategory::Wallet,
        ServiceCategory::TopUp,
        ServiceCategory::Utility,
        ServiceCategory::Telecom,
        ServiceCategory::Finance,
        ServiceCategory::Education,
    ] {
        assert!(
            registry.all().iter().any(|rule| rule.category == category),
            "no services in {}",
            category.label()
        );
        assert!(!registry.search(category.label()).is_empty());
    }
}
