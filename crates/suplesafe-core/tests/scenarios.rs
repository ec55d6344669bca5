//! End-to-end validation scenarios.

use std::sync::Arc;
use std::thread;

use suplesafe_core::{
    generate_full_disclaimer, validate_recommendation_list, DisclaimerGenerator, DisclaimerLevel,
    Gender, PatientContext, ProposedSupplement, RuleTables, SafetyEngine, Severity,
    WarningCategory, WarningDetail,
};

fn supplements(items: &[(&str, &str)]) -> Vec<ProposedSupplement> {
    items
        .iter()
        .map(|(name, dosage)| ProposedSupplement::new(*name, *dosage))
        .collect()
}

#[test]
fn vitamin_d_overdose_is_flagged() {
    let result = validate_recommendation_list(
        &supplements(&[("Vitamina D", "15000 UI")]),
        &PatientContext::new().with_age(45).with_gender(Gender::Mujer),
    );

    let vitamin_d = &result.supplement_validations[0];
    let limit_warning = vitamin_d
        .warnings
        .iter()
        .find(|w| w.category() == WarningCategory::UpperLimit)
        .expect("upper limit warning");
    assert!(limit_warning.severity() >= Severity::Major);
    assert!(result.overall_requires_professional_review);
}

#[test]
fn space_grouped_vitamin_d_overdose_is_critical() {
    for dosage in ["15 000 UI", "15\u{00A0}000 UI"] {
        let result = validate_recommendation_list(
            &supplements(&[("Vitamina D", dosage)]),
            &PatientContext::new().with_age(45),
        );

        let limit_warning = result.supplement_validations[0]
            .warnings
            .iter()
            .find(|w| w.category() == WarningCategory::UpperLimit)
            .expect("upper limit warning");
        assert_eq!(limit_warning.severity(), Severity::Critical, "{dosage}");
        assert!(!result.is_valid());
    }
}

#[test]
fn vitamin_a_in_pregnancy_is_contraindicated() {
    let result = validate_recommendation_list(
        &supplements(&[("Vitamina A", "5000 mcg")]),
        &PatientContext::new().with_pregnancy(true),
    );

    let warnings = &result.supplement_validations[0].warnings;
    assert!(warnings
        .iter()
        .any(|w| w.severity() == Severity::Critical && w.message().contains("CONTRAINDICADO")));
    assert!(!result.supplement_validations[0].is_valid);
    assert!(result.overall_requires_professional_review);
}

#[test]
fn omega3_with_warfarin_warns_of_bleeding() {
    let result = validate_recommendation_list(
        &supplements(&[("Omega-3 (EPA y DHA)", "2000 mg")]),
        &PatientContext::new().with_medications(["warfarina"]),
    );

    let warnings = &result.supplement_validations[0].warnings;
    let interaction = warnings
        .iter()
        .find(|w| {
            matches!(
                w.category(),
                WarningCategory::Contraindication | WarningCategory::DrugInteraction
            ) && w.message().contains("sangrado")
        })
        .expect("bleeding warning");
    assert!(interaction.severity() >= Severity::Major);
}

#[test]
fn healthy_man_gets_no_serious_warnings() {
    let result = validate_recommendation_list(
        &supplements(&[("Vitamina C", "500 mg"), ("Magnesio", "200 mg")]),
        &PatientContext::new()
            .with_age(30)
            .with_gender(Gender::Hombre)
            .with_medications(Vec::<String>::new()),
    );

    assert!(result.all_warnings().all(|w| w.severity() < Severity::Major));
    assert!(result.drug_depletion_warnings.is_empty());

    // Only the conditions question remains open for a man.
    for validation in &result.supplement_validations {
        let unknown: Vec<_> = validation
            .warnings
            .iter()
            .filter_map(|w| match w.detail() {
                Some(WarningDetail::UnknownContext { missing }) => Some(missing.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].len(), 1);
    }
}

#[test]
fn metformin_depletion_gap_and_coverage() {
    let context = PatientContext::new().with_medications(["Metformina 850 mg"]);

    let result = validate_recommendation_list(&supplements(&[("Magnesio", "200 mg")]), &context);
    assert_eq!(result.drug_depletion_warnings.len(), 1);
    assert_eq!(result.drug_depletion_warnings[0].supplement_name(), "Vitamina B12");

    let result = validate_recommendation_list(
        &supplements(&[("Magnesio", "200 mg"), ("Vitamina B12", "1000 mcg")]),
        &context,
    );
    assert!(result.drug_depletion_warnings.is_empty());
}

#[test]
fn unknown_context_yields_one_warning_per_supplement() {
    let result = validate_recommendation_list(
        &supplements(&[("Vitamina C", "500 mg"), ("Zinc", "15 mg")]),
        &PatientContext::new(),
    );

    for validation in &result.supplement_validations {
        let unknown: Vec<_> = validation
            .warnings
            .iter()
            .filter(|w| matches!(w.detail(), Some(WarningDetail::UnknownContext { .. })))
            .collect();
        assert_eq!(unknown.len(), 1);
        let message = unknown[0].message();
        assert!(message.contains("embarazo"));
        assert!(message.contains("lactancia"));
        assert!(message.contains("condiciones médicas preexistentes"));
        assert_eq!(unknown[0].severity(), Severity::Moderate);
        assert!(unknown[0].requires_professional_review());
    }
}

#[test]
fn results_keep_input_order() {
    let input = supplements(&[
        ("Zinc", "15 mg"),
        ("Espirulina", "3 g"),
        ("Vitamina D", "2000 UI"),
    ]);
    let result = validate_recommendation_list(&input, &PatientContext::new());
    let names: Vec<&str> = result
        .supplement_validations
        .iter()
        .map(|v| v.supplement_name.as_str())
        .collect();
    assert_eq!(names, vec!["Zinc", "Espirulina", "Vitamina D"]);
}

#[test]
fn disclaimer_for_pregnancy_scenario() {
    let context = PatientContext::new().with_pregnancy(true);
    let result = validate_recommendation_list(&supplements(&[("Vitamina A", "5000 mcg")]), &context);
    let disclaimer = DisclaimerGenerator::new().generate_for_result(&result, &context);

    assert_eq!(disclaimer.level, DisclaimerLevel::Critical);
    assert!(disclaimer.professional_consult_required);
    assert!(disclaimer
        .specific_warnings
        .first()
        .is_some_and(|m| m.contains("CONTRAINDICADO")));
    assert!(disclaimer.primary_disclaimer.contains("no sustituye"));
}

#[test]
fn disclaimer_without_warnings_is_standard() {
    let disclaimer = generate_full_disclaimer(&[], &PatientContext::new());
    assert_eq!(disclaimer.level, DisclaimerLevel::Standard);
    assert!(disclaimer.action_required.is_none());
}

#[test]
fn result_json_uses_camel_case() {
    let result = validate_recommendation_list(
        &supplements(&[("Hierro", "18 mg")]),
        &PatientContext::new().with_gender(Gender::Mujer),
    );
    let json = serde_json::to_value(&result).unwrap();

    assert!(json.get("supplementValidations").is_some());
    assert!(json.get("drugDepletionWarnings").is_some());
    assert!(json.get("overallRequiresProfessionalReview").is_some());
    assert!(json.get("evaluatedAt").is_some());

    let warning = &json["supplementValidations"][0]["warnings"][0];
    assert!(warning.get("supplementName").is_some());
    assert!(warning.get("requiresProfessionalReview").is_some());
}

#[test]
fn override_tables_drive_the_engine() {
    let yaml = r#"
tables_version: "test"
medication_categories: {}
conditions: {}
upper_limits:
  "Vitamina C":
    unit: "mg"
    long_term: 100
    short_term: 200
contraindications: {}
depletions: {}
preferred_forms: {}
"#;
    let tables = RuleTables::from_yaml(yaml).unwrap();
    let engine = SafetyEngine::new(Arc::new(tables));
    let result = engine.validate_recommendation_list(
        &supplements(&[("Vitamina C", "500 mg")]),
        &PatientContext::new(),
    );
    assert_eq!(
        result.supplement_validations[0].max_severity(),
        Some(Severity::Critical)
    );
}

#[test]
fn concurrent_validation_shares_tables() {
    let engine = Arc::new(SafetyEngine::builtin());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let dosage = if i % 2 == 0 { "15000 UI" } else { "1000 UI" };
                let result = engine.validate_recommendation_list(
                    &[ProposedSupplement::new("Vitamina D", dosage)],
                    &PatientContext::new(),
                );
                (i, result.is_valid())
            })
        })
        .collect();

    for handle in handles {
        let (i, is_valid) = handle.join().unwrap();
        assert_eq!(is_valid, i % 2 != 0);
    }
}
