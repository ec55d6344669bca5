//! Property-based tests for unit handling and severity policy.

use proptest::prelude::*;

use suplesafe_core::{
    extract_max_dosage, normalize_dosage_to_standard_unit, IntakeDuration, SafetyEngine, Severity,
    SupplementRequest, Unit,
};

fn limit_severity(amount: u32) -> Option<Severity> {
    let request = SupplementRequest::new("Vitamina C", format!("{} mg", amount))
        .with_duration(IntakeDuration::LongTerm);
    SafetyEngine::shared()
        .validate_upper_limit(&request)
        .iter()
        .map(|w| w.severity())
        .max()
}

proptest! {
    /// IU → mcg RAE → IU returns the original amount
    #[test]
    fn vitamin_a_round_trip(amount in 1.0..1_000_000.0f64) {
        let to_rae = normalize_dosage_to_standard_unit(
            amount, Unit::INTERNATIONAL_UNIT, Unit::MCG_RAE, Some("Vitamina A"));
        prop_assert!(to_rae.success);

        let back = normalize_dosage_to_standard_unit(
            to_rae.normalized_amount, Unit::MCG_RAE, Unit::INTERNATIONAL_UNIT, Some("Vitamina A"));
        prop_assert!(back.success);
        prop_assert!(
            (back.normalized_amount - amount).abs() <= amount * 1e-9,
            "{} came back as {}", amount, back.normalized_amount
        );
    }

    /// Severity never decreases as the dose grows
    #[test]
    fn severity_is_monotonic(low in 1u32..10_000, step in 0u32..10_000) {
        let high = low + step;
        prop_assert!(limit_severity(low) <= limit_severity(high));
    }

    /// Severity bands around the Vitamin C limit of 2000 mg
    #[test]
    fn severity_bands(amount in 1u32..20_000) {
        let expected = if amount <= 2000 {
            None
        } else if amount <= 4000 {
            Some(Severity::Major)
        } else {
            Some(Severity::Critical)
        };
        prop_assert_eq!(limit_severity(amount), expected);
    }

    /// Ranges evaluate at their upper bound
    #[test]
    fn range_uses_maximum(low in 1u32..5000, high in 1u32..5000) {
        let text = format!("{}-{} mg", low, high);
        prop_assert_eq!(extract_max_dosage(&text), Some(low.max(high) as f64));
    }

    /// Same-unit conversion is an exact no-op
    #[test]
    fn same_unit_is_identity(amount in 0.0..1e9f64) {
        let outcome = normalize_dosage_to_standard_unit(amount, Unit::MILLIGRAM, Unit::MILLIGRAM, None);
        prop_assert!(outcome.success);
        prop_assert_eq!(outcome.normalized_amount, amount);
        prop_assert!(outcome.conversion_applied.is_none());
    }

    /// Volume never converts to mass, whatever the supplement
    #[test]
    fn incompatible_units_fail(amount in 0.0..1e6f64, name in "[A-Za-z ]{0,20}") {
        let outcome = normalize_dosage_to_standard_unit(
            amount, Unit::MILLILITER, Unit::MILLIGRAM, Some(&name));
        prop_assert!(!outcome.success);
        prop_assert_eq!(outcome.normalized_amount, amount);
    }
}
