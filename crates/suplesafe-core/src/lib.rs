//! # suplesafe-core
//!
//! Deterministic clinical safety validation for dietary supplement
//! recommendations.
//!
//! Given proposed supplements and what is known about the patient, the
//! engine answers:
//! - Does any dose exceed its tolerable upper intake limit?
//! - Do medications, conditions, pregnancy or age contraindicate it?
//! - Do the patient's medications deplete nutrients the list does not cover?
//! - Which critical patient facts are unknown?
//!
//! ## Key Guarantees
//!
//! 1. **Fail safe**: an unparseable dose or unsupported unit conversion is
//!    reported as unverifiable, never as within limits
//! 2. **Total**: validation never returns an error; failures become warnings
//! 3. **Unknown ≠ no**: an unanswered patient fact always produces an advisory
//! 4. **Shareable**: rule tables are immutable and shared across threads
//!
//! ## Example
//!
//! ```rust,ignore
//! use suplesafe_core::{validate_recommendation_list, PatientContext, ProposedSupplement};
//!
//! let supplements = vec![ProposedSupplement::new("Vitamina D", "15000 UI")];
//! let context = PatientContext::new().with_age(45);
//! let result = validate_recommendation_list(&supplements, &context);
//!
//! for validation in &result.supplement_validations {
//!     for warning in &validation.warnings {
//!         println!("{} {}: {}", warning.severity(), warning.category(), warning.message());
//!     }
//! }
//! ```

pub mod config;
pub mod disclaimer;
pub mod evaluators;
pub mod matching;
pub mod rules;
pub mod types;
pub mod units;
pub mod validator;

// Re-export main types at crate root
pub use config::{ConfigError, EngineConfig};
pub use disclaimer::{Disclaimer, DisclaimerGenerator, DisclaimerLevel};
pub use evaluators::{CheckKind, DepletionFinding, DepletionReport, EvaluationError, SupplementCheck};
pub use matching::{normalize_term, SubstringMatcher, TermMatcher};
pub use rules::{builtin_tables, RuleTableError, RuleTables};
pub use types::{
    Gender, IntakeDuration, PatientContext, ProposedSupplement, RecommendationListResult,
    SafetyWarning, Severity, SupplementRequest, UnknownFact, ValidationResult, WarningCategory,
    WarningDetail,
};
pub use units::{
    extract_max_dosage, extract_unit, normalize_dosage_to_standard_unit, parse_dosage,
    ConversionOutcome, ParsedDosage, Unit, UnitParseError,
};
pub use validator::{annotate_recommendations, AnnotatedRecommendation, SafetyEngine};

use thiserror::Error;

/// Errors that can occur while setting up an engine.
///
/// Validation itself never fails; these come from loading configuration
/// and override rule tables.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rule tables error: {0}")]
    RuleTables(#[from] RuleTableError),
}

/// Validate a recommendation list with the compiled-in tables.
///
/// This is the main entry point. Returns per-supplement results in input
/// order, list-level depletion and conflict warnings, and the overall
/// professional-review flag.
pub fn validate_recommendation_list(
    supplements: &[ProposedSupplement],
    context: &PatientContext,
) -> RecommendationListResult {
    SafetyEngine::shared().validate_recommendation_list(supplements, context)
}

/// Validate a single supplement with the compiled-in tables.
pub fn validate_supplement(request: &SupplementRequest) -> ValidationResult {
    SafetyEngine::shared().validate_supplement(request)
}

/// Nutrients depleted by the given medications, using the compiled-in tables.
pub fn detect_nutrient_depletions(medications: &[String]) -> Result<DepletionReport, EvaluationError> {
    SafetyEngine::shared().detect_nutrient_depletions(medications)
}

/// Reduce warnings to a tiered disclaimer.
pub fn generate_full_disclaimer(warnings: &[SafetyWarning], context: &PatientContext) -> Disclaimer {
    DisclaimerGenerator::new().generate(warnings, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_validation() {
        let result = validate_recommendation_list(
            &[ProposedSupplement::new("Vitamina C", "500 mg")],
            &PatientContext::new()
                .with_pregnancy(false)
                .with_breastfeeding(false)
                .with_conditions(Vec::<String>::new()),
        );

        assert!(result.is_valid());
        assert!(!result.overall_requires_professional_review);
        assert_eq!(result.all_warnings().count(), 0);
    }

    #[test]
    fn test_overdose_blocked() {
        let result = validate_supplement(&SupplementRequest::new("Vitamina D", "40000 UI"));
        assert!(!result.is_valid);

        let disclaimer = generate_full_disclaimer(&result.warnings, &PatientContext::new());
        assert_eq!(disclaimer.level, DisclaimerLevel::Critical);
        assert!(disclaimer.action_required.is_some());
    }

    #[test]
    fn test_engine_from_default_config() {
        let engine = SafetyEngine::from_config(EngineConfig::default()).unwrap();
        assert_eq!(engine.tables().tables_version, rules::BUILTIN_TABLES_VERSION);
    }

    #[test]
    fn test_engine_from_missing_rules_file() {
        let config = EngineConfig {
            rules_file: Some("does/not/exist.yaml".into()),
            ..EngineConfig::default()
        };
        let result = SafetyEngine::from_config(config);
        assert!(matches!(
            result,
            Err(EngineError::RuleTables(RuleTableError::Io(_)))
        ));
    }
}
