//! Supplement and recommendation-list validation.
//!
//! [`SafetyEngine`] owns the rule tables (shared, immutable), the term
//! matcher and the configuration, and runs the evaluators:
//!
//! ```text
//! validate_recommendation_list
//!   ├─ validate_supplement (per supplement, isolated)
//!   │    upper limit → contraindications → unknown context → quality
//!   ├─ depletion coverage (whole list)
//!   └─ nutrient conflicts (whole list)
//! ```
//!
//! Every public validation method is total. A check that fails, or a
//! supplement whose validation panics, degrades to a MODERATE warning that
//! requires professional review; the rest of the list is still validated.

use chrono::Utc;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::evaluators::{
    CheckKind, ContraindicationCheck, DepletionCheck, DepletionReport, EvaluationError,
    NutrientConflictCheck, QualityCheck, SupplementCheck, UnknownContextCheck, UpperLimitCheck,
};
use crate::matching::{SubstringMatcher, TermMatcher};
use crate::rules::{builtin_tables, same_supplement, RuleTables};
use crate::types::{
    PatientContext, ProposedSupplement, RecommendationListResult, SafetyWarning, Severity,
    SupplementRequest, ValidationResult, WarningDetail,
};
use crate::EngineError;

lazy_static! {
    static ref SHARED: SafetyEngine = SafetyEngine::builtin();
}

/// A proposed supplement with its safety annotations, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedRecommendation {
    pub name: String,
    pub dosage: String,
    pub warnings: Vec<SafetyWarning>,
    pub requires_professional_review: bool,

    /// Preferred chemical form, when the tables name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_form: Option<String>,
}

/// The clinical safety validation engine.
///
/// Cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct SafetyEngine {
    tables: Arc<RuleTables>,
    matcher: Arc<dyn TermMatcher>,
    config: EngineConfig,
}

impl fmt::Debug for SafetyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafetyEngine")
            .field("tables_version", &self.tables.tables_version)
            .field("matcher", &self.matcher.name())
            .field("config", &self.config)
            .finish()
    }
}

impl SafetyEngine {
    pub fn new(tables: Arc<RuleTables>) -> Self {
        Self {
            tables,
            matcher: Arc::new(SubstringMatcher::new()),
            config: EngineConfig::default(),
        }
    }

    /// Engine over the compiled-in tables with default configuration.
    pub fn builtin() -> Self {
        Self::new(builtin_tables())
    }

    /// Process-wide engine over the compiled-in tables.
    pub fn shared() -> &'static SafetyEngine {
        &SHARED
    }

    /// Build an engine from configuration, loading override tables if set.
    pub fn from_config(config: EngineConfig) -> Result<Self, EngineError> {
        let tables = match &config.rules_file {
            Some(path) => {
                let tables = RuleTables::from_file(path)?;
                tracing::info!(
                    path = %path.display(),
                    version = %tables.tables_version,
                    "Loaded rule tables"
                );
                Arc::new(tables)
            }
            None => builtin_tables(),
        };
        Ok(Self::new(tables).with_config(config))
    }

    /// Build an engine from a YAML configuration file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let config = EngineConfig::from_yaml_file(path)?;
        Self::from_config(config)
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Swap the medication/condition matching strategy.
    pub fn with_matcher(mut self, matcher: Arc<dyn TermMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one check, degrading an error to a review warning.
    fn run_check(&self, check: &dyn SupplementCheck, request: &SupplementRequest) -> Vec<SafetyWarning> {
        match check.evaluate(request) {
            Ok(warnings) => warnings,
            Err(e) => {
                tracing::warn!(
                    check = ?check.kind(),
                    supplement = %request.supplement_name,
                    error = %e,
                    "Check failed, degrading to review warning"
                );
                vec![degraded_warning(&request.supplement_name, check.kind(), &e.to_string())]
            }
        }
    }

    /// Upper-limit warnings for one supplement.
    pub fn validate_upper_limit(&self, request: &SupplementRequest) -> Vec<SafetyWarning> {
        UpperLimitCheck::new(&self.tables, self.config.default_duration).check(request)
    }

    /// Contraindication and drug-interaction warnings for one supplement.
    pub fn validate_contraindications(&self, request: &SupplementRequest) -> Vec<SafetyWarning> {
        let check = ContraindicationCheck::new(&self.tables, self.matcher.as_ref());
        self.run_check(&check, request)
    }

    /// The combined unknown-context warning, if any fact is missing.
    pub fn validate_unknown_patient_details(&self, request: &SupplementRequest) -> Vec<SafetyWarning> {
        UnknownContextCheck::new(self.config.gender_aware_unknown_context).check(request)
    }

    /// Nutrients depleted by the given medications.
    pub fn detect_nutrient_depletions(
        &self,
        medications: &[String],
    ) -> Result<DepletionReport, EvaluationError> {
        DepletionCheck::new(&self.tables, self.matcher.as_ref()).detect(medications)
    }

    /// Depleted nutrients whose replacement is not in `recommended`.
    pub fn validate_depletion_coverage(
        &self,
        medications: &[String],
        recommended: &[String],
    ) -> Vec<SafetyWarning> {
        let check = DepletionCheck::new(&self.tables, self.matcher.as_ref());
        match check.coverage_warnings(medications, recommended) {
            Ok(warnings) => warnings,
            Err(e) => {
                tracing::warn!(error = %e, "Depletion check failed, degrading to review warning");
                vec![degraded_warning(
                    "Medicación del paciente",
                    check.kind(),
                    &e.to_string(),
                )]
            }
        }
    }

    /// Conflicting supplement pairs within one list.
    pub fn validate_nutrient_conflicts(&self, supplements: &[String]) -> Vec<SafetyWarning> {
        NutrientConflictCheck::new(&self.tables).check(supplements)
    }

    /// Validate one supplement against the patient context.
    pub fn validate_supplement(&self, request: &SupplementRequest) -> ValidationResult {
        let upper = UpperLimitCheck::new(&self.tables, self.config.default_duration);
        let contraindications = ContraindicationCheck::new(&self.tables, self.matcher.as_ref());
        let unknown = UnknownContextCheck::new(self.config.gender_aware_unknown_context);
        let quality = QualityCheck::new(&self.tables);

        let checks: [&dyn SupplementCheck; 4] = [&upper, &contraindications, &unknown, &quality];
        let warnings: Vec<SafetyWarning> = checks
            .iter()
            .flat_map(|check| self.run_check(*check, request))
            .collect();

        if !self.tables.is_known_supplement(&request.supplement_name) {
            tracing::debug!(supplement = %request.supplement_name, "Supplement not in rule tables");
        }

        let result = ValidationResult::new(request.supplement_name.as_str(), warnings);
        tracing::debug!(
            supplement = %result.supplement_name,
            is_valid = result.is_valid,
            warnings = result.warnings.len(),
            max_severity = ?result.max_severity(),
            "Supplement validated"
        );
        result
    }

    /// Validate one supplement, containing any panic to that supplement.
    fn validate_isolated(&self, request: &SupplementRequest) -> ValidationResult {
        match panic::catch_unwind(AssertUnwindSafe(|| self.validate_supplement(request))) {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    supplement = %request.supplement_name,
                    "Validation panicked, degrading to review warning"
                );
                ValidationResult::new(
                    request.supplement_name.as_str(),
                    vec![degraded_warning(
                        &request.supplement_name,
                        CheckKind::Contraindication,
                        "error interno durante la validación",
                    )],
                )
            }
        }
    }

    /// Validate every proposed supplement plus the list-level checks.
    pub fn validate_recommendation_list(
        &self,
        supplements: &[ProposedSupplement],
        context: &PatientContext,
    ) -> RecommendationListResult {
        let span = tracing::info_span!("validate_recommendation_list", supplements = supplements.len());
        let _enter = span.enter();

        let supplement_validations: Vec<ValidationResult> = supplements
            .iter()
            .map(|s| self.validate_isolated(&SupplementRequest::for_supplement(s, context)))
            .collect();

        let names: Vec<String> = supplements.iter().map(|s| s.name.clone()).collect();
        let drug_depletion_warnings = self.validate_depletion_coverage(context.medications(), &names);
        let nutrient_conflict_warnings = self.validate_nutrient_conflicts(&names);

        let overall_requires_professional_review = supplement_validations
            .iter()
            .any(ValidationResult::requires_professional_review)
            || drug_depletion_warnings
                .iter()
                .chain(nutrient_conflict_warnings.iter())
                .any(SafetyWarning::requires_professional_review);

        let result = RecommendationListResult {
            supplement_validations,
            drug_depletion_warnings,
            nutrient_conflict_warnings,
            overall_requires_professional_review,
            evaluated_at: Utc::now(),
        };

        tracing::info!(
            supplements = result.supplement_validations.len(),
            warnings = result.all_warnings().count(),
            is_valid = result.is_valid(),
            requires_review = result.overall_requires_professional_review,
            "Recommendation list validated"
        );

        result
    }

    /// Attach each supplement's warnings, review flag and preferred form.
    pub fn annotate_recommendations(
        &self,
        supplements: &[ProposedSupplement],
        result: &RecommendationListResult,
    ) -> Vec<AnnotatedRecommendation> {
        annotate_recommendations(supplements, result)
    }
}

impl Default for SafetyEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

fn degraded_warning(supplement: &str, kind: CheckKind, reason: &str) -> SafetyWarning {
    SafetyWarning::new(
        supplement,
        kind.category(),
        Severity::Moderate,
        format!(
            "No se pudo completar la verificación de {} para {}.",
            kind.label(),
            supplement
        ),
        "Consulte a un profesional de la salud antes de tomar este suplemento.",
    )
    .with_professional_review()
    .with_detail(WarningDetail::Unverifiable {
        reason: reason.to_string(),
    })
}

/// Attach validation output back onto the proposed supplements.
///
/// Results are paired by position, falling back to a name lookup when the
/// lists do not line up.
pub fn annotate_recommendations(
    supplements: &[ProposedSupplement],
    result: &RecommendationListResult,
) -> Vec<AnnotatedRecommendation> {
    supplements
        .iter()
        .enumerate()
        .map(|(i, supplement)| {
            let validation = result
                .supplement_validations
                .get(i)
                .filter(|v| same_supplement(&v.supplement_name, &supplement.name))
                .or_else(|| {
                    result
                        .supplement_validations
                        .iter()
                        .find(|v| same_supplement(&v.supplement_name, &supplement.name))
                });

            AnnotatedRecommendation {
                name: supplement.name.clone(),
                dosage: supplement.dosage.clone(),
                warnings: validation.map(|v| v.warnings.clone()).unwrap_or_default(),
                requires_professional_review: validation
                    .is_some_and(ValidationResult::requires_professional_review),
                recommended_form: validation
                    .and_then(ValidationResult::recommended_form)
                    .map(str::to_string),
            }
        })
        .collect()
}
