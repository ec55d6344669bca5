//! Core data types for safety validation.
//!
//! Every warning, request and result the engine produces is plain data:
//! serializable, immutable once built, and owned by the call that created it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clinical severity of a finding.
///
/// Ordered: `Info < Minor < Moderate < Major < Critical`. Aggregation
/// (validity, disclaimer level, review flags) relies on this ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Minor,
    Moderate,
    Major,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Minor => "MINOR",
            Severity::Moderate => "MODERATE",
            Severity::Major => "MAJOR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// MAJOR and CRITICAL findings always require a professional.
    pub fn requires_review(&self) -> bool {
        *self >= Severity::Major
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of rule produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCategory {
    UpperLimit,
    Contraindication,
    DrugInteraction,
    NutrientConflict,
    Quality,
}

impl WarningCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCategory::UpperLimit => "UPPER_LIMIT",
            WarningCategory::Contraindication => "CONTRAINDICATION",
            WarningCategory::DrugInteraction => "DRUG_INTERACTION",
            WarningCategory::NutrientConflict => "NUTRIENT_CONFLICT",
            WarningCategory::Quality => "QUALITY",
        }
    }
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Patient gender as collected by the intake survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Hombre,
    Mujer,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Hombre => "hombre",
            Gender::Mujer => "mujer",
        }
    }
}

/// How long the supplement is meant to be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntakeDuration {
    ShortTerm,
    #[default]
    LongTerm,
}

impl IntakeDuration {
    /// Spanish qualifier used in warning messages.
    pub fn label(&self) -> &'static str {
        match self {
            IntakeDuration::ShortTerm => "corto plazo",
            IntakeDuration::LongTerm => "largo plazo",
        }
    }
}

/// A patient fact the intake flow did not answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnknownFact {
    Pregnancy,
    Breastfeeding,
    Conditions,
}

impl UnknownFact {
    /// Name of the fact as shown to the consumer.
    pub fn label(&self) -> &'static str {
        match self {
            UnknownFact::Pregnancy => "embarazo",
            UnknownFact::Breastfeeding => "lactancia",
            UnknownFact::Conditions => "condiciones médicas preexistentes",
        }
    }

    /// The default the engine assumes while the fact stays unknown.
    pub fn assumed_default(&self) -> &'static str {
        match self {
            UnknownFact::Pregnancy => "no está embarazada",
            UnknownFact::Breastfeeding => "no está en periodo de lactancia",
            UnknownFact::Conditions => "no tiene condiciones médicas preexistentes",
        }
    }
}

/// Machine-readable facts behind a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WarningDetail {
    /// A unit conversion was applied before comparing against a limit.
    Conversion {
        original_amount: f64,
        original_unit: String,
        converted_amount: f64,
        converted_unit: String,
    },
    /// Preferred chemical form for a supplement.
    PreferredForm { form: String },
    /// Nutrient depleted by one or more of the patient's medications.
    Depletion {
        medications: Vec<String>,
        nutrient: String,
    },
    /// Patient facts that were not provided.
    UnknownContext { missing: Vec<UnknownFact> },
    /// The check could not be completed; safety is unverified.
    Unverifiable { reason: String },
}

/// One safety finding.
///
/// Built through [`SafetyWarning::new`], which guarantees that MAJOR and
/// CRITICAL warnings require professional review. Fields are read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyWarning {
    supplement_name: String,
    category: WarningCategory,
    severity: Severity,
    message: String,
    recommendation: String,
    requires_professional_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<WarningDetail>,
}

impl SafetyWarning {
    pub fn new(
        supplement_name: impl Into<String>,
        category: WarningCategory,
        severity: Severity,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            supplement_name: supplement_name.into(),
            category,
            severity,
            message: message.into(),
            recommendation: recommendation.into(),
            requires_professional_review: severity.requires_review(),
            detail: None,
        }
    }

    /// Flag a lower-severity warning for professional review.
    pub fn with_professional_review(mut self) -> Self {
        self.requires_professional_review = true;
        self
    }

    pub fn with_detail(mut self, detail: WarningDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn supplement_name(&self) -> &str {
        &self.supplement_name
    }

    pub fn category(&self) -> WarningCategory {
        self.category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    pub fn requires_professional_review(&self) -> bool {
        self.requires_professional_review
    }

    pub fn detail(&self) -> Option<&WarningDetail> {
        self.detail.as_ref()
    }
}

/// What is known about the patient.
///
/// Every field is independently optional: `None` means "not asked / not
/// answered", which is different from `Some(false)` or `Some(vec![])`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pregnant: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_breastfeeding: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<Vec<String>>,
}

impl PatientContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_pregnancy(mut self, is_pregnant: bool) -> Self {
        self.is_pregnant = Some(is_pregnant);
        self
    }

    pub fn with_breastfeeding(mut self, is_breastfeeding: bool) -> Self {
        self.is_breastfeeding = Some(is_breastfeeding);
        self
    }

    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = Some(conditions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_medications<I, S>(mut self, medications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.medications = Some(medications.into_iter().map(Into::into).collect());
        self
    }

    /// Medications as a slice, empty when unknown.
    pub fn medications(&self) -> &[String] {
        self.medications.as_deref().unwrap_or(&[])
    }

    /// Conditions as a slice, empty when unknown.
    pub fn conditions(&self) -> &[String] {
        self.conditions.as_deref().unwrap_or(&[])
    }
}

/// A supplement proposed by the recommendation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedSupplement {
    /// Canonical supplement name (rule-table key)
    pub name: String,

    /// Free-text dosage as authored upstream (e.g. "500-1000 mg")
    pub dosage: String,
}

impl ProposedSupplement {
    pub fn new(name: impl Into<String>, dosage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dosage: dosage.into(),
        }
    }
}

/// Input to single-supplement validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementRequest {
    pub supplement_name: String,

    pub dosage: String,

    /// Falls back to the engine's configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<IntakeDuration>,

    #[serde(flatten)]
    pub context: PatientContext,
}

impl SupplementRequest {
    pub fn new(supplement_name: impl Into<String>, dosage: impl Into<String>) -> Self {
        Self {
            supplement_name: supplement_name.into(),
            dosage: dosage.into(),
            duration: None,
            context: PatientContext::default(),
        }
    }

    /// Build a request for one proposed supplement under a shared context.
    pub fn for_supplement(supplement: &ProposedSupplement, context: &PatientContext) -> Self {
        Self {
            supplement_name: supplement.name.clone(),
            dosage: supplement.dosage.clone(),
            duration: None,
            context: context.clone(),
        }
    }

    pub fn with_duration(mut self, duration: IntakeDuration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_context(mut self, context: PatientContext) -> Self {
        self.context = context;
        self
    }
}

/// Validation outcome for one supplement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub supplement_name: String,

    /// False iff any warning is CRITICAL
    pub is_valid: bool,

    pub warnings: Vec<SafetyWarning>,
}

impl ValidationResult {
    pub fn new(supplement_name: impl Into<String>, warnings: Vec<SafetyWarning>) -> Self {
        let is_valid = !warnings.iter().any(|w| w.severity() == Severity::Critical);
        Self {
            supplement_name: supplement_name.into(),
            is_valid,
            warnings,
        }
    }

    pub fn requires_professional_review(&self) -> bool {
        self.warnings.iter().any(SafetyWarning::requires_professional_review)
    }

    /// Highest severity among the warnings, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.warnings.iter().map(SafetyWarning::severity).max()
    }

    /// Preferred chemical form, taken from the QUALITY warning.
    pub fn recommended_form(&self) -> Option<&str> {
        self.warnings
            .iter()
            .filter(|w| w.category() == WarningCategory::Quality)
            .find_map(|w| match w.detail() {
                Some(WarningDetail::PreferredForm { form }) => Some(form.as_str()),
                _ => None,
            })
    }
}

/// Validation outcome for a whole recommendation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationListResult {
    /// One entry per proposed supplement, in input order
    pub supplement_validations: Vec<ValidationResult>,

    /// Nutrients depleted by medications and not covered by the list
    pub drug_depletion_warnings: Vec<SafetyWarning>,

    /// Pairs in the list that compete for absorption
    #[serde(default)]
    pub nutrient_conflict_warnings: Vec<SafetyWarning>,

    pub overall_requires_professional_review: bool,

    pub evaluated_at: DateTime<Utc>,
}

impl RecommendationListResult {
    /// Every warning in the result: per-supplement first, then list-level.
    pub fn all_warnings(&self) -> impl Iterator<Item = &SafetyWarning> {
        self.supplement_validations
            .iter()
            .flat_map(|v| v.warnings.iter())
            .chain(self.drug_depletion_warnings.iter())
            .chain(self.nutrient_conflict_warnings.iter())
    }

    /// True when no supplement carries a CRITICAL warning.
    pub fn is_valid(&self) -> bool {
        self.supplement_validations.iter().all(|v| v.is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Minor);
        assert!(Severity::Minor < Severity::Moderate);
        assert!(Severity::Moderate < Severity::Major);
        assert!(Severity::Major < Severity::Critical);
    }

    #[test]
    fn test_major_warning_forces_review() {
        let warning = SafetyWarning::new(
            "Zinc",
            WarningCategory::UpperLimit,
            Severity::Major,
            "msg",
            "rec",
        );
        assert!(warning.requires_professional_review());

        let info = SafetyWarning::new("Zinc", WarningCategory::Quality, Severity::Info, "m", "r");
        assert!(!info.requires_professional_review());
        assert!(info.with_professional_review().requires_professional_review());
    }

    #[test]
    fn test_validation_result_invalid_on_critical() {
        let critical = SafetyWarning::new(
            "Vitamina A",
            WarningCategory::Contraindication,
            Severity::Critical,
            "m",
            "r",
        );
        let result = ValidationResult::new("Vitamina A", vec![critical]);
        assert!(!result.is_valid);
        assert_eq!(result.max_severity(), Some(Severity::Critical));

        let result = ValidationResult::new("Vitamina C", vec![]);
        assert!(result.is_valid);
        assert!(!result.requires_professional_review());
    }

    #[test]
    fn test_recommended_form_from_quality_detail() {
        let quality = SafetyWarning::new("Hierro", WarningCategory::Quality, Severity::Info, "m", "r")
            .with_detail(WarningDetail::PreferredForm {
                form: "bisglicinato de hierro".to_string(),
            });
        let result = ValidationResult::new("Hierro", vec![quality]);
        assert_eq!(result.recommended_form(), Some("bisglicinato de hierro"));
    }

    #[test]
    fn test_patient_context_unknown_is_not_empty() {
        let unknown: PatientContext = serde_json::from_str("{}").unwrap();
        assert_eq!(unknown.conditions, None);

        let answered: PatientContext =
            serde_json::from_str(r#"{"conditions": [], "isPregnant": false}"#).unwrap();
        assert_eq!(answered.conditions, Some(vec![]));
        assert_eq!(answered.is_pregnant, Some(false));
        assert_eq!(answered.is_breastfeeding, None);
    }

    #[test]
    fn test_warning_json_shape() {
        let warning = SafetyWarning::new(
            "Vitamina D",
            WarningCategory::UpperLimit,
            Severity::Critical,
            "m",
            "r",
        );
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["supplementName"], "Vitamina D");
        assert_eq!(json["category"], "UPPER_LIMIT");
        assert_eq!(json["severity"], "CRITICAL");
        assert_eq!(json["requiresProfessionalReview"], true);
    }

    #[test]
    fn test_supplement_request_flattens_context() {
        let request: SupplementRequest = serde_json::from_str(
            r#"{"supplementName": "Zinc", "dosage": "25 mg", "age": 40, "gender": "hombre"}"#,
        )
        .unwrap();
        assert_eq!(request.context.age, Some(40));
        assert_eq!(request.context.gender, Some(Gender::Hombre));
        assert_eq!(request.duration, None);
    }
}
