//! Disclaimer generation: reduces a warning set to one tiered disclaimer.
//!
//! Level policy, applied to the highest severity present:
//! 1. Any CRITICAL warning → CRITICAL
//! 2. Else any MAJOR warning → ENHANCED
//! 3. Else → STANDARD

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::types::{PatientContext, RecommendationListResult, SafetyWarning, Severity};

/// Age under which supplementation needs a pediatrician.
const ADULT_AGE: u32 = 18;

const NOT_MEDICAL_ADVICE: &str = "Esta herramienta no sustituye el consejo médico profesional.";

/// Tier of the disclaimer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisclaimerLevel {
    Standard,
    Enhanced,
    Critical,
}

impl DisclaimerLevel {
    /// Level for the highest severity in a warning set.
    pub fn for_severity(max: Option<Severity>) -> Self {
        match max {
            Some(Severity::Critical) => DisclaimerLevel::Critical,
            Some(Severity::Major) => DisclaimerLevel::Enhanced,
            _ => DisclaimerLevel::Standard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisclaimerLevel::Standard => "STANDARD",
            DisclaimerLevel::Enhanced => "ENHANCED",
            DisclaimerLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for DisclaimerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The disclaimer shown alongside a set of recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disclaimer {
    pub level: DisclaimerLevel,

    /// Boilerplate for the level, tailored to the patient
    pub primary_disclaimer: String,

    /// Distinct warning messages to show verbatim, most severe first
    pub specific_warnings: Vec<String>,

    /// Imperative instruction; only at ENHANCED and CRITICAL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_required: Option<String>,

    pub professional_consult_required: bool,

    pub generated_at: DateTime<Utc>,
}

/// Builds disclaimers from warnings.
pub struct DisclaimerGenerator;

impl DisclaimerGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate the disclaimer for a warning set and patient.
    pub fn generate(&self, warnings: &[SafetyWarning], context: &PatientContext) -> Disclaimer {
        let max = warnings.iter().map(SafetyWarning::severity).max();
        let level = DisclaimerLevel::for_severity(max);
        let any_review = warnings.iter().any(SafetyWarning::requires_professional_review);

        tracing::debug!(level = %level, warnings = warnings.len(), "Generating disclaimer");

        Disclaimer {
            level,
            primary_disclaimer: self.primary_text(level, context),
            specific_warnings: self.specific_warnings(warnings),
            action_required: self.action_required(level),
            professional_consult_required: level != DisclaimerLevel::Standard || any_review,
            generated_at: Utc::now(),
        }
    }

    /// Generate the disclaimer covering every warning in a list result.
    pub fn generate_for_result(
        &self,
        result: &RecommendationListResult,
        context: &PatientContext,
    ) -> Disclaimer {
        let warnings: Vec<SafetyWarning> = result.all_warnings().cloned().collect();
        self.generate(&warnings, context)
    }

    fn primary_text(&self, level: DisclaimerLevel, context: &PatientContext) -> String {
        let mut text = match level {
            DisclaimerLevel::Standard => format!(
                "Estas recomendaciones son orientativas. {} Consulte a un profesional de la salud antes de iniciar cualquier suplemento.",
                NOT_MEDICAL_ADVICE
            ),
            DisclaimerLevel::Enhanced => format!(
                "Se han detectado advertencias importantes en estas recomendaciones. {} Revise cada advertencia con un profesional de la salud.",
                NOT_MEDICAL_ADVICE
            ),
            DisclaimerLevel::Critical => format!(
                "Se han detectado riesgos graves para la salud en estas recomendaciones. {} No tome los suplementos señalados sin supervisión médica.",
                NOT_MEDICAL_ADVICE
            ),
        };

        if context.is_pregnant == Some(true) || context.is_breastfeeding == Some(true) {
            text.push_str(
                " Durante el embarazo o la lactancia, cualquier suplemento debe ser aprobado por su médico.",
            );
        }
        if context.age.is_some_and(|age| age < ADULT_AGE) {
            text.push_str(" En menores de edad, la suplementación debe ser indicada por un pediatra.");
        }
        if !context.medications().is_empty() {
            text.push_str(
                " Informe a su médico y farmacéutico de todos los suplementos que toma junto con su medicación.",
            );
        }

        text
    }

    /// MAJOR and CRITICAL messages plus any flagged for review, most
    /// severe first, without duplicates.
    fn specific_warnings(&self, warnings: &[SafetyWarning]) -> Vec<String> {
        let mut surfaced: Vec<&SafetyWarning> = warnings
            .iter()
            .filter(|w| w.severity() >= Severity::Major || w.requires_professional_review())
            .collect();
        surfaced.sort_by(|a, b| b.severity().cmp(&a.severity()));

        let mut seen = HashSet::new();
        surfaced
            .into_iter()
            .map(SafetyWarning::message)
            .filter(|m| seen.insert(*m))
            .map(str::to_string)
            .collect()
    }

    fn action_required(&self, level: DisclaimerLevel) -> Option<String> {
        match level {
            DisclaimerLevel::Standard => None,
            DisclaimerLevel::Enhanced => Some("Consulte a su médico antes de continuar.".to_string()),
            DisclaimerLevel::Critical => Some(
                "No tome los suplementos señalados y consulte a su médico antes de continuar."
                    .to_string(),
            ),
        }
    }
}

impl Default for DisclaimerGenerator {
    fn default() -> Self {
        Self::new()
    }
}
