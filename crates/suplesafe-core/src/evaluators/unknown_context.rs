//! Unknown-context evaluator.
//!
//! Pregnancy, breastfeeding and pre-existing conditions gate the most severe
//! contraindications. When any of them was never answered, the engine
//! cannot rule those contraindications out, so it says so in one combined
//! MODERATE warning. `Some(false)` and an empty condition list are answers.

use crate::types::{
    Gender, PatientContext, SafetyWarning, Severity, SupplementRequest, UnknownFact,
    WarningDetail,
};

use super::{CheckKind, EvaluationError, SupplementCheck};

/// Flags supplements evaluated without critical patient facts.
#[derive(Debug, Clone, Copy)]
pub struct UnknownContextCheck {
    gender_aware: bool,
}

impl UnknownContextCheck {
    /// With `gender_aware`, a male patient is not asked about pregnancy or
    /// breastfeeding.
    pub fn new(gender_aware: bool) -> Self {
        Self { gender_aware }
    }

    /// Facts the context leaves unanswered, in a fixed order.
    pub fn missing_facts(&self, context: &PatientContext) -> Vec<UnknownFact> {
        let not_applicable = self.gender_aware && context.gender == Some(Gender::Hombre);
        let mut missing = Vec::new();

        if context.is_pregnant.is_none() && !not_applicable {
            missing.push(UnknownFact::Pregnancy);
        }
        if context.is_breastfeeding.is_none() && !not_applicable {
            missing.push(UnknownFact::Breastfeeding);
        }
        if context.conditions.is_none() {
            missing.push(UnknownFact::Conditions);
        }

        missing
    }

    pub fn check(&self, request: &SupplementRequest) -> Vec<SafetyWarning> {
        let missing = self.missing_facts(&request.context);
        if missing.is_empty() {
            return Vec::new();
        }

        let name = request.supplement_name.as_str();
        let labels: Vec<&str> = missing.iter().map(UnknownFact::label).collect();
        let defaults: Vec<&str> = missing.iter().map(UnknownFact::assumed_default).collect();

        tracing::debug!(supplement = %name, missing = ?missing, "Patient context incomplete");

        let message = format!(
            "Información del paciente no especificada: {}. No se pueden descartar contraindicaciones de {} relacionadas con estos datos.",
            labels.join(", "),
            name
        );
        let recommendation = format!(
            "Se asume que la persona {}. Confirme estos datos con un profesional de la salud antes de tomar {}.",
            join_spanish(&defaults),
            name
        );

        vec![SafetyWarning::new(
            name,
            CheckKind::UnknownContext.category(),
            Severity::Moderate,
            message,
            recommendation,
        )
        .with_professional_review()
        .with_detail(WarningDetail::UnknownContext { missing })]
    }
}

impl Default for UnknownContextCheck {
    fn default() -> Self {
        Self::new(true)
    }
}

/// "a", "a y b", "a, b y c".
fn join_spanish(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} y {}", init.join(", "), last),
    }
}

impl SupplementCheck for UnknownContextCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::UnknownContext
    }

    fn evaluate(&self, request: &SupplementRequest) -> Result<Vec<SafetyWarning>, EvaluationError> {
        Ok(self.check(request))
    }
}
