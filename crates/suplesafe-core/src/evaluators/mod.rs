//! Safety evaluators.
//!
//! Each per-supplement evaluator answers one question about one supplement
//! and patient context, and reports its answer as warnings:
//!
//! - **Upper limit**: does the dose exceed the tolerable upper intake?
//! - **Contraindication**: do medications, conditions or physiology rule it out?
//! - **Unknown context**: which critical patient facts were never answered?
//! - **Quality**: is there a preferred chemical form?
//!
//! Two evaluators work on the whole list instead: depletion coverage and
//! nutrient conflicts.
//!
//! Evaluators borrow the rule tables; they never own or mutate them.

mod contraindication;
mod depletion;
mod nutrient_conflict;
mod quality;
mod unknown_context;
mod upper_limit;

pub use contraindication::ContraindicationCheck;
pub use depletion::{DepletionCheck, DepletionFinding, DepletionReport};
pub use nutrient_conflict::NutrientConflictCheck;
pub use quality::QualityCheck;
pub use unknown_context::UnknownContextCheck;
pub use upper_limit::UpperLimitCheck;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{SafetyWarning, SupplementRequest, WarningCategory};

/// Errors an evaluator can hit while consulting the rule tables.
///
/// Never surfaced to callers of the validator: a failed check degrades to
/// a review warning for the affected supplement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Rules for '{supplement}' reference unknown medication category '{category}'")]
    UnknownMedicationCategory { supplement: String, category: String },

    #[error("Rules for '{supplement}' reference unknown condition '{condition}'")]
    UnknownCondition { supplement: String, condition: String },

    #[error("Depletion rules reference unknown medication category '{0}'")]
    UnknownDepletionCategory(String),
}

/// The evaluators the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    UpperLimit,
    Contraindication,
    UnknownContext,
    Quality,
    Depletion,
    NutrientConflict,
}

impl CheckKind {
    /// Category used for warnings this check emits when it cannot complete.
    pub fn category(&self) -> WarningCategory {
        match self {
            CheckKind::UpperLimit => WarningCategory::UpperLimit,
            CheckKind::Contraindication | CheckKind::UnknownContext => {
                WarningCategory::Contraindication
            }
            CheckKind::Quality => WarningCategory::Quality,
            CheckKind::Depletion => WarningCategory::DrugInteraction,
            CheckKind::NutrientConflict => WarningCategory::NutrientConflict,
        }
    }

    /// Spanish name used in degraded-check messages.
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::UpperLimit => "límite superior de ingesta",
            CheckKind::Contraindication => "contraindicaciones",
            CheckKind::UnknownContext => "datos del paciente",
            CheckKind::Quality => "forma recomendada",
            CheckKind::Depletion => "depleción de nutrientes",
            CheckKind::NutrientConflict => "interacciones entre nutrientes",
        }
    }
}

/// A check run against one supplement and patient context.
pub trait SupplementCheck {
    /// Which check this is.
    fn kind(&self) -> CheckKind;

    /// Evaluate the request and return zero or more warnings.
    fn evaluate(&self, request: &SupplementRequest) -> Result<Vec<SafetyWarning>, EvaluationError>;
}
