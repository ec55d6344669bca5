//! Drug-nutrient depletion evaluator.
//!
//! Maps the patient's medications to nutrients they are known to deplete,
//! then reports each replacement supplement missing from the proposed list.
//! Nutrients the list already covers produce nothing.

use serde::{Deserialize, Serialize};

use crate::matching::TermMatcher;
use crate::rules::{same_supplement, RuleTables};
use crate::types::{SafetyWarning, Severity, WarningCategory, WarningDetail};

use super::{CheckKind, EvaluationError};

/// One medication-nutrient depletion found in the patient's list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepletionFinding {
    /// Medication as the patient wrote it
    pub medication: String,

    /// Display name of the matched category
    pub category: String,

    pub nutrient: String,

    /// Supplement that replaces the nutrient
    pub supplement: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
}

/// All depletions for a medication list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepletionReport {
    pub depletions: Vec<DepletionFinding>,

    /// Replacement supplements, deduplicated, in order of first finding
    pub recommended_supplements: Vec<String>,
}

/// Detects depleted nutrients and gaps in the recommendation list.
pub struct DepletionCheck<'a> {
    tables: &'a RuleTables,
    matcher: &'a dyn TermMatcher,
}

impl<'a> DepletionCheck<'a> {
    pub fn new(tables: &'a RuleTables, matcher: &'a dyn TermMatcher) -> Self {
        Self { tables, matcher }
    }

    pub fn kind(&self) -> CheckKind {
        CheckKind::Depletion
    }

    /// Nutrients depleted by each medication.
    pub fn detect(&self, medications: &[String]) -> Result<DepletionReport, EvaluationError> {
        let mut report = DepletionReport::default();

        for medication in medications {
            for (category, rules) in &self.tables.depletions {
                let set = self
                    .tables
                    .medication_category(category)
                    .ok_or_else(|| EvaluationError::UnknownDepletionCategory(category.clone()))?;

                if !set.aliases.iter().any(|alias| self.matcher.matches(medication, alias)) {
                    continue;
                }

                for rule in rules {
                    report.depletions.push(DepletionFinding {
                        medication: medication.clone(),
                        category: set.label.clone(),
                        nutrient: rule.nutrient.clone(),
                        supplement: rule.supplement.clone(),
                        mechanism: rule.mechanism.clone(),
                    });
                    if !report
                        .recommended_supplements
                        .iter()
                        .any(|s| same_supplement(s, &rule.supplement))
                    {
                        report.recommended_supplements.push(rule.supplement.clone());
                    }
                }
            }
        }

        Ok(report)
    }

    /// One warning per replacement supplement missing from `recommended`.
    pub fn coverage_warnings(
        &self,
        medications: &[String],
        recommended: &[String],
    ) -> Result<Vec<SafetyWarning>, EvaluationError> {
        let report = self.detect(medications)?;
        let mut warnings = Vec::new();

        for supplement in &report.recommended_supplements {
            if recommended.iter().any(|r| same_supplement(r, supplement)) {
                continue;
            }

            let findings: Vec<&DepletionFinding> = report
                .depletions
                .iter()
                .filter(|f| same_supplement(&f.supplement, supplement))
                .collect();

            let mut causes: Vec<String> = Vec::new();
            for finding in &findings {
                if !causes.contains(&finding.medication) {
                    causes.push(finding.medication.clone());
                }
            }
            let nutrient = findings
                .first()
                .map_or_else(|| supplement.clone(), |f| f.nutrient.clone());

            tracing::debug!(supplement = %supplement, causes = ?causes, "Depletion not covered");

            warnings.push(
                SafetyWarning::new(
                    supplement.as_str(),
                    WarningCategory::DrugInteraction,
                    Severity::Moderate,
                    format!(
                        "{} puede reducir los niveles de {}, y {} no está incluido en las recomendaciones.",
                        causes.join(", "),
                        nutrient,
                        supplement
                    ),
                    format!(
                        "Consulte con su médico si conviene añadir {} o controlar sus niveles de {}.",
                        supplement, nutrient
                    ),
                )
                .with_professional_review()
                .with_detail(WarningDetail::Depletion {
                    medications: causes,
                    nutrient,
                }),
            );
        }

        Ok(warnings)
    }
}
