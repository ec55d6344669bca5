//! Contraindication evaluator.
//!
//! Medication and condition triggers are matched through the configured
//! [`TermMatcher`]; pregnancy, breastfeeding, age and gender triggers match
//! only when the patient fact is known. Unknown facts are reported by the
//! unknown-context evaluator instead.

use crate::matching::TermMatcher;
use crate::rules::{ContraindicationRule, RuleTables, Trigger};
use crate::types::{
    PatientContext, SafetyWarning, Severity, SupplementRequest, WarningCategory,
};

use super::{CheckKind, EvaluationError, SupplementCheck};

/// Marker required on critical pregnancy and breastfeeding warnings.
const CONTRAINDICATED_MARKER: &str = "CONTRAINDICADO";

/// Cross-references a supplement against medications, conditions and
/// physiological state.
pub struct ContraindicationCheck<'a> {
    tables: &'a RuleTables,
    matcher: &'a dyn TermMatcher,
}

impl<'a> ContraindicationCheck<'a> {
    pub fn new(tables: &'a RuleTables, matcher: &'a dyn TermMatcher) -> Self {
        Self { tables, matcher }
    }

    /// The patient fact that activates `trigger`, if it matches.
    fn matched_fact(
        &self,
        supplement: &str,
        trigger: &Trigger,
        context: &PatientContext,
    ) -> Result<Option<String>, EvaluationError> {
        let fact = match trigger {
            Trigger::Medication { category } => {
                let set = self.tables.medication_category(category).ok_or_else(|| {
                    EvaluationError::UnknownMedicationCategory {
                        supplement: supplement.to_string(),
                        category: category.clone(),
                    }
                })?;
                self.matcher
                    .find_match(context.medications(), &set.aliases)
                    .map(str::to_string)
            }
            Trigger::Condition { condition } => {
                let set = self.tables.condition(condition).ok_or_else(|| {
                    EvaluationError::UnknownCondition {
                        supplement: supplement.to_string(),
                        condition: condition.clone(),
                    }
                })?;
                self.matcher
                    .find_match(context.conditions(), &set.aliases)
                    .map(str::to_string)
            }
            Trigger::Pregnancy => (context.is_pregnant == Some(true)).then(|| "embarazo".to_string()),
            Trigger::Breastfeeding => {
                (context.is_breastfeeding == Some(true)).then(|| "lactancia".to_string())
            }
            Trigger::AgeBelow { years } => context
                .age
                .filter(|age| age < years)
                .map(|age| format!("{} años", age)),
            Trigger::Gender { gender } => (context.gender == Some(*gender))
                .then(|| gender.as_str().to_string()),
        };
        Ok(fact)
    }

    fn warning(&self, supplement: &str, rule: &ContraindicationRule, fact: &str) -> SafetyWarning {
        let category = if rule.trigger.is_medication() {
            WarningCategory::DrugInteraction
        } else {
            WarningCategory::Contraindication
        };

        let physiological = matches!(rule.trigger, Trigger::Pregnancy | Trigger::Breastfeeding);
        let mut message = if physiological
            && rule.severity == Severity::Critical
            && !rule.message.contains(CONTRAINDICATED_MARKER)
        {
            format!("{}: {}", CONTRAINDICATED_MARKER, rule.message)
        } else {
            rule.message.clone()
        };

        match &rule.trigger {
            Trigger::Medication { .. } => {
                message.push_str(&format!(" Medicamento detectado: {}.", fact));
            }
            Trigger::Condition { .. } => {
                message.push_str(&format!(" Condición detectada: {}.", fact));
            }
            _ => {}
        }

        SafetyWarning::new(
            supplement,
            category,
            rule.severity,
            message,
            rule.recommendation.clone(),
        )
    }

    pub fn check(&self, request: &SupplementRequest) -> Result<Vec<SafetyWarning>, EvaluationError> {
        let name = request.supplement_name.as_str();
        let mut warnings = Vec::new();

        for rule in self.tables.contraindications_for(name) {
            if let Some(fact) = self.matched_fact(name, &rule.trigger, &request.context)? {
                tracing::debug!(
                    supplement = %name,
                    trigger = ?rule.trigger,
                    severity = %rule.severity,
                    matcher = self.matcher.name(),
                    "Contraindication matched"
                );
                warnings.push(self.warning(name, rule, &fact));
            }
        }

        Ok(warnings)
    }
}

impl SupplementCheck for ContraindicationCheck<'_> {
    fn kind(&self) -> CheckKind {
        CheckKind::Contraindication
    }

    fn evaluate(&self, request: &SupplementRequest) -> Result<Vec<SafetyWarning>, EvaluationError> {
        self.check(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::SubstringMatcher;
    use crate::rules::builtin_tables;
    use crate::types::Gender;

    fn check(name: &str, context: PatientContext) -> Result<Vec<SafetyWarning>, EvaluationError> {
        let tables = builtin_tables();
        let matcher = SubstringMatcher::new();
        ContraindicationCheck::new(&tables, &matcher)
            .check(&SupplementRequest::new(name, "1 cápsula").with_context(context))
    }

    #[test]
    fn test_warfarin_matches_anticoagulant_category() {
        let warnings = check(
            "Omega-3 (EPA y DHA)",
            PatientContext::new().with_medications(["Warfarina 5mg"]),
        )
        .unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category(), WarningCategory::DrugInteraction);
        assert_eq!(warnings[0].severity(), Severity::Major);
        assert!(warnings[0].message().contains("sangrado"));
        assert!(warnings[0].message().contains("Warfarina 5mg"));
    }

    #[test]
    fn test_accented_medication_matches() {
        let warnings = check(
            "Hierro",
            PatientContext::new().with_medications(["omeprazól"]),
        )
        .unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity(), Severity::Minor);
    }

    #[test]
    fn test_pregnancy_critical_is_marked() {
        let warnings = check("Vitamina A", PatientContext::new().with_pregnancy(true)).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity(), Severity::Critical);
        assert_eq!(warnings[0].category(), WarningCategory::Contraindication);
        assert!(warnings[0].message().contains("CONTRAINDICADO"));
    }

    #[test]
    fn test_unknown_pregnancy_does_not_trigger() {
        assert!(check("Vitamina A", PatientContext::new()).unwrap().is_empty());
        assert!(check("Vitamina A", PatientContext::new().with_pregnancy(false))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_condition_matching() {
        let warnings = check(
            "Potasio",
            PatientContext::new().with_conditions(["Insuficiencia Renal crónica"]),
        )
        .unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity(), Severity::Critical);
        assert_eq!(warnings[0].category(), WarningCategory::Contraindication);
    }

    #[test]
    fn test_age_and_gender_triggers() {
        let warnings = check("Melatonina", PatientContext::new().with_age(12)).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(check("Melatonina", PatientContext::new().with_age(40)).unwrap().is_empty());

        let warnings = check("Hierro", PatientContext::new().with_gender(Gender::Hombre)).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(check("Hierro", PatientContext::new().with_gender(Gender::Mujer))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_no_match_is_empty() {
        let warnings = check(
            "Omega-3 (EPA y DHA)",
            PatientContext::new().with_medications(["paracetamol"]),
        )
        .unwrap();
        assert!(warnings.is_empty());
        assert!(check("Espirulina", PatientContext::new()).unwrap().is_empty());
    }

    #[test]
    fn test_marker_added_for_unmarked_critical_rule() {
        let mut tables = builtin_tables().as_ref().clone();
        tables.contraindications.insert(
            "Retinol".to_string(),
            vec![ContraindicationRule {
                trigger: Trigger::Breastfeeding,
                severity: Severity::Critical,
                message: "Evitar durante la lactancia.".to_string(),
                recommendation: "No tomar.".to_string(),
            }],
        );
        let matcher = SubstringMatcher::new();
        let warnings = ContraindicationCheck::new(&tables, &matcher)
            .check(
                &SupplementRequest::new("Retinol", "1 cápsula")
                    .with_context(PatientContext::new().with_breastfeeding(true)),
            )
            .unwrap();
        assert!(warnings[0].message().starts_with("CONTRAINDICADO: "));
    }

    #[test]
    fn test_dangling_category_is_an_error() {
        let mut tables = builtin_tables().as_ref().clone();
        tables.medication_categories.remove("anticoagulantes");
        let matcher = SubstringMatcher::new();
        let result = ContraindicationCheck::new(&tables, &matcher).check(
            &SupplementRequest::new("Vitamina K", "100 mcg")
                .with_context(PatientContext::new().with_medications(["warfarina"])),
        );
        assert!(matches!(
            result,
            Err(EvaluationError::UnknownMedicationCategory { .. })
        ));
    }
}
