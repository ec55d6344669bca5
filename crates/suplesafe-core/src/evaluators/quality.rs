//! Quality evaluator: preferred chemical form.

use crate::rules::RuleTables;
use crate::types::{SafetyWarning, Severity, SupplementRequest, WarningCategory, WarningDetail};

use super::{CheckKind, EvaluationError, SupplementCheck};

/// Recommends the preferred form of a supplement when one is known.
pub struct QualityCheck<'a> {
    tables: &'a RuleTables,
}

impl<'a> QualityCheck<'a> {
    pub fn new(tables: &'a RuleTables) -> Self {
        Self { tables }
    }

    pub fn check(&self, request: &SupplementRequest) -> Vec<SafetyWarning> {
        let name = request.supplement_name.as_str();
        let Some(preferred) = self.tables.preferred_form(name) else {
            return Vec::new();
        };

        vec![SafetyWarning::new(
            name,
            WarningCategory::Quality,
            Severity::Info,
            format!("Forma recomendada de {}: {}. {}.", name, preferred.form, preferred.reason),
            format!("Elija productos con {}.", preferred.form),
        )
        .with_detail(WarningDetail::PreferredForm {
            form: preferred.form.clone(),
        })]
    }
}

impl SupplementCheck for QualityCheck<'_> {
    fn kind(&self) -> CheckKind {
        CheckKind::Quality
    }

    fn evaluate(&self, request: &SupplementRequest) -> Result<Vec<SafetyWarning>, EvaluationError> {
        Ok(self.check(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin_tables;

    #[test]
    fn test_iron_prefers_bisglycinate() {
        let tables = builtin_tables();
        let warnings = QualityCheck::new(&tables).check(&SupplementRequest::new("Hierro", "18 mg"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity(), Severity::Info);
        assert!(!warnings[0].requires_professional_review());
        assert!(matches!(
            warnings[0].detail(),
            Some(WarningDetail::PreferredForm { form }) if form.contains("bisglicinato")
        ));
    }

    #[test]
    fn test_no_preferred_form() {
        let tables = builtin_tables();
        let warnings = QualityCheck::new(&tables).check(&SupplementRequest::new("Vitamina C", "500 mg"));
        assert!(warnings.is_empty());
    }
}
