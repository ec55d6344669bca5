//! Nutrient conflict evaluator: supplement pairs in the same list that
//! compete for absorption.

use crate::rules::{same_supplement, RuleTables};
use crate::types::{SafetyWarning, WarningCategory};

use super::CheckKind;

pub struct NutrientConflictCheck<'a> {
    tables: &'a RuleTables,
}

impl<'a> NutrientConflictCheck<'a> {
    pub fn new(tables: &'a RuleTables) -> Self {
        Self { tables }
    }

    pub fn kind(&self) -> CheckKind {
        CheckKind::NutrientConflict
    }

    /// One warning per conflicting pair present in `supplements`.
    pub fn check(&self, supplements: &[String]) -> Vec<SafetyWarning> {
        let find = |wanted: &str| supplements.iter().find(|s| same_supplement(s, wanted));

        self.tables
            .nutrient_conflicts
            .iter()
            .filter_map(|conflict| {
                let [a, b] = &conflict.supplements;
                let (first, second) = (find(a)?, find(b)?);
                Some(SafetyWarning::new(
                    format!("{} + {}", first, second),
                    WarningCategory::NutrientConflict,
                    conflict.severity,
                    conflict.message.clone(),
                    conflict.recommendation.clone(),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin_tables;
    use crate::types::Severity;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_calcium_and_iron_conflict() {
        let tables = builtin_tables();
        let warnings = NutrientConflictCheck::new(&tables).check(&names(&["Hierro", "Vitamina C", "calcio"]));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].supplement_name(), "calcio + Hierro");
        assert_eq!(warnings[0].severity(), Severity::Minor);
        assert!(!warnings[0].requires_professional_review());
    }

    #[test]
    fn test_no_conflict() {
        let tables = builtin_tables();
        assert!(NutrientConflictCheck::new(&tables)
            .check(&names(&["Vitamina C", "Magnesio"]))
            .is_empty());
    }
}
