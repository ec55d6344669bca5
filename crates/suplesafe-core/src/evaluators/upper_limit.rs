//! Upper-limit evaluator.
//!
//! Severity policy against the applicable limit `L`:
//!
//! | Normalized dose | Result |
//! |-----------------|--------|
//! | `≤ L` | no warning |
//! | `L < d ≤ 2L` | MAJOR |
//! | `> 2L` | CRITICAL |
//! | unparseable / unconvertible | INFO, unverifiable |

use crate::rules::RuleTables;
use crate::types::{
    IntakeDuration, SafetyWarning, Severity, SupplementRequest, WarningCategory, WarningDetail,
};
use crate::units::{format_amount, normalize_dosage_to_standard_unit, parse_dosage};

use super::{CheckKind, EvaluationError, SupplementCheck};

/// Relative slack absorbing floating-point noise from conversions.
const LIMIT_TOLERANCE: f64 = 1e-9;

/// Compares a dose against the supplement's upper intake limit.
pub struct UpperLimitCheck<'a> {
    tables: &'a RuleTables,
    default_duration: IntakeDuration,
}

impl<'a> UpperLimitCheck<'a> {
    pub fn new(tables: &'a RuleTables, default_duration: IntakeDuration) -> Self {
        Self {
            tables,
            default_duration,
        }
    }

    /// Severity for a normalized amount against a limit, `None` if within it.
    pub fn severity_for(amount: f64, limit: f64) -> Option<Severity> {
        if amount <= limit * (1.0 + LIMIT_TOLERANCE) {
            None
        } else if amount <= 2.0 * limit * (1.0 + LIMIT_TOLERANCE) {
            Some(Severity::Major)
        } else {
            Some(Severity::Critical)
        }
    }

    pub fn check(&self, request: &SupplementRequest) -> Vec<SafetyWarning> {
        let name = request.supplement_name.as_str();

        let Some(rule) = self.tables.upper_limit(name) else {
            tracing::debug!(supplement = %name, "No upper limit rule");
            return Vec::new();
        };

        let Some(parsed) = parse_dosage(&request.dosage) else {
            tracing::debug!(supplement = %name, dosage = %request.dosage, "Dosage not parseable");
            return vec![unverifiable(
                name,
                format!(
                    "No se pudo interpretar la dosis \"{}\" de {}; no se verificó el límite superior de {} {}.",
                    request.dosage,
                    name,
                    format_amount(rule.long_term),
                    rule.unit
                ),
                "dosis no interpretable",
            )];
        };

        let outcome =
            normalize_dosage_to_standard_unit(parsed.amount, parsed.unit, rule.unit, Some(name));
        if !outcome.success {
            return vec![unverifiable(
                name,
                format!(
                    "No se puede comparar la dosis de {} ({} {}) con el límite superior expresado en {}.",
                    name,
                    format_amount(parsed.amount),
                    parsed.unit,
                    rule.unit
                ),
                &format!("conversión no soportada de {} a {}", parsed.unit, rule.unit),
            )];
        }

        let duration = request.duration.unwrap_or(self.default_duration);
        let limit = rule.limit_for(duration);
        let amount = outcome.normalized_amount;

        let Some(severity) = Self::severity_for(amount, limit) else {
            return Vec::new();
        };

        tracing::debug!(
            supplement = %name,
            amount,
            limit,
            duration = duration.label(),
            severity = %severity,
            "Upper limit exceeded"
        );

        let dose_text = match &outcome.conversion_applied {
            Some(_) => format!(
                "{} {} (equivalente a {} {})",
                format_amount(parsed.amount),
                parsed.unit,
                format_amount(amount),
                rule.unit
            ),
            None => format!("{} {}", format_amount(amount), rule.unit),
        };

        let excess = if severity == Severity::Critical {
            "más del doble del"
        } else {
            "el"
        };

        let message = format!(
            "La dosis de {} {} supera {} límite superior tolerable para uso a {} ({} {}).",
            name,
            dose_text,
            excess,
            duration.label(),
            format_amount(limit),
            rule.unit
        );

        let recommendation = match severity {
            Severity::Critical => format!(
                "No tome esta dosis sin supervisión médica. Reduzca a {} {} o menos.",
                format_amount(limit),
                rule.unit
            ),
            _ => format!(
                "Reduzca la dosis a {} {} o menos, o consulte a un profesional de la salud.",
                format_amount(limit),
                rule.unit
            ),
        };

        let mut warning =
            SafetyWarning::new(name, WarningCategory::UpperLimit, severity, message, recommendation);
        if outcome.conversion_applied.is_some() {
            warning = warning.with_detail(WarningDetail::Conversion {
                original_amount: parsed.amount,
                original_unit: parsed.unit.to_string(),
                converted_amount: amount,
                converted_unit: rule.unit.to_string(),
            });
        }

        vec![warning]
    }
}

fn unverifiable(name: &str, message: String, reason: &str) -> SafetyWarning {
    SafetyWarning::new(
        name,
        WarningCategory::UpperLimit,
        Severity::Info,
        message,
        "Verifique la dosis con un profesional de la salud antes de tomarla.",
    )
    .with_detail(WarningDetail::Unverifiable {
        reason: reason.to_string(),
    })
}

impl SupplementCheck for UpperLimitCheck<'_> {
    fn kind(&self) -> CheckKind {
        CheckKind::UpperLimit
    }

    fn evaluate(&self, request: &SupplementRequest) -> Result<Vec<SafetyWarning>, EvaluationError> {
        Ok(self.check(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin_tables;

    fn check(name: &str, dosage: &str) -> Vec<SafetyWarning> {
        let tables = builtin_tables();
        UpperLimitCheck::new(&tables, IntakeDuration::LongTerm).check(&SupplementRequest::new(name, dosage))
    }

    #[test]
    fn test_within_limit_no_warning() {
        assert!(check("Vitamina D", "2000 UI").is_empty());
        assert!(check("Vitamina D", "4000 UI").is_empty());
    }

    #[test]
    fn test_above_limit_is_major() {
        let warnings = check("Vitamina D", "6000 UI");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity(), Severity::Major);
        assert_eq!(warnings[0].category(), WarningCategory::UpperLimit);
        assert!(warnings[0].requires_professional_review());
    }

    #[test]
    fn test_above_double_limit_is_critical() {
        let warnings = check("Vitamina D", "15000 UI");
        assert_eq!(warnings[0].severity(), Severity::Critical);
        assert!(warnings[0].message().contains("15000 UI"));
    }

    #[test]
    fn test_range_evaluated_at_maximum() {
        let warnings = check("Vitamina C", "1500-2500 mg");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity(), Severity::Major);
    }

    #[test]
    fn test_unknown_supplement_no_warning() {
        assert!(check("Espirulina", "50000 mg").is_empty());
    }

    #[test]
    fn test_unparseable_dosage_is_info() {
        let warnings = check("Vitamina D", "según indicación médica");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity(), Severity::Info);
        assert!(matches!(
            warnings[0].detail(),
            Some(WarningDetail::Unverifiable { .. })
        ));
    }

    #[test]
    fn test_failed_conversion_is_never_a_pass() {
        let warnings = check("Magnesio", "5 ml");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity(), Severity::Info);
        assert!(warnings[0].message().contains("No se puede comparar"));
    }

    #[test]
    fn test_conversion_is_traced_in_message() {
        let warnings = check("Vitamina A", "15000 UI");
        assert_eq!(warnings.len(), 1);
        let message = warnings[0].message();
        assert!(message.contains("15000 UI"));
        assert!(message.contains("4504.5 mcg RAE"));
        assert!(matches!(
            warnings[0].detail(),
            Some(WarningDetail::Conversion { converted_unit, .. }) if converted_unit == "mcg RAE"
        ));
    }

    #[test]
    fn test_short_term_uses_higher_limit() {
        let tables = builtin_tables();
        let check = UpperLimitCheck::new(&tables, IntakeDuration::LongTerm);

        let request = SupplementRequest::new("Vitamina D", "8000 UI")
            .with_duration(IntakeDuration::ShortTerm);
        assert!(check.check(&request).is_empty());

        let request = SupplementRequest::new("Vitamina D", "12000 UI")
            .with_duration(IntakeDuration::ShortTerm);
        let warnings = check.check(&request);
        assert_eq!(warnings[0].severity(), Severity::Major);
        assert!(warnings[0].message().contains("corto plazo"));
    }

    #[test]
    fn test_grams_of_omega3_convert() {
        let warnings = check("Omega-3 (EPA y DHA)", "4 g");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity(), Severity::Major);
        assert!(warnings[0].message().contains("4000 mg combinados"));
    }

    #[test]
    fn test_severity_for_boundaries() {
        assert_eq!(UpperLimitCheck::severity_for(100.0, 100.0), None);
        assert_eq!(UpperLimitCheck::severity_for(100.1, 100.0), Some(Severity::Major));
        assert_eq!(UpperLimitCheck::severity_for(200.0, 100.0), Some(Severity::Major));
        assert_eq!(UpperLimitCheck::severity_for(200.1, 100.0), Some(Severity::Critical));
    }
}
