//! Plain-text rendering for `--format text`.

use std::fmt::Write;

use suplesafe_core::{Disclaimer, SafetyWarning, ValidationResult};

use crate::commands::ValidationReport;

fn push_warning(out: &mut String, warning: &SafetyWarning) {
    let _ = writeln!(
        out,
        "  [{}] {}: {}",
        warning.severity(),
        warning.category(),
        warning.message()
    );
    if !warning.recommendation().is_empty() {
        let _ = writeln!(out, "      -> {}", warning.recommendation());
    }
}

pub fn render_validation(validation: &ValidationResult) -> String {
    let mut out = String::new();
    let status = if validation.is_valid { "OK" } else { "BLOQUEADO" };
    let _ = writeln!(out, "{} ({})", validation.supplement_name, status);
    if validation.warnings.is_empty() {
        out.push_str("  sin advertencias\n");
    }
    for warning in &validation.warnings {
        push_warning(&mut out, warning);
    }
    if let Some(form) = validation.recommended_form() {
        let _ = writeln!(out, "  forma recomendada: {}", form);
    }
    out
}

pub fn render_disclaimer(disclaimer: &Disclaimer) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nAviso ({}):", disclaimer.level);
    let _ = writeln!(out, "  {}", disclaimer.primary_disclaimer);
    for message in &disclaimer.specific_warnings {
        let _ = writeln!(out, "  - {}", message);
    }
    if let Some(action) = &disclaimer.action_required {
        let _ = writeln!(out, "  Acción requerida: {}", action);
    }
    out
}

pub fn render_report(report: &ValidationReport) -> String {
    let mut out = String::new();
    for validation in &report.result.supplement_validations {
        out.push_str(&render_validation(validation));
    }

    let depletions = &report.result.drug_depletion_warnings;
    if !depletions.is_empty() {
        out.push_str("\nDepleción de nutrientes:\n");
        for warning in depletions {
            push_warning(&mut out, warning);
        }
    }

    let conflicts = &report.result.nutrient_conflict_warnings;
    if !conflicts.is_empty() {
        out.push_str("\nConflictos entre nutrientes:\n");
        for warning in conflicts {
            push_warning(&mut out, warning);
        }
    }

    if report.result.overall_requires_professional_review {
        out.push_str("\nRequiere revisión profesional.\n");
    }
    out.push_str(&render_disclaimer(&report.disclaimer));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use suplesafe_core::{PatientContext, ProposedSupplement, SafetyEngine};

    use crate::commands::{build_report, ValidationRequest};

    #[test]
    fn test_text_report_lists_every_supplement() {
        let request = ValidationRequest {
            supplements: vec![
                ProposedSupplement::new("Vitamina D", "40000 UI"),
                ProposedSupplement::new("Vitamina C", "500 mg"),
            ],
            context: PatientContext::new().with_medications(["Metformina"]),
        };
        let text = render_report(&build_report(&SafetyEngine::builtin(), &request));

        assert!(text.contains("Vitamina D (BLOQUEADO)"));
        assert!(text.contains("Vitamina C (OK)"));
        assert!(text.contains("[CRITICAL] UPPER_LIMIT"));
        assert!(text.contains("Depleción de nutrientes"));
        assert!(text.contains("Aviso (CRITICAL)"));
    }
}
