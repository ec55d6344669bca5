//! JSON Schema check for rule tables.
//!
//! Override tables are checked against `schema/rule_tables.schema.json`
//! before deserialization, so shape errors point at the offending entry
//! instead of surfacing as a serde message.

use lazy_static::lazy_static;
use serde_json::Value;

lazy_static! {
    static ref RULE_TABLES_SCHEMA: Result<jsonschema::Validator, String> =
        compile(include_str!("../../schema/rule_tables.schema.json"));
}

fn compile(source: &str) -> Result<jsonschema::Validator, String> {
    let schema: Value = serde_json::from_str(source)
        .map_err(|e| format!("rule tables schema is not valid JSON: {}", e))?;
    jsonschema::validator_for(&schema)
        .map_err(|e| format!("rule tables schema does not compile: {}", e))
}

/// Check a rule tables document against the embedded schema.
///
/// Every violation is reported as `<pointer>: <message>`, with `/` for the
/// document root.
pub fn validate_rule_tables_schema(tables: &Value) -> Result<(), Vec<String>> {
    let validator = RULE_TABLES_SCHEMA.as_ref().map_err(|e| vec![e.clone()])?;

    let violations: Vec<String> = validator
        .iter_errors(tables)
        .map(|e| {
            let pointer = e.instance_path.to_string();
            let pointer = if pointer.is_empty() { "/" } else { pointer.as_str() };
            format!("{}: {}", pointer, e)
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "tables_version": "1",
            "medication_categories": {},
            "conditions": {},
            "upper_limits": {},
            "contraindications": {},
            "depletions": {},
            "preferred_forms": {}
        })
    }

    #[test]
    fn test_minimal_tables_pass() {
        assert!(validate_rule_tables_schema(&minimal()).is_ok());
    }

    #[test]
    fn test_embedded_schema_compiles() {
        assert!(RULE_TABLES_SCHEMA.is_ok());
    }

    #[test]
    fn test_additional_properties_fail_at_root() {
        let mut value = minimal();
        value["unknown_section"] = json!({});
        let violations = validate_rule_tables_schema(&value).unwrap_err();
        assert!(violations.iter().all(|v| v.starts_with("/: ")));
    }

    #[test]
    fn test_invalid_severity_fails() {
        let mut value = minimal();
        value["contraindications"] = json!({
            "Vitamina A": [{
                "trigger": { "type": "pregnancy" },
                "severity": "SEVERE",
                "message": "m",
                "recommendation": "r"
            }]
        });
        let errors = validate_rule_tables_schema(&value).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.starts_with("/contraindications/Vitamina A/0/severity: ")));
    }

    #[test]
    fn test_trigger_variants() {
        let mut value = minimal();
        value["contraindications"] = json!({
            "Melatonina": [
                { "trigger": { "type": "age_below", "years": 18 }, "severity": "MAJOR", "message": "m", "recommendation": "r" },
                { "trigger": { "type": "gender", "gender": "hombre" }, "severity": "MINOR", "message": "m", "recommendation": "r" },
                { "trigger": { "type": "breastfeeding" }, "severity": "MAJOR", "message": "m", "recommendation": "r" }
            ]
        });
        assert!(validate_rule_tables_schema(&value).is_ok());

        value["contraindications"]["Melatonina"][0]["trigger"] = json!({ "type": "age_below" });
        assert!(validate_rule_tables_schema(&value).is_err());
    }

    #[test]
    fn test_non_positive_limit_fails() {
        let mut value = minimal();
        value["upper_limits"] = json!({
            "Zinc": { "unit": "mg", "long_term": 0, "short_term": 40 }
        });
        assert!(validate_rule_tables_schema(&value).is_err());
    }
}
