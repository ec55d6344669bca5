//! Rule table types and loading from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_rule_tables_schema;
use crate::matching::normalize_term;
use crate::types::{Gender, IntakeDuration, Severity};
use crate::units::Unit;

/// Shortest alias accepted for substring matching.
const MIN_ALIAS_LEN: usize = 3;

/// Errors that can occur when loading rule tables.
#[derive(Error, Debug)]
pub enum RuleTableError {
    #[error("Failed to read rule tables file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rule tables do not match schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("Rule tables validation failed: {0}")]
    Validation(String),
}

/// A named set of aliases for free-text matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AliasSet {
    /// Display name
    pub label: String,

    /// Terms that identify the set inside patient text
    pub aliases: Vec<String>,
}

/// Upper intake limit for one supplement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpperLimitRule {
    /// Canonical unit the limits are expressed in
    pub unit: Unit,

    /// Ceiling for ongoing daily use
    pub long_term: f64,

    /// Temporary ceiling, at least `long_term`
    pub short_term: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl UpperLimitRule {
    pub fn limit_for(&self, duration: IntakeDuration) -> f64 {
        match duration {
            IntakeDuration::ShortTerm => self.short_term,
            IntakeDuration::LongTerm => self.long_term,
        }
    }
}

/// What activates a contraindication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Patient takes a medication in this category
    Medication { category: String },

    /// Patient reports this condition
    Condition { condition: String },

    Pregnancy,

    Breastfeeding,

    /// Patient is younger than `years`
    AgeBelow { years: u32 },

    Gender { gender: Gender },
}

impl Trigger {
    pub fn is_medication(&self) -> bool {
        matches!(self, Trigger::Medication { .. })
    }
}

/// One contraindication attached to a supplement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContraindicationRule {
    pub trigger: Trigger,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
}

/// A nutrient depleted by a medication category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DepletionRule {
    /// Depleted nutrient
    pub nutrient: String,

    /// Supplement name that replaces it
    pub supplement: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
}

/// Preferred chemical form of a supplement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreferredForm {
    pub form: String,
    pub reason: String,
}

/// Two supplements that interfere when taken together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutrientConflictRule {
    pub supplements: [String; 2],
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
}

/// The complete reference data consulted by every evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleTables {
    /// Version of this data set
    pub tables_version: String,

    /// Medication categories keyed by id
    pub medication_categories: BTreeMap<String, AliasSet>,

    /// Medical conditions keyed by id
    pub conditions: BTreeMap<String, AliasSet>,

    /// Upper limits keyed by supplement name
    pub upper_limits: BTreeMap<String, UpperLimitRule>,

    /// Contraindications keyed by supplement name
    pub contraindications: BTreeMap<String, Vec<ContraindicationRule>>,

    /// Depleted nutrients keyed by medication category id
    pub depletions: BTreeMap<String, Vec<DepletionRule>>,

    /// Preferred forms keyed by supplement name
    pub preferred_forms: BTreeMap<String, PreferredForm>,

    #[serde(default)]
    pub nutrient_conflicts: Vec<NutrientConflictRule>,
}

/// Look up by exact key, then by normalized key.
fn lookup<'a, V>(map: &'a BTreeMap<String, V>, name: &str) -> Option<&'a V> {
    map.get(name).or_else(|| {
        let wanted = normalize_term(name);
        map.iter()
            .find(|(key, _)| normalize_term(key) == wanted)
            .map(|(_, value)| value)
    })
}

/// Do two supplement names refer to the same supplement?
pub fn same_supplement(a: &str, b: &str) -> bool {
    a == b || normalize_term(a) == normalize_term(b)
}

impl RuleTables {
    /// Parse rule tables from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RuleTableError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse rule tables from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RuleTableError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse rule tables from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RuleTableError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse rule tables from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RuleTableError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load from a file, picking the format by extension (`.json`, else YAML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuleTableError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, RuleTableError> {
        validate_rule_tables_schema(&value).map_err(RuleTableError::Schema)?;
        let tables: RuleTables = serde_json::from_value(value)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Serialize the tables as YAML.
    pub fn to_yaml(&self) -> Result<String, RuleTableError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Serialize the tables as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, RuleTableError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check cross-references and numeric invariants.
    pub fn validate(&self) -> Result<(), RuleTableError> {
        self.validate_alias_sets()?;
        self.validate_upper_limits()?;
        self.validate_references()?;
        self.validate_conflicts()?;
        Ok(())
    }

    fn validate_alias_sets(&self) -> Result<(), RuleTableError> {
        let sets = self
            .medication_categories
            .iter()
            .chain(self.conditions.iter());

        for (key, set) in sets {
            if set.aliases.is_empty() {
                return Err(RuleTableError::Validation(format!(
                    "Alias set '{}' has no aliases",
                    key
                )));
            }
            if let Some(alias) = set
                .aliases
                .iter()
                .find(|a| normalize_term(a).chars().count() < MIN_ALIAS_LEN)
            {
                return Err(RuleTableError::Validation(format!(
                    "Alias '{}' in '{}' is shorter than {} characters",
                    alias, key, MIN_ALIAS_LEN
                )));
            }
        }

        Ok(())
    }

    fn validate_upper_limits(&self) -> Result<(), RuleTableError> {
        for (name, rule) in &self.upper_limits {
            if !(rule.long_term.is_finite() && rule.long_term > 0.0) {
                return Err(RuleTableError::Validation(format!(
                    "Upper limit for '{}' must be positive",
                    name
                )));
            }
            if !(rule.short_term.is_finite() && rule.short_term >= rule.long_term) {
                return Err(RuleTableError::Validation(format!(
                    "Short-term limit for '{}' is below its long-term limit",
                    name
                )));
            }
        }

        Ok(())
    }

    fn validate_references(&self) -> Result<(), RuleTableError> {
        for (supplement, rules) in &self.contraindications {
            for rule in rules {
                match &rule.trigger {
                    Trigger::Medication { category }
                        if !self.medication_categories.contains_key(category) =>
                    {
                        return Err(RuleTableError::Validation(format!(
                            "Contraindication for '{}' references unknown medication category '{}'",
                            supplement, category
                        )));
                    }
                    Trigger::Condition { condition } if !self.conditions.contains_key(condition) => {
                        return Err(RuleTableError::Validation(format!(
                            "Contraindication for '{}' references unknown condition '{}'",
                            supplement, condition
                        )));
                    }
                    _ => {}
                }
            }
        }

        if let Some(category) = self
            .depletions
            .keys()
            .find(|c| !self.medication_categories.contains_key(*c))
        {
            return Err(RuleTableError::Validation(format!(
                "Depletion rules reference unknown medication category '{}'",
                category
            )));
        }

        Ok(())
    }

    fn validate_conflicts(&self) -> Result<(), RuleTableError> {
        let mut seen = HashSet::new();

        for conflict in &self.nutrient_conflicts {
            let [a, b] = &conflict.supplements;
            if same_supplement(a, b) {
                return Err(RuleTableError::Validation(format!(
                    "Nutrient conflict pairs '{}' with itself",
                    a
                )));
            }
            let mut key = [normalize_term(a), normalize_term(b)];
            key.sort();
            if !seen.insert(key) {
                return Err(RuleTableError::Validation(format!(
                    "Duplicate nutrient conflict between '{}' and '{}'",
                    a, b
                )));
            }
        }

        Ok(())
    }

    /// Upper limit for a supplement, if one is known.
    pub fn upper_limit(&self, supplement: &str) -> Option<&UpperLimitRule> {
        lookup(&self.upper_limits, supplement)
    }

    /// Contraindications for a supplement; empty when none are known.
    pub fn contraindications_for(&self, supplement: &str) -> &[ContraindicationRule] {
        lookup(&self.contraindications, supplement).map_or(&[], Vec::as_slice)
    }

    pub fn preferred_form(&self, supplement: &str) -> Option<&PreferredForm> {
        lookup(&self.preferred_forms, supplement)
    }

    pub fn medication_category(&self, id: &str) -> Option<&AliasSet> {
        self.medication_categories.get(id)
    }

    pub fn condition(&self, id: &str) -> Option<&AliasSet> {
        self.conditions.get(id)
    }

    /// Does any table have an entry for this supplement?
    pub fn is_known_supplement(&self, supplement: &str) -> bool {
        self.upper_limit(supplement).is_some()
            || lookup(&self.contraindications, supplement).is_some()
            || self.preferred_form(supplement).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TABLES: &str = r#"
tables_version: "2026.1"
medication_categories:
  anticoagulantes:
    label: "Anticoagulantes"
    aliases: ["warfarina", "acenocumarol", "sintrom"]
  metformina:
    label: "Metformina"
    aliases: ["metformina"]
conditions:
  enfermedad_renal:
    label: "Enfermedad renal"
    aliases: ["renal", "rinon"]
upper_limits:
  "Vitamina D":
    unit: "UI"
    long_term: 4000
    short_term: 10000
contraindications:
  "Vitamina K":
    - trigger: { type: medication, category: anticoagulantes }
      severity: MAJOR
      message: "Interfiere con anticoagulantes"
      recommendation: "Consulte a su médico"
    - trigger: { type: pregnancy }
      severity: MODERATE
      message: "Precaución en embarazo"
      recommendation: "Consulte a su médico"
depletions:
  metformina:
    - nutrient: "Vitamina B12"
      supplement: "Vitamina B12"
preferred_forms:
  "Hierro":
    form: "bisglicinato"
    reason: "Mejor tolerancia"
"#;

    #[test]
    fn test_parse_valid_tables() {
        let tables = RuleTables::from_yaml(MINIMAL_TABLES).unwrap();
        assert_eq!(tables.tables_version, "2026.1");
        let limit = tables.upper_limit("Vitamina D").unwrap();
        assert_eq!(limit.unit, Unit::INTERNATIONAL_UNIT);
        assert_eq!(limit.limit_for(IntakeDuration::ShortTerm), 10000.0);
        assert_eq!(tables.contraindications_for("Vitamina K").len(), 2);
        assert_eq!(
            tables.contraindications_for("Vitamina K")[1].trigger,
            Trigger::Pregnancy
        );
        assert!(tables.nutrient_conflicts.is_empty());
    }

    #[test]
    fn test_lookup_tolerates_case_and_accents() {
        let tables = RuleTables::from_yaml(MINIMAL_TABLES).unwrap();
        assert!(tables.upper_limit("vitamina d").is_some());
        assert!(tables.preferred_form("HIERRO").is_some());
        assert!(tables.upper_limit("Vitamina Z").is_none());
        assert!(tables.contraindications_for("Vitamina Z").is_empty());
    }

    #[test]
    fn test_short_term_below_long_term_fails() {
        let yaml = MINIMAL_TABLES.replace("short_term: 10000", "short_term: 1000");
        let result = RuleTables::from_yaml(&yaml);
        assert!(matches!(result, Err(RuleTableError::Validation(_))));
    }

    #[test]
    fn test_unknown_category_reference_fails() {
        let yaml = MINIMAL_TABLES.replace(
            "category: anticoagulantes",
            "category: antiagregantes",
        );
        let result = RuleTables::from_yaml(&yaml);
        assert!(matches!(result, Err(RuleTableError::Validation(msg)) if msg.contains("antiagregantes")));
    }

    #[test]
    fn test_short_alias_fails() {
        let yaml = MINIMAL_TABLES.replace("\"rinon\"", "\"ri\"");
        let result = RuleTables::from_yaml(&yaml);
        assert!(matches!(result, Err(RuleTableError::Validation(_))));
    }

    #[test]
    fn test_unknown_unit_fails() {
        let yaml = MINIMAL_TABLES.replace("unit: \"UI\"", "unit: \"tazas\"");
        assert!(RuleTables::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_missing_section_fails_schema() {
        let result = RuleTables::from_json(r#"{"tables_version": "1"}"#);
        assert!(matches!(result, Err(RuleTableError::Schema(errors)) if !errors.is_empty()));
    }

    #[test]
    fn test_self_conflict_fails() {
        let yaml = format!(
            "{}nutrient_conflicts:\n  - supplements: [\"Calcio\", \"calcio\"]\n    severity: MINOR\n    message: \"x\"\n    recommendation: \"y\"\n",
            MINIMAL_TABLES
        );
        let result = RuleTables::from_yaml(&yaml);
        assert!(matches!(result, Err(RuleTableError::Validation(_))));
    }

    #[test]
    fn test_yaml_round_trip() {
        let tables = RuleTables::from_yaml(MINIMAL_TABLES).unwrap();
        let dumped = tables.to_yaml().unwrap();
        let reloaded = RuleTables::from_yaml(&dumped).unwrap();
        assert_eq!(tables, reloaded);
    }
}
