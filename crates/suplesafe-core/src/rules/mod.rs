//! Reference data consulted by the evaluators.
//!
//! Rule tables are plain data: compiled in by default, or loaded from a
//! YAML/JSON file that is validated against JSON Schema and then checked for
//! dangling references. Either way they are immutable once built.

mod builtin;
mod schema;
mod tables;

pub use builtin::{builtin_tables, BUILTIN_TABLES_VERSION};
pub use schema::validate_rule_tables_schema;
pub use tables::{
    same_supplement, AliasSet, ContraindicationRule, DepletionRule, NutrientConflictRule,
    PreferredForm, RuleTableError, RuleTables, Trigger, UpperLimitRule,
};
