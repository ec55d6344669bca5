//! Dosage parsing and unit normalization.
//!
//! Free-text dosages ("500-1000 mg", "10.000 UI", "2,5 mcg RAE") are parsed
//! into an amount and a [`Unit`], and amounts are converted between units so
//! limits are compared like for like.
//!
//! ## Conversion rules
//!
//! | From → To | Rule |
//! |-----------|------|
//! | same unit | no-op, no annotation |
//! | g / mg / mcg | powers of 1000 |
//! | plain mass ↔ qualified mass (`mcg RAE`, `mg suplementario`, ...) | linear metric scaling |
//! | UI ↔ mass | supplement-specific factor (vitamins A, D, E only) |
//! | anything else | **fails**: `success = false`, amount unchanged |
//!
//! A failed conversion is never a pass. Callers must treat it as
//! "unverifiable", not "within limits".

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::matching::normalize_term;

lazy_static! {
    /// Amount (optionally a range) immediately followed by a unit.
    static ref DOSE_PATTERN: Regex = Regex::new(
        r"(?i)(\d+(?:[.,]\d+|[ \x{00A0}\x{202F}]\d{3})*)(?:\s*(?:-|–|—|a|to|hasta)\s*(\d+(?:[.,]\d+|[ \x{00A0}\x{202F}]\d{3})*))?\s*((?:mcg|µg|μg|ug)\s*rae|mg\s+(?:de\s+)?hierro\s+elemental|mg\s+suplementarios?|mg\s+combinados?|microgramos?|miligramos?|mililitros?|gramos?|mcg|µg|μg|ug|mg|ml|ui|iu|ufc|cfu|gr|g)(?:[^\p{L}]|$)"
    ).unwrap();

    static ref NUMBER_PATTERN: Regex =
        Regex::new(r"\d+(?:[.,]\d+|[ \x{00A0}\x{202F}]\d{3}\b)*").unwrap();
}

/// Unit without qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseUnit {
    Gram,
    Milligram,
    Microgram,
    InternationalUnit,
    Milliliter,
    ColonyFormingUnit,
}

impl BaseUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            BaseUnit::Gram => "g",
            BaseUnit::Milligram => "mg",
            BaseUnit::Microgram => "mcg",
            BaseUnit::InternationalUnit => "UI",
            BaseUnit::Milliliter => "ml",
            BaseUnit::ColonyFormingUnit => "UFC",
        }
    }

    /// Power of ten relative to one gram, for mass units.
    fn gram_exponent(&self) -> Option<i32> {
        match self {
            BaseUnit::Gram => Some(0),
            BaseUnit::Milligram => Some(-3),
            BaseUnit::Microgram => Some(-6),
            _ => None,
        }
    }
}

/// What a qualified mass unit counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// Retinol Activity Equivalents (vitamin A)
    RetinolActivityEquivalent,
    ElementalIron,
    Supplemental,
    /// Sum of several actives (EPA + DHA)
    Combined,
}

impl Qualifier {
    pub fn label(&self) -> &'static str {
        match self {
            Qualifier::RetinolActivityEquivalent => "RAE",
            Qualifier::ElementalIron => "hierro elemental",
            Qualifier::Supplemental => "suplementario",
            Qualifier::Combined => "combinados",
        }
    }
}

/// A dosage unit. Compound units like `mcg RAE` are atomic: they compare
/// unequal to their base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Unit {
    base: BaseUnit,
    qualifier: Option<Qualifier>,
}

impl Unit {
    pub const GRAM: Unit = Unit::plain(BaseUnit::Gram);
    pub const MILLIGRAM: Unit = Unit::plain(BaseUnit::Milligram);
    pub const MICROGRAM: Unit = Unit::plain(BaseUnit::Microgram);
    pub const INTERNATIONAL_UNIT: Unit = Unit::plain(BaseUnit::InternationalUnit);
    pub const MILLILITER: Unit = Unit::plain(BaseUnit::Milliliter);
    pub const COLONY_FORMING_UNIT: Unit = Unit::plain(BaseUnit::ColonyFormingUnit);
    pub const MCG_RAE: Unit = Unit::qualified(BaseUnit::Microgram, Qualifier::RetinolActivityEquivalent);
    pub const MG_ELEMENTAL_IRON: Unit = Unit::qualified(BaseUnit::Milligram, Qualifier::ElementalIron);
    pub const MG_SUPPLEMENTAL: Unit = Unit::qualified(BaseUnit::Milligram, Qualifier::Supplemental);
    pub const MG_COMBINED: Unit = Unit::qualified(BaseUnit::Milligram, Qualifier::Combined);

    pub const fn plain(base: BaseUnit) -> Self {
        Self { base, qualifier: None }
    }

    pub const fn qualified(base: BaseUnit, qualifier: Qualifier) -> Self {
        Self {
            base,
            qualifier: Some(qualifier),
        }
    }

    pub fn base(&self) -> BaseUnit {
        self.base
    }

    pub fn qualifier(&self) -> Option<Qualifier> {
        self.qualifier
    }

    fn is_international_unit(&self) -> bool {
        self.base == BaseUnit::InternationalUnit && self.qualifier.is_none()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier {
            Some(q) => write!(f, "{} {}", self.base.symbol(), q.label()),
            None => write!(f, "{}", self.base.symbol()),
        }
    }
}

/// Error for unit strings outside the supported vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized unit: '{0}'")]
pub struct UnitParseError(pub String);

impl FromStr for Unit {
    type Err = UnitParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let folded = normalize_term(&raw.replace(['µ', 'μ'], "mc")).replace(" de ", " ");
        let unit = match folded.as_str() {
            "mcg rae" | "mcgrae" | "ug rae" | "ugrae" => Unit::MCG_RAE,
            "mg hierro elemental" => Unit::MG_ELEMENTAL_IRON,
            "mg suplementario" | "mg suplementarios" => Unit::MG_SUPPLEMENTAL,
            "mg combinado" | "mg combinados" => Unit::MG_COMBINED,
            "mcg" | "ug" | "microgramo" | "microgramos" => Unit::MICROGRAM,
            "mg" | "miligramo" | "miligramos" => Unit::MILLIGRAM,
            "g" | "gr" | "gramo" | "gramos" => Unit::GRAM,
            "ml" | "mililitro" | "mililitros" => Unit::MILLILITER,
            "ui" | "iu" => Unit::INTERNATIONAL_UNIT,
            "ufc" | "cfu" => Unit::COLONY_FORMING_UNIT,
            _ => return Err(UnitParseError(raw.to_string())),
        };
        Ok(unit)
    }
}

impl TryFrom<String> for Unit {
    type Error = UnitParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.to_string()
    }
}

/// Spaces allowed between thousands groups ("15 000", "15\u{a0}000").
fn is_group_space(c: char) -> bool {
    matches!(c, ' ' | '\u{00A0}' | '\u{202F}')
}

/// Parse a number written with either decimal convention.
///
/// Groups of exactly three digits after a dot or comma ("10.000",
/// "1,000") are read as thousands separators, the larger reading.
/// Space-separated groups are always thousands.
fn parse_number(raw: &str) -> Option<f64> {
    let raw: String = raw.chars().filter(|c| !is_group_space(*c)).collect();
    let raw = raw.as_str();
    let has_dot = raw.contains('.');
    let has_comma = raw.contains(',');

    let normalized = if has_dot && has_comma {
        let split = raw.rfind(['.', ','])?;
        let (integer, fraction) = raw.split_at(split);
        format!("{}.{}", integer.replace(['.', ','], ""), &fraction[1..])
    } else if has_dot || has_comma {
        let sep = if has_dot { '.' } else { ',' };
        if is_thousands_grouped(raw, sep) {
            raw.replace(sep, "")
        } else if raw.matches(sep).count() == 1 {
            raw.replace(sep, ".")
        } else {
            return None;
        }
    } else {
        raw.to_string()
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_thousands_grouped(raw: &str, sep: char) -> bool {
    let mut groups = raw.split(sep);
    let Some(first) = groups.next() else {
        return false;
    };
    if first.is_empty() || first.len() > 3 || first.starts_with('0') {
        return false;
    }
    let rest: Vec<&str> = groups.collect();
    !rest.is_empty() && rest.iter().all(|g| g.len() == 3)
}

/// An amount-unit pair found in dosage text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedDosage {
    /// Maximum of any range
    pub amount: f64,
    pub unit: Unit,
}

/// Does a standalone number end just before `start`?
///
/// Catches the tail of a digit group the dose pattern could not absorb
/// ("15 0000 UI" must not read as 0 UI). Digits glued to letters, as in
/// "B12 1000 mcg", are part of a name and do not count.
fn follows_detached_number(text: &str, start: usize) -> bool {
    let mut before = text[..start].chars().rev().peekable();
    match before.peek() {
        Some(c) if c.is_ascii_digit() => return true,
        Some(&c) if is_group_space(c) || c.is_whitespace() || matches!(c, '.' | ',') => {
            before.next();
        }
        _ => return false,
    }
    if !before.peek().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    while before.peek().is_some_and(|c| c.is_ascii_digit()) {
        before.next();
    }
    !before.next().is_some_and(char::is_alphabetic)
}

/// All amount-unit pairs in the text, in order of appearance.
///
/// Digits glued to a letter ("B12") are skipped and the scan resumes after
/// them, so "B12 500 mcg" reads as 500 mcg rather than 12 500 mcg.
fn dose_matches(text: &str) -> Vec<ParsedDosage> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(caps) = DOSE_PATTERN.captures_at(text, pos) {
        let (Some(whole), Some(low)) = (caps.get(0), caps.get(1)) else {
            break;
        };

        if text[..low.start()].chars().next_back().is_some_and(char::is_alphabetic) {
            let digits = text[low.start()..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            pos = low.start() + digits;
            continue;
        }
        pos = whole.end();

        if follows_detached_number(text, low.start()) {
            continue;
        }
        let Some(Ok(unit)) = caps.get(3).map(|m| m.as_str().parse::<Unit>()) else {
            continue;
        };
        let Some(low) = parse_number(low.as_str()) else {
            continue;
        };
        let high = caps.get(2).and_then(|m| parse_number(m.as_str()));
        found.push(ParsedDosage {
            amount: high.map_or(low, |h| h.max(low)),
            unit,
        });
    }

    found
}

/// Parse dosage text into its worst-case amount and unit.
///
/// The unit is the first one mentioned; the amount is the maximum over
/// every figure expressed in that unit, so ranges resolve to their upper
/// bound. Returns `None` when no amount-unit pair is present.
pub fn parse_dosage(text: &str) -> Option<ParsedDosage> {
    let matches = dose_matches(text);
    let unit = matches.first()?.unit;
    let amount = matches
        .iter()
        .filter(|m| m.unit == unit)
        .map(|m| m.amount)
        .fold(f64::NEG_INFINITY, f64::max);
    Some(ParsedDosage { amount, unit })
}

/// Unit of the dosage text, if one is recognized.
pub fn extract_unit(text: &str) -> Option<Unit> {
    dose_matches(text).first().map(|m| m.unit)
}

/// Maximum amount in the dosage text.
///
/// Uses the figures attached to the dosage unit when there is one, and
/// falls back to the largest number anywhere in the text otherwise.
pub fn extract_max_dosage(text: &str) -> Option<f64> {
    if let Some(parsed) = parse_dosage(text) {
        return Some(parsed.amount);
    }
    NUMBER_PATTERN
        .find_iter(text)
        .filter_map(|m| parse_number(m.as_str()))
        .reduce(f64::max)
}

/// Fixed IU equivalence for one vitamin.
struct IuEquivalence {
    aliases: &'static [&'static str],
    reference: Unit,
    iu_per_reference: f64,
}

const IU_EQUIVALENCES: &[IuEquivalence] = &[
    IuEquivalence {
        aliases: &["vitamina a", "retinol"],
        reference: Unit::MCG_RAE,
        iu_per_reference: 3.33,
    },
    IuEquivalence {
        aliases: &["vitamina e", "tocoferol", "d alfa tocoferol"],
        reference: Unit::MILLIGRAM,
        iu_per_reference: 1.49,
    },
    IuEquivalence {
        aliases: &["vitamina d", "vitamina d3", "colecalciferol"],
        reference: Unit::MICROGRAM,
        iu_per_reference: 40.0,
    },
];

fn iu_equivalence(supplement_name: &str) -> Option<&'static IuEquivalence> {
    let name = normalize_term(supplement_name);
    IU_EQUIVALENCES.iter().find(|eq| {
        eq.aliases.iter().any(|alias| {
            name == *alias
                || name.starts_with(&format!("{alias} "))
                || name.starts_with(&format!("{alias}("))
        })
    })
}

/// Linear factor between two mass units, if they are comparable.
fn metric_factor(from: Unit, to: Unit) -> Option<f64> {
    let from_exp = from.base.gram_exponent()?;
    let to_exp = to.base.gram_exponent()?;
    match (from.qualifier, to.qualifier) {
        (a, b) if a == b => {}
        (None, Some(_)) | (Some(_), None) => {}
        _ => return None,
    }
    Some(10f64.powi(from_exp - to_exp))
}

/// Result of a unit conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcome {
    /// False when the units are not convertible
    pub success: bool,

    /// Converted amount; the original amount when `success` is false
    pub normalized_amount: f64,

    /// Human-readable trace of the arithmetic, absent for no-ops
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_applied: Option<String>,
}

impl ConversionOutcome {
    fn unchanged(amount: f64) -> Self {
        Self {
            success: true,
            normalized_amount: amount,
            conversion_applied: None,
        }
    }

    fn failed(amount: f64) -> Self {
        Self {
            success: false,
            normalized_amount: amount,
            conversion_applied: None,
        }
    }
}

/// Convert `amount` from one unit to another.
///
/// `supplement_name` selects the IU factor for vitamins A, D and E; without
/// it, IU never converts.
pub fn normalize_dosage_to_standard_unit(
    amount: f64,
    from: Unit,
    to: Unit,
    supplement_name: Option<&str>,
) -> ConversionOutcome {
    if from == to {
        return ConversionOutcome::unchanged(amount);
    }

    if let Some(factor) = metric_factor(from, to) {
        let converted = amount * factor;
        return ConversionOutcome {
            success: true,
            normalized_amount: converted,
            conversion_applied: Some(format!(
                "{} {} → {} {}",
                format_amount(amount),
                from,
                format_amount(converted),
                to
            )),
        };
    }

    let equivalence = supplement_name.and_then(iu_equivalence);
    if let Some(eq) = equivalence {
        let converted = if from.is_international_unit() {
            metric_factor(eq.reference, to).map(|f| amount / eq.iu_per_reference * f)
        } else if to.is_international_unit() {
            metric_factor(from, eq.reference).map(|f| amount * f * eq.iu_per_reference)
        } else {
            None
        };

        if let Some(converted) = converted {
            return ConversionOutcome {
                success: true,
                normalized_amount: converted,
                conversion_applied: Some(format!(
                    "{} {} → {} {} (factor {} UI por {})",
                    format_amount(amount),
                    from,
                    format_amount(converted),
                    to,
                    format_amount(eq.iu_per_reference),
                    eq.reference
                )),
            };
        }
    }

    tracing::warn!(
        from = %from,
        to = %to,
        supplement = supplement_name.unwrap_or("-"),
        "Unsupported unit conversion"
    );
    ConversionOutcome::failed(amount)
}

/// Format an amount for messages: integers without decimals, otherwise up
/// to two decimals with trailing zeros removed.
pub(crate) fn format_amount(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
