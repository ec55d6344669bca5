//! Command implementations.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use suplesafe_core::{
    AnnotatedRecommendation, Disclaimer, DisclaimerGenerator, EngineConfig, Gender,
    IntakeDuration, PatientContext, ProposedSupplement, RecommendationListResult, RuleTables,
    SafetyEngine, SupplementRequest, Unit, ValidationResult,
};

use crate::cli::{
    CheckArgs, Cli, ConvertArgs, DumpFormatArg, GenderArg, OutputFormatArg, ValidateArgs,
};
use crate::output;

/// Exit code when at least one CRITICAL warning was raised.
pub const EXIT_CRITICAL: i32 = 2;

/// Input document for `suplesafe validate`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationRequest {
    pub supplements: Vec<ProposedSupplement>,
    #[serde(default)]
    pub context: PatientContext,
}

/// Output document for `suplesafe validate`.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub result: RecommendationListResult,
    pub disclaimer: Disclaimer,
    pub recommendations: Vec<AnnotatedRecommendation>,
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    validation: &'a ValidationResult,
    disclaimer: &'a Disclaimer,
}

/// Build the engine from `--config` and `--rules`.
///
/// `--rules` takes precedence over any `rules_file` in the config.
pub fn load_engine(cli: &Cli) -> Result<SafetyEngine> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(rules) = &cli.rules {
        config.rules_file = Some(rules.clone());
    }
    SafetyEngine::from_config(config).context("failed to build safety engine")
}

pub fn read_request(path: &Path) -> Result<ValidationRequest> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read request {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid request document {}", path.display()))
}

/// Validate a full recommendation list and attach the disclaimer.
pub fn build_report(engine: &SafetyEngine, request: &ValidationRequest) -> ValidationReport {
    let result = engine.validate_recommendation_list(&request.supplements, &request.context);
    let disclaimer = DisclaimerGenerator::new().generate_for_result(&result, &request.context);
    let recommendations = engine.annotate_recommendations(&request.supplements, &result);
    ValidationReport {
        result,
        disclaimer,
        recommendations,
    }
}

pub fn run_validate(cli: &Cli, args: &ValidateArgs) -> Result<i32> {
    let span = info_span!("validate", request = %args.request.display());
    let _guard = span.enter();

    let engine = load_engine(cli)?;
    let request = read_request(&args.request)?;
    info!(supplements = request.supplements.len(), "Request loaded");

    let report = build_report(&engine, &request);
    match args.format {
        OutputFormatArg::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormatArg::Text => print!("{}", output::render_report(&report)),
    }

    Ok(if report.result.is_valid() { 0 } else { EXIT_CRITICAL })
}

/// Patient context from `check` flags.
pub fn context_from_args(args: &CheckArgs) -> PatientContext {
    let conditions = if args.no_conditions {
        Some(Vec::new())
    } else if args.conditions.is_empty() {
        None
    } else {
        Some(args.conditions.clone())
    };

    PatientContext {
        age: args.age,
        gender: args.gender.map(|g| match g {
            GenderArg::Hombre => Gender::Hombre,
            GenderArg::Mujer => Gender::Mujer,
        }),
        is_pregnant: args.pregnant,
        is_breastfeeding: args.breastfeeding,
        conditions,
        medications: Some(args.medications.clone()),
    }
}

/// Single-supplement request from `check` flags.
///
/// Without `--short-term` the duration is left unset so the engine's
/// configured default applies.
pub fn check_request(args: &CheckArgs) -> SupplementRequest {
    let request = SupplementRequest::new(&args.supplement, &args.dosage)
        .with_context(context_from_args(args));
    if args.short_term {
        request.with_duration(IntakeDuration::ShortTerm)
    } else {
        request
    }
}

pub fn run_check(cli: &Cli, args: &CheckArgs) -> Result<i32> {
    let span = info_span!("check", supplement = %args.supplement);
    let _guard = span.enter();

    let engine = load_engine(cli)?;
    let request = check_request(args);
    let context = &request.context;

    let validation = engine.validate_supplement(&request);
    let disclaimer = DisclaimerGenerator::new().generate(&validation.warnings, context);
    debug!(warnings = validation.warnings.len(), "Supplement checked");

    match args.format {
        OutputFormatArg::Json => {
            let report = CheckReport {
                validation: &validation,
                disclaimer: &disclaimer,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormatArg::Text => {
            print!(
                "{}{}",
                output::render_validation(&validation),
                output::render_disclaimer(&disclaimer)
            );
        }
    }

    Ok(if validation.is_valid { 0 } else { EXIT_CRITICAL })
}

pub fn run_convert(args: &ConvertArgs) -> Result<i32> {
    let from: Unit = args
        .from
        .parse()
        .with_context(|| format!("unknown source unit '{}'", args.from))?;
    let to: Unit = args
        .to
        .parse()
        .with_context(|| format!("unknown target unit '{}'", args.to))?;

    let outcome = suplesafe_core::normalize_dosage_to_standard_unit(
        args.amount,
        from,
        to,
        args.supplement.as_deref(),
    );

    if !outcome.success {
        eprintln!("error: cannot convert {} to {}", from, to);
        return Ok(1);
    }
    match &outcome.conversion_applied {
        Some(trace) => println!("{}", trace),
        None => println!("{} {}", outcome.normalized_amount, to),
    }
    Ok(0)
}

pub fn run_rules_validate(file: &Path) -> Result<i32> {
    let tables = RuleTables::from_file(file)
        .with_context(|| format!("invalid rule tables {}", file.display()))?;
    println!(
        "{}: OK (version {}, {} upper limits, {} contraindicated supplements, {} medication categories)",
        file.display(),
        tables.tables_version,
        tables.upper_limits.len(),
        tables.contraindications.len(),
        tables.medication_categories.len()
    );
    Ok(0)
}

pub fn run_rules_dump(cli: &Cli, format: DumpFormatArg) -> Result<i32> {
    let engine = load_engine(cli)?;
    let text = match format {
        DumpFormatArg::Yaml => engine.tables().to_yaml()?,
        DumpFormatArg::Json => engine.tables().to_json()?,
    };
    println!("{}", text);
    Ok(0)
}
