//! CLI argument definitions for suplesafe.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "suplesafe",
    version,
    about = "Clinical safety validation for dietary supplement recommendations",
    long_about = "Validate supplement recommendations against a patient context.\n\n\
                  Checks upper intake limits, contraindications, drug-nutrient depletions\n\
                  and missing patient facts, and produces a tiered disclaimer."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Engine configuration file (YAML).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Rule tables file (YAML or JSON) replacing the compiled-in tables.
    #[arg(long, value_name = "PATH", global = true)]
    pub rules: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (pretty for humans, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a recommendation list from a JSON request file.
    Validate(ValidateArgs),

    /// Validate a single supplement from command-line facts.
    Check(CheckArgs),

    /// Convert an amount between units.
    Convert(ConvertArgs),

    /// Inspect or validate rule tables.
    #[command(subcommand)]
    Rules(RulesCommand),
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Request file: {"supplements": [{"name", "dosage"}], "context": {...}}.
    #[arg(value_name = "REQUEST.json")]
    pub request: PathBuf,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: OutputFormatArg,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Supplement name as used in the rule tables.
    #[arg(long)]
    pub supplement: String,

    /// Dosage text, e.g. "500-1000 mg".
    #[arg(long)]
    pub dosage: String,

    /// Evaluate against the short-term limit.
    #[arg(long = "short-term")]
    pub short_term: bool,

    #[arg(long)]
    pub age: Option<u32>,

    #[arg(long, value_enum)]
    pub gender: Option<GenderArg>,

    /// Pregnancy status; unknown when omitted.
    #[arg(long, value_name = "BOOL")]
    pub pregnant: Option<bool>,

    /// Breastfeeding status; unknown when omitted.
    #[arg(long, value_name = "BOOL")]
    pub breastfeeding: Option<bool>,

    /// Known condition (repeatable).
    #[arg(long = "condition", value_name = "TEXT")]
    pub conditions: Vec<String>,

    /// Patient has no known conditions.
    #[arg(long = "no-conditions", conflicts_with = "conditions")]
    pub no_conditions: bool,

    /// Current medication (repeatable).
    #[arg(long = "medication", value_name = "TEXT")]
    pub medications: Vec<String>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormatArg,
}

#[derive(Args)]
pub struct ConvertArgs {
    #[arg(long)]
    pub amount: f64,

    /// Source unit, e.g. "UI".
    #[arg(long)]
    pub from: String,

    /// Target unit, e.g. "mcg RAE".
    #[arg(long)]
    pub to: String,

    /// Supplement name, required for IU conversions.
    #[arg(long)]
    pub supplement: Option<String>,
}

#[derive(Subcommand)]
pub enum RulesCommand {
    /// Load a rule tables file and report whether it is valid.
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the active rule tables.
    Dump {
        #[arg(long = "format", value_enum, default_value = "yaml")]
        format: DumpFormatArg,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DumpFormatArg {
    Yaml,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GenderArg {
    Hombre,
    Mujer,
}

/// CLI log format choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
