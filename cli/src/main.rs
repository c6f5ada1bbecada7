mod config;
mod output;
mod uuid_map;

use std::fs;
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use gts_core::{Effect, ParseCache, extract_ids, parse, parse_pattern, parse_query};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;
use crate::output::{
    CheckRow, ExampleRow, MatchRow, OutputFormat, ParsedView, Tabular, UuidRow, format_output,
};

/// Sample identifiers offered as one-click inputs by the GTS validator.
const EXAMPLES: [ExampleRow; 4] = [
    ExampleRow {
        label: "Simple Schema",
        value: "gts.x.core.events.type.v1~",
    },
    ExampleRow {
        label: "Instance",
        value: "gts.vendor.app.user.profile.v2.1",
    },
    ExampleRow {
        label: "Chained",
        value: "gts.x.core.events.type.v1~vendor.app._.custom.v1~",
    },
    ExampleRow {
        label: "Complex Chain",
        value: "gts.x.core.acm.user.v1~ven.app._.admin.v1.2",
    },
];

#[derive(Debug, Parser)]
#[command(name = "gts")]
#[command(about = "Validate, match and inspect Global Type System identifiers")]
#[command(version)]
struct Cli {
    /// YAML configuration file (output format, access policy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output format (default: table, or the configured format).
    #[arg(long, global = true)]
    format: Option<OutputFormat>,
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate identifiers and explain any failure.
    Validate(InputsArgs),
    /// Show the segments and fields of one identifier.
    Parse(ParseArgs),
    /// Test identifiers against a pattern with an optional trailing wildcard.
    Match(MatchArgs),
    /// Split a `[..]` predicate or `@..` attribute suffix off a pattern.
    Query(QueryArgs),
    /// Evaluate identifiers against the configured access policy.
    Check(InputsArgs),
    /// List the identifiers embedded in free text.
    Extract(ExtractArgs),
    /// Compute deterministic UUID v5 values for identifiers.
    Uuid(InputsArgs),
    /// Print sample identifiers.
    Examples,
}

#[derive(Debug, Args)]
struct InputsArgs {
    /// Identifiers to process (default: one per line from stdin).
    identifiers: Vec<String>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Identifier to parse.
    identifier: String,
}

#[derive(Debug, Args)]
struct MatchArgs {
    /// Pattern such as `gts.x.core.events.type.v1~*`.
    #[arg(long)]
    pattern: String,
    /// Candidate identifiers (default: one per line from stdin).
    candidates: Vec<String>,
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Query text, e.g. `gts.x.y.z.message.v1@id`.
    text: String,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// File to scan (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,
}

/// Settings shared by every subcommand after flags and config are merged.
struct Context {
    format: OutputFormat,
    config: CliConfig,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_context(cli.config.as_deref(), cli.format).and_then(|ctx| match cli.command {
        Command::Validate(args) => run_validate(args, &ctx),
        Command::Parse(args) => run_parse(args, &ctx),
        Command::Match(args) => run_match(args, &ctx),
        Command::Query(args) => run_query(args, &ctx),
        Command::Check(args) => run_check(args, &ctx),
        Command::Extract(args) => run_extract(args, &ctx),
        Command::Uuid(args) => run_uuid(args, &ctx),
        Command::Examples => emit(&EXAMPLES[..], ctx.format),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_context(path: Option<&Path>, format: Option<OutputFormat>) -> Result<Context, String> {
    let config = match path {
        Some(path) => {
            let config = CliConfig::load(path)
                .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?;
            debug!(
                path = %path.display(),
                rules = config.policy.len(),
                "loaded configuration"
            );
            config
        }
        None => CliConfig::default(),
    };
    let format = format.or(config.format).unwrap_or_default();
    Ok(Context { format, config })
}

fn run_validate(args: InputsArgs, ctx: &Context) -> Result<(), String> {
    let inputs = collect_inputs(args.identifiers)?;
    let cache = ParseCache::new();
    let reports: Vec<_> = inputs.iter().map(|raw| cache.validate(raw)).collect();
    emit(&reports[..], ctx.format)?;

    let invalid = reports.iter().filter(|report| !report.is_valid).count();
    if invalid > 0 {
        return Err(format!(
            "{invalid} of {} identifier(s) are invalid",
            reports.len()
        ));
    }
    Ok(())
}

fn run_parse(args: ParseArgs, ctx: &Context) -> Result<(), String> {
    let identifier = parse(&args.identifier)
        .map_err(|err| format!("Invalid identifier '{}': {err}", args.identifier))?;
    let view = ParsedView {
        canonical: identifier.to_string(),
        classification: identifier.classification(),
        chained: identifier.is_chained(),
        segments: identifier.segments().to_vec(),
    };
    emit(&view, ctx.format)
}

fn run_match(args: MatchArgs, ctx: &Context) -> Result<(), String> {
    let pattern = parse_pattern(&args.pattern)
        .map_err(|err| format!("Invalid pattern '{}': {err}", args.pattern))?;
    let inputs = collect_inputs(args.candidates)?;

    let rows: Vec<MatchRow> = inputs
        .iter()
        .map(|raw| match parse(raw) {
            Ok(candidate) => MatchRow {
                candidate: candidate.to_string(),
                matched: pattern.matches(&candidate),
                error: None,
            },
            Err(err) => MatchRow {
                candidate: raw.clone(),
                matched: false,
                error: Some(err.to_string()),
            },
        })
        .collect();
    emit(&rows[..], ctx.format)?;

    let invalid = rows.iter().filter(|row| row.error.is_some()).count();
    if invalid > 0 {
        return Err(format!("{invalid} candidate(s) are not valid identifiers"));
    }
    Ok(())
}

fn run_query(args: QueryArgs, ctx: &Context) -> Result<(), String> {
    let query =
        parse_query(&args.text).map_err(|err| format!("Invalid query '{}': {err}", args.text))?;
    emit(&query, ctx.format)
}

fn run_check(args: InputsArgs, ctx: &Context) -> Result<(), String> {
    let policy = ctx.config.access_policy().map_err(|err| err.to_string())?;
    if policy.is_empty() {
        warn!("no access policy rules configured; every identifier is denied");
    }
    let inputs = collect_inputs(args.identifiers)?;

    let rows: Vec<CheckRow> = inputs
        .iter()
        .map(|raw| match parse(raw) {
            Ok(identifier) => {
                let decision = policy.evaluate(&identifier);
                CheckRow {
                    identifier: identifier.to_string(),
                    effect: Some(decision.effect),
                    rule: decision.rule,
                    pattern: decision
                        .rule
                        .and_then(|index| ctx.config.policy.get(index))
                        .map(|rule| rule.pattern.clone()),
                    error: None,
                }
            }
            Err(err) => CheckRow {
                identifier: raw.clone(),
                effect: None,
                rule: None,
                pattern: None,
                error: Some(err.to_string()),
            },
        })
        .collect();
    emit(&rows[..], ctx.format)?;

    let rejected = rows
        .iter()
        .filter(|row| row.effect != Some(Effect::Allow))
        .count();
    if rejected > 0 {
        return Err(format!(
            "{rejected} of {} identifier(s) not allowed",
            rows.len()
        ));
    }
    Ok(())
}

fn run_extract(args: ExtractArgs, ctx: &Context) -> Result<(), String> {
    let text = match &args.input {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            text
        }
    };

    let found = extract_ids(&text);
    debug!(count = found.len(), "extracted identifiers");
    emit(&found[..], ctx.format)
}

fn run_uuid(args: InputsArgs, ctx: &Context) -> Result<(), String> {
    let inputs = collect_inputs(args.identifiers)?;
    let rows = inputs
        .iter()
        .map(|raw| {
            let identifier =
                parse(raw).map_err(|err| format!("Invalid identifier '{raw}': {err}"))?;
            Ok(UuidRow {
                uuid: uuid_map::identifier_uuid(&identifier).to_string(),
                identifier: identifier.to_string(),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    emit(&rows[..], ctx.format)
}

/// Positional values, or non-blank stdin lines when none were given.
fn collect_inputs(values: Vec<String>) -> Result<Vec<String>, String> {
    if !values.is_empty() {
        return Ok(values);
    }

    let mut inputs = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|err| format!("Failed to read stdin: {err}"))?;
        if !line.trim().is_empty() {
            inputs.push(line);
        }
    }
    if inputs.is_empty() {
        return Err("No identifiers given on the command line or stdin".to_string());
    }
    Ok(inputs)
}

fn emit<T>(value: &T, format: OutputFormat) -> Result<(), String>
where
    T: Serialize + Tabular + ?Sized,
{
    let out = format_output(value, format)?;
    if out.ends_with('\n') {
        print!("{out}");
    } else {
        println!("{out}");
    }
    Ok(())
}
