//! schema-compat CLI
//!
//! Command-line interface for checking JSON Schemas against provider rules.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use schema_compat::{
    check, check_path, ensure_compiles, load_schema_auto, BatchReport, CheckOptions, CheckReport,
    ConstraintRegistry, ConstraintRule, FileStatus, ModelId, RegistryConfig,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-compat")]
#[command(about = "Check JSON Schemas against AI provider structured output rules")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a schema (file, URL or directory of .json files) for a model
    Check {
        /// Schema source: file path, directory, or URL (http:// or https://)
        schema: String,

        /// Target model as provider/model (e.g., openai/gpt-4o)
        #[arg(long, short)]
        model: String,

        /// Extra rule-set config files, applied in order after the built-ins
        #[arg(long)]
        rules: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Reject documents that don't compile as JSON Schema
        #[arg(long)]
        compile_check: bool,

        /// Only print issues and errors
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show which rule set a model resolves to
    Resolve {
        /// Target model as provider/model
        #[arg(long, short)]
        model: String,

        /// Extra rule-set config files
        #[arg(long)]
        rules: Vec<PathBuf>,
    },

    /// List registered model patterns in registration order
    Providers {
        /// Extra rule-set config files
        #[arg(long)]
        rules: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            schema,
            model,
            rules,
            format,
            compile_check,
            quiet,
        } => run_check(&schema, &model, &rules, format, compile_check, quiet),
        Commands::Resolve { model, rules } => run_resolve(&model, &rules),
        Commands::Providers { rules, format } => run_providers(&rules, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn build_registry(rule_files: &[PathBuf]) -> Result<ConstraintRegistry, u8> {
    let mut registry = ConstraintRegistry::with_builtins();
    for path in rule_files {
        RegistryConfig::load(path)
            .and_then(|config| config.apply(&mut registry))
            .map_err(|e| {
                eprintln!("Error: {}: {}", path.display(), e);
                e.exit_code() as u8
            })?;
    }
    Ok(registry)
}

fn parse_model(model: &str) -> Result<ModelId, u8> {
    ModelId::parse(model).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_check(
    source: &str,
    model: &str,
    rule_files: &[PathBuf],
    format: Format,
    compile_check: bool,
    quiet: bool,
) -> Result<(), u8> {
    let model = parse_model(model)?;
    let registry = build_registry(rule_files)?;

    if Path::new(source).is_dir() {
        let report = check_path(
            Path::new(source),
            &model,
            &registry,
            CheckOptions { compile_check },
        );
        print_batch(&report, format, quiet);
        return match report.exit_code() {
            0 => Ok(()),
            code => Err(code as u8),
        };
    }

    let schema = load_schema_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    if compile_check {
        ensure_compiles(&schema).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
    }

    let report = check(&schema, &model, &registry);
    print_report(&report, format, quiet);

    if report.compatible {
        Ok(())
    } else {
        Err(1)
    }
}

fn print_report(report: &CheckReport, format: Format, quiet: bool) {
    if format == Format::Json {
        println!("{}", to_json(report));
        return;
    }

    let target = format!("{}/{}", report.provider, report.model_id);
    if report.compatible {
        if !quiet {
            println!("\x1b[32m✓ compatible with {}\x1b[0m", target);
        }
        return;
    }

    if !quiet {
        println!(
            "\x1b[31m✗ {} issue(s) for {}\x1b[0m",
            report.issues.len(),
            target
        );
    }
    for issue in &report.issues {
        println!("  {}", issue);
    }
}

fn print_batch(report: &BatchReport, format: Format, quiet: bool) {
    if format == Format::Json {
        println!("{}", to_json(report));
        return;
    }

    if !quiet {
        println!(
            "Checking {} for {}/{} ...\n",
            report.path.display(),
            report.provider,
            report.model_id
        );
    }

    for file_result in &report.results {
        let status_icon = match file_result.status {
            FileStatus::Ok => "\x1b[32m✓\x1b[0m",
            FileStatus::Incompatible => "\x1b[33m✗\x1b[0m",
            FileStatus::Error => "\x1b[31m✗\x1b[0m",
        };

        if !quiet || file_result.status != FileStatus::Ok {
            println!("  {} {}", status_icon, file_result.file.display());
        }
        for issue in &file_result.issues {
            println!("    {}", issue);
        }
        if let Some(error) = &file_result.error {
            println!("    \x1b[31merror\x1b[0m: {}", error);
        }
    }

    println!();
    if report.is_ok() {
        println!(
            "\x1b[32m✓ {} files checked, all compatible\x1b[0m",
            report.files_checked
        );
    } else {
        println!(
            "\x1b[31m✗ {} files checked: {} compatible, {} incompatible, {} errors\x1b[0m",
            report.files_checked, report.compatible, report.incompatible, report.errors
        );
    }
}

fn run_resolve(model: &str, rule_files: &[PathBuf]) -> Result<(), u8> {
    let model = parse_model(model)?;
    let registry = build_registry(rule_files)?;
    let resolved = registry.resolve(&model);

    let unsupported: Vec<serde_json::Value> = resolved
        .rules
        .unsupported
        .iter()
        .map(|rule| match rule {
            ConstraintRule::Simple(simple) => json!(simple),
            ConstraintRule::Custom(custom) => json!({
                "feature": custom.feature,
                "context": custom.context,
                "custom": true,
            }),
        })
        .collect();
    let validators: Vec<&str> = resolved
        .rules
        .validators
        .iter()
        .map(|v| v.name.as_str())
        .collect();

    let output = json!({
        "provider": resolved.provider,
        "modelId": resolved.model_id,
        "preferredDraft": resolved.rules.preferred_draft,
        "unsupported": unsupported,
        "validators": validators,
    });
    println!("{}", to_json(&output));
    Ok(())
}

fn run_providers(rule_files: &[PathBuf], format: Format) -> Result<(), u8> {
    let registry = build_registry(rule_files)?;

    if format == Format::Json {
        let entries: Vec<serde_json::Value> = registry
            .entries()
            .map(|(pattern, rules)| {
                json!({
                    "pattern": pattern.to_string(),
                    "provider": rules.provider,
                    "rules": rules.unsupported.len(),
                    "validators": rules.validators.len(),
                })
            })
            .collect();
        println!("{}", to_json(&entries));
        return Ok(());
    }

    for (pattern, rules) in registry.entries() {
        println!(
            "{:<24} {} ({} rules, {} validators)",
            pattern.to_string(),
            rules.provider,
            rules.unsupported.len(),
            rules.validators.len()
        );
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
}
