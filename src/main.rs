use anyhow::{Context, Result};
use cartlis::backfill::{Backfill, ChatClient};
use cartlis::engine::{FixReport, FixResult};
use cartlis::generate::{self, DEFAULT_COMPLIANCE, GENERATED_RULES_PATH};
use cartlis::{catalog, document, fix, validate, Settings, Violation};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cartlis")]
#[command(about = "Lint OpenAPI documents against governance rules and fix violations", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the OpenAPI document (YAML, or JSON by extension)
    #[arg(long)]
    spec: PathBuf,

    /// Rule catalog file, or a directory of *.yaml catalogs
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Apply fixes and write the corrected document
    #[arg(long)]
    fix: bool,

    /// Where to write the corrected document (or generated rules)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show unified diff of the corrected document
    #[arg(short, long)]
    diff: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Settings file (defaults to ./cartlis.toml, then ~/.cartlis.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate a rule catalog for the document instead of linting it
    #[arg(long)]
    generaterules: bool,

    /// Compliance standards to request when generating rules
    #[arg(long, default_value = DEFAULT_COMPLIANCE)]
    compliance: String,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CARTLIS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::resolve(cli.config.as_deref()).context("failed to load settings")?;

    if cli.generaterules {
        return cmd_generate_rules(cli, &settings);
    }

    let rules_path = cli
        .rules
        .clone()
        .unwrap_or_else(|| settings.rules.path.clone());
    let catalog = catalog::load_from_path(&rules_path)?;
    let mut loaded = document::load_from_path(&cli.spec)?;

    let mut violations = validate(&loaded.document, &catalog);
    let found = violations.clone();

    if !cli.fix || violations.is_empty() {
        match cli.format {
            OutputFormat::Json => print_json(&JsonReport {
                violations: &found,
                fixes: None,
                remaining: None,
                output: None,
            })?,
            OutputFormat::Text => {
                print_violations(&found);
                if !found.is_empty() {
                    println!();
                    println!("Run the command again with --fix to apply fixes.");
                }
            }
        }
        return Ok(());
    }

    let backfill = Backfill::from_settings(&settings.backfill);
    let report = fix(&mut loaded.document, &mut violations, &backfill);
    let remaining = validate(&loaded.document, &catalog);

    let fixed_text = document::to_string(&loaded.document, loaded.format)?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| document::fixed_sibling_path(&cli.spec));
    document::write_atomic(&output, &fixed_text)?;

    match cli.format {
        OutputFormat::Json => print_json(&JsonReport {
            violations: &found,
            fixes: Some(
                report
                    .results
                    .iter()
                    .map(|(violation, result)| JsonFix {
                        violation,
                        result: result.to_string(),
                    })
                    .collect(),
            ),
            remaining: Some(remaining.as_slice()),
            output: Some(output.as_path()),
        })?,
        OutputFormat::Text => {
            print_violations(&found);
            println!();
            print_fix_report(&report);
            if cli.diff {
                display_diff(&cli.spec, &loaded.source, &fixed_text);
            }
            println!();
            if !remaining.is_empty() {
                println!(
                    "{}",
                    format!(
                        "{} violation(s) remain after fixing (run again with --format json for details)",
                        remaining.len()
                    )
                    .yellow()
                );
            }
            println!(
                "{} Fixed document written to {}",
                "✓".green(),
                output.display()
            );
        }
    }

    Ok(())
}

fn cmd_generate_rules(cli: &Cli, settings: &Settings) -> Result<()> {
    let client = ChatClient::from_settings(&settings.backfill)
        .context("rule generation needs an API key (set CARTLIS_API_KEY or OPENAI_API_KEY)")?
        .without_token_limit();
    let spec_text = fs::read_to_string(&cli.spec)
        .with_context(|| format!("failed to read API document {}", cli.spec.display()))?;

    println!(
        "Generating rules for {} ({})...",
        cli.spec.display(),
        cli.compliance
    );
    let rules = generate::generate_rules(&client, &cli.compliance, &spec_text)?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(GENERATED_RULES_PATH));
    generate::write_rules(&output, &rules)?;

    println!(
        "{} Generated {} rule(s) into {}",
        "✓".green(),
        rules.catalog.rules.len(),
        output.display()
    );
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    violations: &'a [Violation],
    #[serde(skip_serializing_if = "Option::is_none")]
    fixes: Option<Vec<JsonFix<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<&'a [Violation]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a Path>,
}

#[derive(Serialize)]
struct JsonFix<'a> {
    violation: &'a Violation,
    result: String,
}

fn print_json(report: &JsonReport<'_>) -> Result<()> {
    let text = serde_json::to_string_pretty(report).context("failed to encode report")?;
    println!("{text}");
    Ok(())
}

fn print_violations(violations: &[Violation]) {
    if violations.is_empty() {
        println!("{}", "No violations found.".green());
        return;
    }

    println!("{}", "Violations:".bold());
    for violation in violations {
        println!(
            "{} {}: {} at {}",
            "✗".red(),
            violation.rule_id.bold(),
            violation.description,
            violation.target
        );
        if let Some(fix) = violation.fix.as_ref().and_then(|fix| fix.description.as_deref()) {
            println!("    {}", format!("Fix: {fix}").dimmed());
        }
    }
    println!();
    println!("{} violation(s) found", violations.len());
}

fn print_fix_report(report: &FixReport) {
    println!("{}", "Fixes:".bold());
    for (violation, result) in &report.results {
        let marker = match result {
            FixResult::Applied { fallbacks: 0 } => "✓".green(),
            FixResult::Applied { .. } => "✓".yellow(),
            FixResult::Moved { .. } => "↪".green(),
            FixResult::Skipped { .. } => "⊘".cyan(),
            FixResult::NoHandler => "·".dimmed(),
        };
        println!(
            "{} {} at {}: {}",
            marker,
            violation.rule_id,
            violation.target,
            result
        );
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", report.applied()).green());
    println!("  {} skipped", format!("{}", report.skipped()).cyan());
    println!("  {} without fix", format!("{}", report.unfixable()).dimmed());
    println!(
        "  {} fallback text(s)",
        format!("{}", report.degraded()).yellow()
    );
    if report.sanitized > 0 {
        println!("  {} null response(s) repaired", report.sanitized);
    }
}

/// Show unified diff between original and corrected content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (fixed)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
