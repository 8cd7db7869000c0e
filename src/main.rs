use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Read};
use std::process::ExitCode;
use std::sync::Arc;

use obvious_comments::config::Config;
use obvious_comments::parser::{parse_file, SourceComment, SyntaxTree};
use obvious_comments::runner::{collect_inputs, lint_files, FileReport};
use obvious_comments::{RedundantCommentRule, Sensitivity, SharedCaches};

#[derive(Parser)]
#[command(author, version, about = "Flags comments that only restate the code below them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint files or directories for redundant comments
    Check(CheckArgs),
    /// Parse JS/TS/JSX/TSX from STDIN and print constructs and comments as JSON
    Parse(ParseArgs),
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Files or directories to analyze
    #[arg(default_value = ".")]
    paths: Vec<String>,

    /// JSON config file
    #[arg(long)]
    config: Option<String>,

    /// Overrides the configured sensitivity (low, medium, high)
    #[arg(long)]
    sensitivity: Option<Sensitivity>,

    /// Do not check comments on their own line
    #[arg(long)]
    no_leading: bool,

    /// Do not check comments that follow code
    #[arg(long)]
    no_trailing: bool,

    /// Skip comments matching this regex; `/body/flags` is accepted
    #[arg(long = "ignore-pattern")]
    ignore_patterns: Vec<String>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Args, Debug, Default)]
struct ParseArgs {
    /// Optional filename hint to influence parser mode (e.g., file.tsx)
    #[arg(long)]
    filename: Option<String>,
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    tree: &'a SyntaxTree,
    comments: &'a [SourceComment],
}

#[derive(Serialize)]
struct ParseErrorOut {
    error: String,
}

fn load_config(args: &CheckArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    let rule = &mut config.rule;
    if let Some(sensitivity) = args.sensitivity {
        rule.sensitivity = sensitivity;
    }
    if args.no_leading {
        rule.check_leading = false;
    }
    if args.no_trailing {
        rule.check_trailing = false;
    }
    rule.ignore_patterns.extend(args.ignore_patterns.iter().cloned());
    Ok(config)
}

fn print_text(reports: &[FileReport]) {
    for report in reports {
        if let Some(error) = &report.error {
            eprintln!("{}: {error}", report.path);
        }
        for finding in &report.findings {
            println!(
                "{}:{}:{}  {}  {}  {}",
                report.path,
                finding.location.line,
                finding.location.column + 1,
                finding.severity,
                finding.message,
                finding.rule_id
            );
        }
    }
}

fn check(args: CheckArgs) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let caches = Arc::new(SharedCaches::new(&config.cache));
    let rule = RedundantCommentRule::new(config.rule, caches.clone());

    let files = collect_inputs(&args.paths, &config.include);
    tracing::debug!(files = files.len(), "collected inputs");
    let reports = lint_files(&files, &rule);

    match args.format {
        Format::Json => println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("failed to serialize reports")?
        ),
        Format::Text => print_text(&reports),
    }

    let stats = caches.stats();
    tracing::debug!(hits = stats.hits, misses = stats.misses, "cache usage");

    let findings: usize = reports.iter().map(|r| r.findings.len()).sum();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    tracing::info!(files = reports.len(), findings, failed, "check finished");

    Ok(if reports.iter().all(FileReport::is_clean) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn parse(args: ParseArgs) -> Result<ExitCode> {
    let mut src = String::new();
    io::stdin()
        .read_to_string(&mut src)
        .context("failed to read from STDIN")?;
    let filename = args.filename.unwrap_or_else(|| "input.tsx".to_string());

    match parse_file(&src, &filename) {
        Ok(file) => {
            let out = ParseOutput {
                tree: &file.tree,
                comments: &file.comments,
            };
            println!("{}", serde_json::to_string(&out)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            // keep stdout JSON for callers that parse it
            println!("{}", serde_json::to_string(&ParseErrorOut { error: err.to_string() })?);
            Ok(ExitCode::from(1))
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("obvious_comments=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check(args) => check(args),
        Commands::Parse(args) => parse(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}
