//! amis - validate a candidate medical-information response from the command line.
//!
//! Prints the verdict as JSON on stdout. Exit status:
//! - `0` compliant
//! - `2` not compliant
//! - `1` usage, input or configuration error

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use amis_core::{ComplianceValidator, EngineConfig, SourceRef};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for amis
#[derive(Parser, Debug)]
#[command(name = "amis")]
#[command(about = "Validate a medical-information response against the AMIS compliance standards")]
#[command(version)]
struct Args {
    /// Response text to validate
    #[arg(short, long, conflicts_with = "response_file")]
    response: Option<String>,

    /// Read the response from a file (`-` for stdin)
    #[arg(long, value_name = "PATH")]
    response_file: Option<PathBuf>,

    /// The user query the response answers
    #[arg(short, long, default_value = "")]
    query: String,

    /// Source URL or domain the response relies on (repeatable)
    #[arg(short, long = "source", value_name = "URL")]
    sources: Vec<String>,

    /// Configuration overrides (.yaml, .yml or .json)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Include intermediate findings and harm factors in the output
    #[arg(long)]
    explain: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output<T: Serialize> {
    evaluated_at: DateTime<Utc>,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct ResultBody<'a> {
    result: &'a amis_core::ComplianceResult,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Validate and print; returns whether the response is compliant.
fn run(args: Args) -> Result<bool> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let validator = ComplianceValidator::new(config);

    let response = read_response(&args)?;
    let sources: Vec<SourceRef> = args.sources.iter().map(SourceRef::new).collect();

    let report = validator.evaluate(&response, &args.query, &sources);
    let compliant = report.result.compliant;
    info!(
        compliant,
        score = report.result.score,
        violations = report.result.violations.len(),
        "Validation complete"
    );

    let evaluated_at = Utc::now();
    let json = if args.explain {
        render(
            &Output {
                evaluated_at,
                body: &report,
            },
            args.pretty,
        )?
    } else {
        render(
            &Output {
                evaluated_at,
                body: ResultBody {
                    result: &report.result,
                },
            },
            args.pretty,
        )?
    };
    println!("{json}");

    Ok(compliant)
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let config = match extension.as_deref() {
        Some("yaml") | Some("yml") => EngineConfig::from_yaml_file(path),
        Some("json") => EngineConfig::from_json_file(path),
        _ => bail!(
            "Unsupported config format for {}: expected .yaml, .yml or .json",
            path.display()
        ),
    };

    config.with_context(|| format!("Failed to load config from {}", path.display()))
}

fn read_response(args: &Args) -> Result<String> {
    if let Some(response) = &args.response {
        return Ok(response.clone());
    }

    match &args.response_file {
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read response from stdin")?;
            Ok(buf)
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read response from {}", path.display())),
        None => bail!("Provide the response with --response or --response-file"),
    }
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Failed to serialize output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_repeated_sources() {
        let args = Args::try_parse_from([
            "amis",
            "--response",
            "Text.",
            "--source",
            "who.int",
            "-s",
            "nejm.org",
        ])
        .unwrap();
        assert_eq!(args.sources, vec!["who.int", "nejm.org"]);
        assert_eq!(args.query, "");
    }

    #[test]
    fn test_response_and_file_conflict() {
        let parsed = Args::try_parse_from([
            "amis",
            "--response",
            "Text.",
            "--response-file",
            "r.txt",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_config_extension_is_rejected() {
        let err = load_config(Path::new("amis.toml")).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }

    #[test]
    fn test_output_is_camel_case() {
        let result = amis_core::validate("Text.", "", &[]);
        let json = render(
            &Output {
                evaluated_at: Utc::now(),
                body: ResultBody { result: &result },
            },
            false,
        )
        .unwrap();
        assert!(json.contains("\"evaluatedAt\""));
        assert!(json.contains("\"harmAssessment\""));
    }
}
