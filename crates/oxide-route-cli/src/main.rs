//! oxide-route CLI
//!
//! Command-line diagnostics for route templates and manifests.

mod manifest;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_route::{CompilerOptions, LiteralEscaping, PatternCompiler};

use crate::manifest::{describe, Manifest};

/// Compile, match and inspect route templates.
#[derive(Parser)]
#[command(name = "oxide-route")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Namespace for class targets without an explicit one.
    #[arg(long, env = "OXIDE_ROUTE_DEFAULT_NAMESPACE", global = true)]
    default_namespace: Option<String>,

    /// Escape only `/` and `.` in literal segments.
    #[arg(long, global = true)]
    legacy_escaping: bool,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the compiled pattern for a template.
    Compile {
        /// Route template, e.g. `/user/{id}/edit/{slug?}`.
        template: String,

        /// Parameter constraint as `name=pattern`. Repeatable.
        #[arg(short = 'w', long = "where", value_parser = parse_constraint)]
        constraints: Vec<(String, String)>,
    },

    /// Match a path against a template and print the parameters.
    Match {
        /// Route template.
        template: String,

        /// Request path, already URL-decoded.
        path: String,

        /// Parameter constraint as `name=pattern`. Repeatable.
        #[arg(short = 'w', long = "where", value_parser = parse_constraint)]
        constraints: Vec<(String, String)>,
    },

    /// Load a JSON manifest and print each route's effective settings.
    Inspect {
        /// Path to the manifest file.
        manifest: PathBuf,
    },
}

fn parse_constraint(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, pattern)) if !name.is_empty() && !pattern.is_empty() => {
            Ok((name.to_string(), pattern.to_string()))
        }
        _ => Err(format!("expected name=pattern, got {raw:?}")),
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let compiler = PatternCompiler::new(CompilerOptions {
        escaping: if cli.legacy_escaping {
            LiteralEscaping::Legacy
        } else {
            LiteralEscaping::Strict
        },
        ..CompilerOptions::default()
    });

    match cli.command {
        Commands::Compile {
            template,
            constraints,
        } => {
            let constraints: BTreeMap<_, _> = constraints.into_iter().collect();
            let pattern = compiler.compile(&template, &constraints)?;
            println!("{}", pattern.regex());
            for spec in pattern.params() {
                let kind = if spec.required { "required" } else { "optional" };
                println!("  {} ({kind})", spec.name);
            }
        }

        Commands::Match {
            template,
            path,
            constraints,
        } => {
            let constraints: BTreeMap<_, _> = constraints.into_iter().collect();
            let pattern = compiler.compile(&template, &constraints)?;
            match pattern.match_path(&path)? {
                Some(params) => println!("{}", serde_json::to_string_pretty(&params)?),
                None => {
                    info!("{path} does not match {template}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Commands::Inspect { manifest } => {
            let manifest = Manifest::load(&manifest)?;
            let routes = manifest.register(&compiler, cli.default_namespace.as_deref())?;
            let described: Vec<_> = routes.iter().map(describe).collect();
            println!("{}", serde_json::to_string_pretty(&described)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_constraint() {
        assert_eq!(
            parse_constraint("id=[0-9]+"),
            Ok(("id".to_string(), "[0-9]+".to_string()))
        );
        assert_eq!(
            parse_constraint("q=a=b"),
            Ok(("q".to_string(), "a=b".to_string()))
        );
        assert!(parse_constraint("id").is_err());
        assert!(parse_constraint("=x").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "oxide-route",
            "match",
            "/item/{id}",
            "/item/7",
            "--where",
            "id=[0-9]+",
            "--legacy-escaping",
        ])
        .unwrap();
        assert!(cli.legacy_escaping);
        match cli.command {
            Commands::Match { constraints, .. } => {
                assert_eq!(constraints, vec![("id".to_string(), "[0-9]+".to_string())]);
            }
            _ => panic!("expected match subcommand"),
        }
    }
}
