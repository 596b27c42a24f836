//! filterql - inspect how a filter expression is flattened and compiled

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use filterql::predicate::resolve_operator;
use filterql::{FilterConfig, FlattenedGroup, Joiner};
use log::debug;
use std::path::PathBuf;

/// filterql - Flatten a SQL-style filter expression into joined terms
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Filter expression, e.g. "qty > 5 AND name LIKE 'A%'"
    expression: String,

    /// Print the flattened groups as JSON
    #[arg(short, long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// JSON file with a filter configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = load_config(&args)?;
    debug!("using configuration {:?}", config);

    let groups = filterql::parse_filter_with(&args.expression, &config)
        .with_context(|| format!("Failed to parse filter '{}'", args.expression))?;

    if args.json {
        let json = serde_json::to_string_pretty(&groups).context("Failed to encode groups")?;
        println!("{}", json);
    } else {
        print_groups(&groups);
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<FilterConfig> {
    match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str::<FilterConfig>(&text)
                .with_context(|| format!("Invalid config file {}", path.display()))
        }
        None => Ok(FilterConfig::default()),
    }
}

fn print_groups(groups: &[FlattenedGroup]) {
    println!(
        "{:<4} {:<6} {:<24} {:<12} {:<8} {:<16} VALUES",
        "#", "JOINER", "SUBJECT", "OPERATOR", "NEGATED", "PREDICATE"
    );
    for (i, group) in groups.iter().enumerate() {
        let term = &group.term;
        let joiner = match group.joiner {
            Joiner::None => "-".to_string(),
            joiner => joiner.to_string(),
        };
        let (operator, wrapped) = resolve_operator(term.operator, term.negated);
        let predicate = if wrapped {
            format!("NOT({})", operator)
        } else {
            operator.to_string()
        };
        let values = term
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<4} {:<6} {:<24} {:<12} {:<8} {:<16} [{}]",
            i,
            joiner,
            term.subject.to_string(),
            term.operator.to_string(),
            term.negated,
            predicate,
            values
        );
    }
}
