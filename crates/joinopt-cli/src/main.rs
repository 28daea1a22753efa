//! joinopt - pick a join order for a query in the text encoding
//!
//! Usage:
//!   joinopt [FILE] [--explain] [--json] [--max-relations <N>]
//!
//! Examples:
//!   joinopt                      # reads ./input.txt
//!   joinopt query.txt --explain
//!   joinopt query.txt --json

use clap::Parser;
use joinopt_core::cost::TextbookCostModel;
use joinopt_core::search::{JoinOrderSearch, SearchConfig};
use joinopt_text::{consumer, producer};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "joinopt")]
#[command(about = "Cost-based join ordering over all bushy join trees")]
#[command(version)]
struct Cli {
    /// Path to the query file
    #[arg(default_value = "input.txt")]
    file: PathBuf,

    /// Print the plan tree and search statistics after the result line
    #[arg(long, conflicts_with = "json")]
    explain: bool,

    /// Print the best plan as JSON
    #[arg(long)]
    json: bool,

    /// Refuse queries with more relations than this
    #[arg(long, default_value_t = SearchConfig::default().max_relations)]
    max_relations: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Diagnostics go to stderr so stdout carries only the result.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("joinopt=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let source = match fs::read_to_string(&cli.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", cli.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let query = match consumer::parse_query(&source) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Parse error in '{}': {}", cli.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let config = SearchConfig {
        max_relations: cli.max_relations,
    };
    let mut search = JoinOrderSearch::new(&query, Arc::new(TextbookCostModel), config);
    let best = match search.optimize() {
        Ok(best) => best,
        Err(e) => {
            eprintln!("Optimization error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&best) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Encode error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else if cli.explain {
        print!("{}", producer::format_explain(&best, &search.memo));
    } else {
        println!("{}", producer::format_result(&best));
    }
    ExitCode::SUCCESS
}
