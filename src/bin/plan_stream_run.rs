//! plan_stream_run: group a JSON-lines record stream and print the
//! aggregate changelog as a JSON array.
//!
//! ## Usage
//!
//! ```bash
//! # Running total per country, changelog on stdout
//! plan_stream_run --input orders.jsonl --key country --agg sum:amount:total
//!
//! # Final-only output, configuration from a file, input from stdin
//! PLAN_STREAM_EMIT_MODE=final plan_stream_run --config engine.toml \
//!     --key country --agg count: --agg max:amount
//! ```
//!
//! Each `--agg` is `kind:field[:alias]`; an empty field counts whole records.

use clap::Parser;
use plan_stream::config::EngineConfig;
use plan_stream::error::PlanStreamError;
use plan_stream::exec::ExecutionContext;
use plan_stream::output::JsonArrayOutput;
use plan_stream::physical::{
    Aggregate, Cardinality, Expression, GroupBy, MaterializationContext, PlanNode, Scan,
};
use plan_stream::source::{DataSource, JsonLinesSource};
use plan_stream::value::VariableName;
use plan_stream::{logging, pipeline};
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const INPUT_SOURCE: &str = "input";

#[derive(Parser, Debug)]
#[command(name = "plan_stream_run")]
#[command(about = "Streaming grouped aggregation over JSON-lines records")]
#[command(version)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(short, long, env = "PLAN_STREAM_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-lines input file; `-` reads stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Treat the input as unbounded (a live stream)
    #[arg(long)]
    unbounded: bool,

    /// Group key field, repeatable
    #[arg(short, long = "key")]
    keys: Vec<String>,

    /// Aggregate as `kind:field[:alias]`, repeatable
    #[arg(short, long = "agg", required = true)]
    aggs: Vec<String>,
}

/// A parsed `--agg` argument.
struct AggArg {
    kind: Aggregate,
    field: VariableName,
    alias: VariableName,
}

fn parse_agg(arg: &str) -> Result<AggArg, PlanStreamError> {
    let mut parts = arg.splitn(3, ':');
    let kind = Aggregate::parse(parts.next().unwrap_or_default())?;
    let Some(field) = parts.next() else {
        return Err(PlanStreamError::Compilation(format!(
            "aggregate {arg:?} must be kind:field[:alias]"
        )));
    };
    Ok(AggArg {
        kind,
        field: VariableName::new(field.trim()),
        alias: VariableName::new(parts.next().unwrap_or_default().trim()),
    })
}

fn build_plan(cli: &Cli) -> Result<PlanNode, PlanStreamError> {
    let cardinality = if cli.unbounded {
        Cardinality::Unbounded
    } else {
        Cardinality::BoundedDoesNotFitInLocalStorage
    };
    let aggs = cli
        .aggs
        .iter()
        .map(|a| parse_agg(a))
        .collect::<Result<Vec<_>, _>>()?;
    let node = GroupBy::new(
        PlanNode::Scan(Scan::new(INPUT_SOURCE, cardinality)),
        cli.keys
            .iter()
            .map(|k| Expression::Variable(VariableName::new(k.as_str())))
            .collect(),
        aggs.iter().map(|a| a.field.clone()).collect(),
        aggs.iter().map(|a| a.kind).collect(),
        aggs.into_iter().map(|a| a.alias).collect(),
    )?;
    Ok(PlanNode::GroupBy(node))
}

fn load_config(cli: &Cli) -> Result<EngineConfig, PlanStreamError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    config.apply_env_overrides()
}

fn run(cli: Cli) -> Result<(), PlanStreamError> {
    let config = load_config(&cli)?;
    logging::init(&config.log_filter);

    let plan = build_plan(&cli)?;
    tracing::debug!(plan = %plan.visualize().render(), "plan");

    let source: Arc<dyn DataSource> = if cli.input == "-" {
        Arc::new(JsonLinesSource::from_reader(BufReader::new(io::stdin())))
    } else {
        Arc::new(JsonLinesSource::from_path(&cli.input))
    };
    let ctx = MaterializationContext::new(config).with_source(INPUT_SOURCE, source);
    let mut root = pipeline::compile(&plan, &ctx)?;

    let stdout = io::stdout();
    let mut output = JsonArrayOutput::new(BufWriter::new(stdout.lock()));
    let stats = pipeline::run(root.as_mut(), &ExecutionContext::default(), &mut output)?;
    tracing::info!(records = stats.records, "done");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("plan_stream_run: {e} [{}]", e.kind());
            ExitCode::FAILURE
        }
    }
}
