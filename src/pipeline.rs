//! The driver: pumps a materialized operator tree into a sink.

use crate::error::PlanStreamError;
use crate::exec::{ExecutionContext, Operator};
use crate::output::Output;
use crate::physical::{MaterializationContext, PlanNode};

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    pub records: u64,
}

/// Materialize a whole plan into its root operator.
pub fn compile(
    plan: &PlanNode,
    ctx: &MaterializationContext,
) -> Result<Box<dyn Operator>, PlanStreamError> {
    let metadata = plan.metadata();
    let root = plan
        .materialize(ctx)
        .map_err(|e| e.context(format_args!("couldn't materialize {} node", plan.kind())))?;
    tracing::info!(
        root = plan.kind(),
        cardinality = %metadata.cardinality(),
        emit_mode = ?ctx.config.emit_mode,
        "materialized pipeline"
    );
    Ok(root)
}

/// Pull `root` to the end of its stream, writing every record to `output`
/// in emission order, then close `output`.
///
/// The output is closed exactly once on success. On failure the error is
/// returned with context and the output is left unclosed, so a partial
/// result never looks complete.
pub fn run(
    root: &mut dyn Operator,
    ctx: &ExecutionContext,
    output: &mut dyn Output,
) -> Result<RunStats, PlanStreamError> {
    let mut stats = RunStats::default();
    while let Some(record) = root
        .next(ctx)
        .map_err(|e| e.context("couldn't get next record"))?
    {
        if let Err(e) = output.write_record(&record) {
            tracing::warn!(error = %e, records = stats.records, "sink write failed");
            return Err(e.context("couldn't write record"));
        }
        stats.records += 1;
    }
    output.close().map_err(|e| {
        tracing::warn!(error = %e, "sink close failed");
        e.context("couldn't close output")
    })?;
    tracing::info!(records = stats.records, "pipeline finished");
    Ok(stats)
}
