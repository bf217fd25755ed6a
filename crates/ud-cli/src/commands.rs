use anyhow::{Context, Result};
use tracing::info;

use ud_ingest::read_source_table;
use ud_model::load_run_config;

use ud_cli::pipeline::{RunContext, describe_headers, run_conversion};
use ud_cli::types::{HeaderRow, RunResult};

use crate::cli::{ConvertArgs, HeadersArgs};

pub fn run_convert(args: &ConvertArgs) -> Result<RunResult> {
    let mut run = load_run_config(&args.config)
        .with_context(|| format!("load run configuration {}", args.config.display()))?;
    if let Some(source) = &args.source {
        run.source_dir = source.clone();
    }
    if let Some(output) = &args.output {
        run.output_dir = output.clone();
    }
    if let Some(max_rows) = args.max_rows {
        run.max_rows_per_document = max_rows;
    }
    let ctx = RunContext::prepare(run)?;
    info!(
        producer = %ctx.producer_id,
        offset = %ctx.offset_label,
        slot_mode = ctx.options.period.slot_mode,
        "run prepared"
    );
    run_conversion(&ctx, args.dry_run)
}

pub fn run_headers(args: &HeadersArgs) -> Result<Vec<HeaderRow>> {
    let run = load_run_config(&args.config)
        .with_context(|| format!("load run configuration {}", args.config.display()))?;
    let ctx = RunContext::prepare(run)?;
    let table = read_source_table(&args.file, ctx.separator)
        .with_context(|| format!("read {}", args.file.display()))?;
    Ok(describe_headers(&ctx.mapping, &table.headers))
}
