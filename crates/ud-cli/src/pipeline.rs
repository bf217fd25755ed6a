//! Run pipeline: discovery, per-file conversion, document and report output.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use tracing::{error, info, info_span, warn};

use ud_ingest::{
    SourceKind, list_source_files, move_to_completed, read_json_feed, read_source_table,
    sha256_file, source_kind,
};
use ud_map::column_positions;
use ud_model::{PropertyConfig, ResolvedRecord, RunConfig, load_property_config};
use ud_output::{
    DocumentHeader, FileReport, FileStatus, HeaderOptions, build_documents, generation_stamp,
    part_count, resolve_producer_id, write_conversion_report, write_documents,
};
use ud_transform::{
    ConversionOptions, NormalizationContext, convert_feed, convert_table, offset_label,
    parse_zone, target_offset,
};

use crate::types::{HeaderRow, RunResult};

/// Everything derived once per run from the run configuration.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run: RunConfig,
    pub mapping: PropertyConfig,
    pub separator: u8,
    pub options: ConversionOptions,
    pub target: FixedOffset,
    pub offset_label: String,
    pub producer_id: String,
}

impl RunContext {
    /// Load the mapping and resolve offsets, zone and producer.
    pub fn prepare(run: RunConfig) -> Result<Self> {
        let mapping = load_property_config(&run.mapping)
            .with_context(|| format!("load mapping {}", run.mapping.display()))?;
        let separator = run.separator_byte().context("run configuration")?;
        let target = target_offset(&run.target_offset);
        let normalization = NormalizationContext::new(target)
            .with_zone(parse_zone(run.time_zone.as_deref()))
            .with_ambiguity_handling(run.handle_ambiguity)
            .with_single_overlap(run.allow_single_overlap);
        let options = ConversionOptions::new(
            mapping.configurations.period_config(run.slot_mode),
            normalization,
        );
        let producer_id = resolve_producer_id(run.producer(), &run.source_dir);
        Ok(Self {
            offset_label: offset_label(&run.target_offset),
            separator,
            options,
            target,
            producer_id,
            mapping,
            run,
        })
    }

    /// Specification and context for documents generated at `generated_at`.
    pub fn document_header(&self, generated_at: DateTime<Utc>) -> DocumentHeader {
        let options = HeaderOptions {
            producer_id: self.producer_id.clone(),
            coordinates: self.run.coordinates.clone(),
            target: self.target,
            offset_label: self.offset_label.clone(),
            generated_at,
        };
        DocumentHeader::finalize(&self.mapping, &options)
    }
}

/// Records of one source, before writing.
#[derive(Debug)]
pub struct ConvertedSource {
    pub records: Vec<ResolvedRecord>,
    pub report: FileReport,
}

/// Read and convert one source file.
pub fn convert_source(ctx: &RunContext, path: &Path) -> Result<ConvertedSource> {
    let sha256 = sha256_file(path).context("checksum source")?;
    let Some(kind) = source_kind(path) else {
        bail!("unsupported source type: {}", path.display());
    };
    let (records, rows_read, unmatched_headers, dropped, status) = match kind {
        SourceKind::Csv => {
            let table = read_source_table(path, ctx.separator).context("read source table")?;
            let outcome = convert_table(&ctx.mapping, &table, &ctx.options)
                .with_context(|| format!("convert {}", path.display()))?;
            let status = if outcome.all_dropped() {
                FileStatus::AllDropped
            } else {
                FileStatus::Converted
            };
            (
                outcome.records,
                outcome.rows_read,
                outcome.unmatched_headers,
                outcome.dropped,
                status,
            )
        }
        SourceKind::JsonFeed => {
            let objects = read_json_feed(path).context("read json feed")?;
            let records = convert_feed(&ctx.mapping, &objects);
            (records, objects.len(), Vec::new(), Vec::new(), FileStatus::Converted)
        }
    };
    let report = FileReport {
        source: path.to_path_buf(),
        sha256: Some(sha256),
        status,
        rows_read,
        records_emitted: records.len(),
        documents: Vec::new(),
        unmatched_headers,
        dropped,
        error: None,
    };
    Ok(ConvertedSource { records, report })
}

/// Generation stamps already used by documents of this run.
///
/// Documents of one run share the producer id, so a repeated stamp would
/// overwrite an earlier file; later claims move forward one second at a time.
#[derive(Debug, Default)]
struct StampBook {
    used: BTreeSet<String>,
}

impl StampBook {
    fn claim(&mut self, mut instant: DateTime<Utc>, target: FixedOffset) -> (DateTime<Utc>, String) {
        loop {
            let stamp = generation_stamp(instant, target);
            if self.used.insert(stamp.clone()) {
                return (instant, stamp);
            }
            instant += TimeDelta::seconds(1);
        }
    }
}

fn write_source(
    ctx: &RunContext,
    path: &Path,
    converted: ConvertedSource,
    stamps: &mut StampBook,
) -> Result<FileReport> {
    let ConvertedSource { records, mut report } = converted;
    if report.status == FileStatus::AllDropped {
        warn!(
            file = %path.display(),
            dropped = report.dropped.len(),
            "no record survived normalization, nothing written"
        );
        return Ok(report);
    }
    let (generated_at, stamp) = stamps.claim(Utc::now(), ctx.target);
    let header = ctx.document_header(generated_at);
    let documents = build_documents(&header, records, ctx.run.max_rows_per_document);
    report.documents = write_documents(&ctx.run.output_dir, &ctx.producer_id, &stamp, &documents)
        .context("write documents")?;
    if ctx.run.move_completed {
        move_to_completed(path).context("move source to completed")?;
    }
    Ok(report)
}

fn process_source(ctx: &RunContext, path: &Path, dry_run: bool, stamps: &mut StampBook) -> FileReport {
    let span = info_span!("convert_file", file = %path.display());
    let _guard = span.enter();
    let result = convert_source(ctx, path).and_then(|converted| {
        if dry_run {
            let planned = part_count(converted.records.len(), ctx.run.max_rows_per_document);
            info!(documents = planned, "dry run, nothing written");
            Ok(converted.report)
        } else {
            write_source(ctx, path, converted, stamps)
        }
    });
    match result {
        Ok(report) => {
            info!(
                rows = report.rows_read,
                records = report.records_emitted,
                dropped = report.dropped.len(),
                documents = report.documents_written(),
                "source converted"
            );
            report
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "source conversion failed");
            FileReport::failed(path, format!("{err:#}"))
        }
    }
}

/// Convert every source of the run.
pub fn run_conversion(ctx: &RunContext, dry_run: bool) -> Result<RunResult> {
    let source_dir = &ctx.run.source_dir;
    let run_span = info_span!("run", extraction = %ctx.run.extraction_name);
    let _run_guard = run_span.enter();
    let sources = list_source_files(source_dir)
        .with_context(|| format!("list sources in {}", source_dir.display()))?;
    info!(files = sources.len(), dir = %source_dir.display(), "discovered sources");

    let mut stamps = StampBook::default();
    let files: Vec<FileReport> = sources
        .iter()
        .map(|path| process_source(ctx, path, dry_run, &mut stamps))
        .collect();

    let report = if dry_run {
        None
    } else {
        let path = write_conversion_report(
            &ctx.run.output_dir,
            &ctx.run.extraction_name,
            Utc::now(),
            &files,
        )
        .context("write conversion report")?;
        Some(path)
    };
    let has_errors = files.iter().any(|file| file.status == FileStatus::Failed);
    Ok(RunResult {
        extraction_name: ctx.run.extraction_name.clone(),
        source_dir: source_dir.clone(),
        output_dir: ctx.run.output_dir.clone(),
        files,
        report,
        dry_run,
        has_errors,
    })
}

/// Resolve each header cell against the mapping and period layout.
pub fn describe_headers(mapping: &PropertyConfig, headers: &[String]) -> Vec<HeaderRow> {
    let configurations = &mapping.configurations;
    let date_columns = configurations
        .date
        .as_deref()
        .map(|name| column_positions(headers, name))
        .unwrap_or_default();
    let period_columns: Vec<usize> = configurations
        .period
        .iter()
        .flat_map(|name| column_positions(headers, name))
        .collect();
    headers
        .iter()
        .enumerate()
        .map(|(position, header)| {
            let rule = mapping.mappings.get(header);
            let period_role = if date_columns.contains(&position) {
                Some("date")
            } else if period_columns.contains(&position) {
                Some("period")
            } else {
                None
            };
            HeaderRow {
                position,
                header: header.clone(),
                canonical: rule.map(|rule| rule.name.clone()),
                negative: rule.and_then(|rule| rule.negative_name().map(str::to_string)),
                function: rule
                    .and_then(|rule| rule.function.as_ref())
                    .map(ToString::to_string),
                coordinates: rule.is_some_and(|rule| rule.coordinates),
                period_role,
            }
        })
        .collect()
}
