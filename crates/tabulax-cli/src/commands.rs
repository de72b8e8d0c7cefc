use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, info, info_span, warn};

use tabulax_exec::Executor;
use tabulax_join::FuzzyJoiner;
use tabulax_model::{
    ExampleSet, ExecutionReport, JoinResult, Table, Transformation, TransformationExample,
};
use tabulax_resolve::{DisabledResolver, HttpResolver, ResilientResolver, ValueResolver};
use tabulax_synth::learn;

use crate::cli::{ApplyArgs, JoinArgs, LearnArgs};
use crate::config::{FileConfig, JoinFlags};
use crate::io::{example_columns, read_table, read_transformation, write_json, write_table};
use crate::logging::redact_value;

/// Builds the resolver used for General transformations.
///
/// Without a configured URL every resolver call fails with a
/// not-configured error, so General rows outside the examples fail per row.
pub fn build_resolver(config: &FileConfig) -> Result<ResilientResolver> {
    let policy = config.resolver_policy()?;
    let inner: Arc<dyn ValueResolver> =
        match config.http_resolver(|key| std::env::var(key).ok())? {
            Some(http) => {
                info!(url = %http.base_url, "using HTTP resolver");
                Arc::new(HttpResolver::new(http).context("build HTTP resolver")?)
            }
            None => {
                debug!("no resolver configured");
                Arc::new(DisabledResolver)
            }
        };
    Ok(ResilientResolver::new(inner, policy))
}

pub fn run_learn(args: &LearnArgs, resolver: &dyn ValueResolver) -> Result<Transformation> {
    let span = info_span!("learn", examples = %args.examples.display());
    let _guard = span.enter();
    let started = Instant::now();

    let table = read_table(&args.examples)?;
    let (sources, targets, skipped) =
        example_columns(&table, &args.source_column, &args.target_column)?;
    if skipped > 0 {
        warn!(skipped, "example rows with a null side were skipped");
    }
    let examples = ExampleSet::from_columns(sources, targets).context("invalid examples")?;

    let learned = learn(&examples, resolver);
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| file_stem(&args.examples));
    let id = record_id(&name, examples.as_slice());
    let record = learned.into_record(id, name, args.owner.clone());

    write_json(&record, args.output.as_deref())?;
    info!(
        category = %record.category,
        examples = examples.len(),
        elapsed = ?started.elapsed(),
        "learn finished"
    );
    Ok(record)
}

pub fn run_apply(
    args: &ApplyArgs,
    config: &FileConfig,
    resolver: &dyn ValueResolver,
) -> Result<ExecutionReport> {
    let transformation = read_transformation(&args.transformation)?;
    let span = info_span!(
        "apply",
        transformation = %transformation.name,
        category = %transformation.category
    );
    let _guard = span.enter();

    let table = read_table(&args.table)?;
    let options = config.exec_options(args.workers, args.deadline_secs)?;
    let report = Executor::new(resolver)
        .with_options(options)
        .execute(&transformation, &table, &args.input_column, &args.output_column)
        .with_context(|| format!("apply {}", args.transformation.display()))?;

    log_failures(&report, &table, &args.input_column);
    write_table(&report.data, args.output.as_deref())?;
    Ok(report)
}

pub fn run_join(args: &JoinArgs, config: &FileConfig) -> Result<JoinResult> {
    let span = info_span!("join", category = %args.category);
    let _guard = span.enter();

    let source = read_table(&args.source)?;
    let target = read_table(&args.target)?;
    let options = config.join_options(&JoinFlags {
        max_distance: args.max_distance,
        ignore_case: args.ignore_case,
        trim: args.trim,
        omit_unmatched: args.omit_unmatched,
        workers: args.workers,
    });
    debug!(?options, "join options");

    let result = FuzzyJoiner::new(options)
        .join(&source, &target, &args.source_column, &args.target_column, args.category)
        .context("fuzzy join")?;

    write_table(&result.data, args.output.as_deref())?;
    Ok(result)
}

fn log_failures(report: &ExecutionReport, table: &Table, input: &str) {
    for failure in &report.failures {
        let value = table
            .rows()
            .get(failure.row_index)
            .map(|row| row.get(input).to_string())
            .unwrap_or_default();
        debug!(
            row = failure.row_index,
            kind = failure.kind.as_str(),
            value = redact_value(&value),
            reason = %failure.reason,
            "row failed"
        );
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transformation".to_string())
}

/// Stable record id derived from the name and the example pairs.
pub fn record_id(name: &str, examples: &[TransformationExample]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    for example in examples {
        hasher.update([0x1e]);
        hasher.update(example.source.as_bytes());
        hasher.update([0x1f]);
        hasher.update(example.target.as_bytes());
    }
    let mut id = hex::encode(hasher.finalize());
    id.truncate(16);
    id
}
