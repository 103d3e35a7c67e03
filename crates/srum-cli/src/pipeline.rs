//! Conversion pipeline with explicit stages.
//!
//! 1. **Plan**: open every source table, resolve its destination name and
//!    build its schema. A configuration error stops the run here, before a
//!    single row is written.
//! 2. **Tabular**: per table, create it and then decode and insert every
//!    record, all inside one transaction.
//! 3. **Registry**: collect WLAN profiles, build the discovered schema and
//!    write them as one more table.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, info_span, trace};

use srum_decode::{
    DecodeError, INTERFACES_PATH, ProfileWalker, RecordDecoder, RuleSet, SchemaBuilder,
    TableNameResolver, TablePlan, TypeMap, WLAN_PROFILE_TABLE,
};
use srum_ingest::{RegistryHive, SourceTable, TabularSource};
use srum_output::{SqliteOutput, WriteStats};

use crate::types::TableSummary;

/// Type map and rules for one source format.
#[derive(Debug, Clone, Copy)]
pub struct DecodeConfig<'a> {
    pub type_map: &'a TypeMap,
    pub rules: &'a RuleSet,
}

impl<'a> DecodeConfig<'a> {
    pub fn new(type_map: &'a TypeMap, rules: &'a RuleSet) -> Self {
        Self { type_map, rules }
    }
}

enum PlannedTable<'s> {
    Ready {
        plan: TablePlan,
        table: Box<dyn SourceTable + 's>,
    },
    Unreadable(TableSummary),
}

/// Stage 1: plans every table of `source` in storage order.
fn plan_tables<'s, S>(
    source: &'s S,
    resolver: &TableNameResolver,
    builder: &SchemaBuilder<'_>,
) -> Result<Vec<PlannedTable<'s>>>
where
    S: TabularSource + ?Sized,
{
    let mut planned = Vec::new();
    for name in source.table_names() {
        let destination = resolver.resolve(&name);
        let table = match source.open_table(&name) {
            Ok(table) => table,
            Err(error) => {
                error!(source = %name, table = %destination, error = %error, "Cannot open table");
                let mut summary = TableSummary::new(name.as_str(), destination);
                summary.error = Some(error.to_string());
                planned.push(PlannedTable::Unreadable(summary));
                continue;
            }
        };
        let plan = builder
            .plan(&name, &destination, table.columns().to_vec())
            .with_context(|| format!("plan table {name} ({destination})"))?;
        planned.push(PlannedTable::Ready { plan, table });
    }
    Ok(planned)
}

/// Stages 1 and 2 for a tabular source.
///
/// Returns one summary per source table. A table whose records cannot be
/// read is rolled back and reported through [`TableSummary::error`]; the
/// remaining tables are still written.
pub fn convert_tabular<S>(
    source: &S,
    output: &mut SqliteOutput,
    resolver: &TableNameResolver,
    config: DecodeConfig<'_>,
) -> Result<Vec<TableSummary>>
where
    S: TabularSource + ?Sized,
{
    let builder = SchemaBuilder::new(config.type_map, config.rules);
    let planned = plan_tables(source, resolver, &builder)?;
    info!(tables = planned.len(), "Planned tabular source");

    let decoder = RecordDecoder::new(config.type_map, config.rules);
    let mut summaries = Vec::with_capacity(planned.len());
    for entry in planned {
        let summary = match entry {
            PlannedTable::Ready { plan, mut table } => {
                write_table(output, decoder, &plan, table.as_mut())?
            }
            PlannedTable::Unreadable(summary) => summary,
        };
        summaries.push(summary);
    }
    Ok(summaries)
}

fn write_table(
    output: &mut SqliteOutput,
    decoder: RecordDecoder<'_>,
    plan: &TablePlan,
    table: &mut dyn SourceTable,
) -> Result<TableSummary> {
    let destination = plan.destination();
    let span = info_span!("table", source = %plan.source, table = %destination);
    let _guard = span.enter();
    let started = Instant::now();
    let mut summary = TableSummary::new(plan.source.as_str(), destination);

    let mut writer = match output.begin_table(&plan.schema) {
        Ok(writer) => writer,
        Err(error) => {
            error!(error = %error, "Cannot create table");
            summary.error = Some(error.to_string());
            return Ok(summary);
        }
    };

    let mut read_error = None;
    for record in table.records() {
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                read_error = Some(error);
                break;
            }
        };
        summary.records += 1;
        let outcome = match decoder.decode_record(destination, &plan.columns, &record) {
            Ok(outcome) => outcome,
            Err(error) => {
                if let Err(rollback) = writer.rollback() {
                    error!(error = %rollback, "Rollback failed");
                }
                return Err(error).with_context(|| format!("decode table {destination}"));
            }
        };
        summary.field_errors += outcome.failures.len();
        trace!(row = ?outcome.row, "Decoded row");
        writer.insert(&outcome.row);
    }

    if let Some(error) = read_error {
        error!(
            error = %error,
            records = summary.records,
            "Source read failed, discarding table"
        );
        summary.error = Some(error.to_string());
        if let Err(rollback) = writer.rollback() {
            error!(error = %rollback, "Rollback failed");
        }
        return Ok(summary);
    }

    match writer.commit() {
        Ok(stats) => record_stats(&mut summary, stats),
        Err(error) => {
            error!(error = %error, "Commit failed");
            summary.error = Some(error.to_string());
        }
    }
    info!(
        records = summary.records,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        failed = summary.failed,
        field_errors = summary.field_errors,
        duration_ms = started.elapsed().as_millis(),
        "Table complete"
    );
    Ok(summary)
}

/// Stage 3: WLAN profiles from the SOFTWARE hive.
///
/// A hive without the interfaces key is reported through
/// [`TableSummary::error`]. An empty profile set writes no table.
pub fn convert_registry<H: RegistryHive>(
    hive: &H,
    output: &mut SqliteOutput,
    config: DecodeConfig<'_>,
) -> Result<TableSummary> {
    let started = Instant::now();
    let walker = ProfileWalker::new(config.type_map, config.rules);
    let mut summary = TableSummary::new(INTERFACES_PATH, WLAN_PROFILE_TABLE);

    let collection = match walker.collect(hive) {
        Ok(collection) => collection,
        Err(DecodeError::Source(error)) => {
            error!(table = WLAN_PROFILE_TABLE, error = %error, "Cannot read WLAN profiles");
            summary.error = Some(error.to_string());
            return Ok(summary);
        }
        Err(DecodeError::Config(error)) => {
            return Err(error).context("collect WLAN profiles");
        }
    };
    summary.records = collection.rows.len();
    summary.field_errors = collection.failures.len();
    if collection.rows.is_empty() {
        info!(table = WLAN_PROFILE_TABLE, "No WLAN profiles found");
        return Ok(summary);
    }

    let schema = walker
        .schema(&collection)
        .context("build WLAN profile schema")?;
    debug!(table = WLAN_PROFILE_TABLE, columns = schema.len(), "Discovered profile schema");
    match output.write_table(&schema, &collection.rows) {
        Ok(stats) => record_stats(&mut summary, stats),
        Err(error) => {
            error!(table = WLAN_PROFILE_TABLE, error = %error, "Writing WLAN profiles failed");
            summary.error = Some(error.to_string());
        }
    }
    info!(
        table = WLAN_PROFILE_TABLE,
        profiles = summary.records,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        duration_ms = started.elapsed().as_millis(),
        "Registry stage complete"
    );
    Ok(summary)
}

fn record_stats(summary: &mut TableSummary, stats: WriteStats) {
    summary.inserted = stats.inserted;
    summary.duplicates = stats.duplicates;
    summary.failed = stats.failed;
}
