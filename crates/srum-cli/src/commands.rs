use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use comfy_table::{CellAlignment, Table};
use tracing::{error, info, info_span};

use srum_cli::pipeline::{DecodeConfig, convert_registry, convert_tabular};
use srum_cli::types::ConvertResult;
use srum_decode::{RuleSet, TableNameResolver, TypeMap};
use srum_ingest::{load_database_snapshot, load_hive_snapshot};
use srum_model::CanonicalType;
use srum_output::{OutputOptions, SqliteOutput};

use crate::cli::ConvertArgs;
use crate::summary::{align_column, apply_table_style, header_cell};

pub fn run_rules() -> Result<()> {
    let ese = TypeMap::ese().context("build ESE type map")?;
    let registry = TypeMap::registry().context("build registry type map")?;
    let srum_rules = RuleSet::srum_defaults().context("build SRUM rules")?;
    let wlan_rules = RuleSet::wlan_defaults().context("build WLAN rules")?;

    let mut types = Table::new();
    types.set_header(vec![
        header_cell("Canonical"),
        header_cell("ESE column types"),
        header_cell("Registry value types"),
    ]);
    apply_table_style(&mut types);
    for canonical in CanonicalType::ALL {
        types.add_row(vec![
            canonical.to_string(),
            join_natives(&ese, canonical),
            join_natives(&registry, canonical),
        ]);
    }
    println!("Type maps:");
    println!("{types}");

    let mut aliases = Table::new();
    aliases.set_header(vec![header_cell("Source table"), header_cell("Destination")]);
    apply_table_style(&mut aliases);
    for (source, destination) in TableNameResolver::default().aliases() {
        aliases.add_row(vec![source, destination]);
    }
    println!();
    println!("Table aliases:");
    println!("{aliases}");

    let mut rules = Table::new();
    rules.set_header(vec![
        header_cell("Source"),
        header_cell("Scope"),
        header_cell("Column"),
        header_cell("Strategy"),
    ]);
    apply_table_style(&mut rules);
    align_column(&mut rules, 1, CellAlignment::Center);
    for (source, set) in [("SRUM", &srum_rules), ("WLAN", &wlan_rules)] {
        for rule in set.rules() {
            rules.add_row(vec![
                source.to_string(),
                rule.scope.to_string(),
                rule.column.clone(),
                rule.strategy.to_string(),
            ]);
        }
    }
    println!();
    println!("Decode rules:");
    println!("{rules}");
    Ok(())
}

fn join_natives(map: &TypeMap, canonical: CanonicalType) -> String {
    let natives: Vec<String> = map.natives(canonical).map(|native| native.to_string()).collect();
    if natives.is_empty() {
        "-".to_string()
    } else {
        natives.join(", ")
    }
}

pub fn run_convert(args: &ConvertArgs) -> Result<ConvertResult> {
    let span = info_span!("convert", srum_db = %args.srum_db.display());
    let _guard = span.enter();
    let started = Instant::now();

    // Configuration is validated before the output is touched.
    let ese_map = TypeMap::ese().context("build ESE type map")?;
    let srum_rules = RuleSet::srum_defaults().context("build SRUM rules")?;
    let resolver = args
        .aliases
        .iter()
        .fold(TableNameResolver::default(), |resolver, (source, destination)| {
            resolver.with_alias(source.as_str(), destination.as_str())
        });

    let database = load_database_snapshot(&args.srum_db)
        .with_context(|| format!("load SRUM database {}", args.srum_db.display()))?;
    let options = OutputOptions {
        busy_timeout: Duration::from_secs(args.busy_timeout_secs),
        overwrite: !args.keep_existing,
    };
    let mut output = SqliteOutput::open(&args.output_db, &options)
        .with_context(|| format!("open output database {}", args.output_db.display()))?;

    let mut result = ConvertResult {
        output_db: args.output_db.clone(),
        ..ConvertResult::default()
    };
    let summaries = convert_tabular(
        &database,
        &mut output,
        &resolver,
        DecodeConfig::new(&ese_map, &srum_rules),
    )?;
    for summary in summaries {
        result.push_table(summary);
    }

    if let Some(hive_path) = &args.software_hive {
        if hive_path.exists() {
            let registry_map = TypeMap::registry().context("build registry type map")?;
            let wlan_rules = RuleSet::wlan_defaults().context("build WLAN rules")?;
            let hive = load_hive_snapshot(hive_path)
                .with_context(|| format!("load SOFTWARE hive {}", hive_path.display()))?;
            let summary = convert_registry(
                &hive,
                &mut output,
                DecodeConfig::new(&registry_map, &wlan_rules),
            )?;
            result.push_table(summary);
        } else {
            error!(path = %hive_path.display(), "SOFTWARE hive not found, skipping WLAN profiles");
        }
    }

    info!(
        tables = result.tables.len(),
        errors = result.errors.len(),
        duration_ms = started.elapsed().as_millis(),
        "Conversion complete"
    );
    Ok(result)
}
