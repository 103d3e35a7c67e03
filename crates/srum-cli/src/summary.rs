use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use srum_cli::types::{ConvertResult, TableSummary};

pub fn print_summary(result: &ConvertResult) {
    println!("Output: {}", result.output_db.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Source"),
        header_cell("Records"),
        header_cell("Inserted"),
        header_cell("Duplicates"),
        header_cell("Failed"),
        header_cell("Field errors"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 7, CellAlignment::Center);

    let mut totals = TableSummary::default();
    for summary in &result.tables {
        totals.records += summary.records;
        totals.inserted += summary.inserted;
        totals.duplicates += summary.duplicates;
        totals.failed += summary.failed;
        totals.field_errors += summary.field_errors;
        table.add_row(vec![
            Cell::new(&summary.destination)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            source_cell(summary),
            Cell::new(summary.records),
            Cell::new(summary.inserted),
            count_cell(summary.duplicates, Color::Yellow),
            count_cell(summary.failed, Color::Red),
            count_cell(summary.field_errors, Color::Yellow),
            status_cell(summary),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell(format!("{} tables", result.tables.len())),
        Cell::new(totals.records).add_attribute(Attribute::Bold),
        Cell::new(totals.inserted).add_attribute(Attribute::Bold),
        count_cell(totals.duplicates, Color::Yellow).add_attribute(Attribute::Bold),
        count_cell(totals.failed, Color::Red).add_attribute(Attribute::Bold),
        count_cell(totals.field_errors, Color::Yellow).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");
    if !result.errors.is_empty() {
        eprintln!("Errors:");
        for error in &result.errors {
            eprintln!("- {error}");
        }
    }
}

fn source_cell(summary: &TableSummary) -> Cell {
    if summary.source == summary.destination {
        dim_cell("-")
    } else {
        Cell::new(&summary.source).fg(Color::DarkGrey)
    }
}

fn status_cell(summary: &TableSummary) -> Cell {
    if summary.is_complete() {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("ROLLED BACK")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

pub fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
