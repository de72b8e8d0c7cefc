use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use tabulax_model::{
    ExecutionReport, FailureKind, JoinResult, Provenance, RowFailure, Transformation,
};

/// Failure rows shown before the table is truncated.
const MAX_FAILURE_ROWS: usize = 50;

pub fn print_learned(record: &Transformation) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Value")]);
    apply_table_style(&mut table);
    table.add_row(vec![Cell::new("Name"), Cell::new(&record.name)]);
    table.add_row(vec![Cell::new("Id"), dim_cell(&record.id)]);
    table.add_row(vec![
        Cell::new("Category"),
        Cell::new(record.category)
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
    ]);
    match (&record.code, &record.description) {
        (Some(code), _) => table.add_row(vec![Cell::new("Code"), Cell::new(code)]),
        (None, Some(description)) => {
            table.add_row(vec![Cell::new("Description"), Cell::new(description)])
        }
        (None, None) => table.add_row(vec![Cell::new("Description"), dim_cell("-")]),
    };
    table.add_row(vec![
        Cell::new("Examples"),
        Cell::new(record.source_examples.len()),
    ]);
    eprintln!("{table}");
}

pub fn print_report(report: &ExecutionReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rows"),
        header_cell("Program"),
        header_cell("Examples"),
        header_cell("Resolver"),
        header_cell("Failed"),
        header_cell("Cancelled"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let from_examples = report.count_provenance(Provenance::ExampleExact)
        + report.count_provenance(Provenance::ExampleCaseInsensitive);
    table.add_row(vec![
        Cell::new(report.outcomes.len()).add_attribute(Attribute::Bold),
        count_cell(report.count_provenance(Provenance::Program), Color::Green),
        count_cell(from_examples, Color::Green),
        count_cell(report.count_provenance(Provenance::Resolver), Color::Green),
        count_cell(report.failed(), Color::Red),
        count_cell(report.cancelled(), Color::Yellow),
    ]);
    eprintln!("{table}");
    print_failure_table(&report.failures);
}

fn print_failure_table(failures: &[RowFailure]) {
    if failures.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row"),
        header_cell("Kind"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for failure in failures.iter().take(MAX_FAILURE_ROWS) {
        table.add_row(vec![
            Cell::new(failure.row_index),
            kind_cell(failure.kind),
            Cell::new(&failure.reason),
        ]);
    }
    eprintln!("{table}");
    if failures.len() > MAX_FAILURE_ROWS {
        eprintln!("... {} more failed rows", failures.len() - MAX_FAILURE_ROWS);
    }
}

pub fn print_join(result: &JoinResult) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Matched"),
        header_cell("Exact"),
        header_cell("Unmatched"),
        header_cell("Cancelled"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let exact = result.matches.iter().filter(|m| m.distance == 0.0).count();
    table.add_row(vec![
        count_cell(result.matches.len(), Color::Green),
        count_cell(exact, Color::Green),
        count_cell(result.unmatched.len(), Color::Yellow),
        count_cell(result.cancelled.len(), Color::Yellow),
    ]);
    eprintln!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    if table.column_count() == 3 {
        table.set_constraints(vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
            ColumnConstraint::UpperBoundary(Width::Fixed(16)),
            ColumnConstraint::UpperBoundary(Width::Percentage(70)),
        ]);
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn kind_cell(kind: FailureKind) -> Cell {
    let color = match kind {
        FailureKind::MissingInput => Color::Yellow,
        FailureKind::Program | FailureKind::Resolver => Color::Red,
    };
    Cell::new(kind.as_str()).fg(color)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
