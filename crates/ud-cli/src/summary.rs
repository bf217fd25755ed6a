use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use ud_cli::types::{HeaderRow, RunResult};
use ud_output::{FileReport, FileStatus};

pub fn print_summary(result: &RunResult) {
    if !result.extraction_name.is_empty() {
        println!("Extraction: {}", result.extraction_name);
    }
    println!("Sources: {}", result.source_dir.display());
    println!("Output: {}", result.output_dir.display());
    if let Some(path) = &result.report {
        println!("Conversion report: {}", path.display());
    }
    if result.dry_run {
        println!("Dry run: no documents written");
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Rows"),
        header_cell("Records"),
        header_cell("Dropped"),
        header_cell("Documents"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 5, CellAlignment::Center);

    let mut totals = (0usize, 0usize, 0usize, 0usize);
    for file in &result.files {
        totals.0 += file.rows_read;
        totals.1 += file.records_emitted;
        totals.2 += file.dropped.len();
        totals.3 += file.documents_written();
        table.add_row(vec![
            Cell::new(file_label(file)),
            Cell::new(file.rows_read),
            Cell::new(file.records_emitted),
            count_cell(file.dropped.len(), Color::Yellow),
            Cell::new(file.documents_written()),
            status_cell(file.status),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(totals.0).add_attribute(Attribute::Bold),
        Cell::new(totals.1).add_attribute(Attribute::Bold),
        count_cell(totals.2, Color::Yellow).add_attribute(Attribute::Bold),
        Cell::new(totals.3).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");

    let failures: Vec<&FileReport> = result.failed_files().collect();
    if !failures.is_empty() {
        eprintln!("Errors:");
        for file in failures {
            let reason = file.error.as_deref().unwrap_or("unknown error");
            eprintln!("- {}: {reason}", file_label(file));
        }
    }
}

pub fn print_headers(rows: &[HeaderRow]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Header"),
        header_cell("Canonical"),
        header_cell("Negative"),
        header_cell("Function"),
        header_cell("Role"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    let mut unmatched = 0usize;
    for row in rows {
        let canonical = match &row.canonical {
            Some(name) if row.coordinates => Cell::new(format!("{name} (coordinate)")),
            Some(name) => Cell::new(name).fg(Color::Green),
            None => {
                unmatched += 1;
                Cell::new("unmatched").fg(Color::Yellow)
            }
        };
        table.add_row(vec![
            Cell::new(row.position + 1),
            Cell::new(&row.header),
            canonical,
            optional_cell(row.negative.as_deref()),
            optional_cell(row.function.as_deref()),
            optional_cell(row.period_role),
        ]);
    }
    println!("{table}");
    println!(
        "{} of {} header cells mapped",
        rows.len() - unmatched,
        rows.len()
    );
}

fn file_label(file: &FileReport) -> String {
    file.source.file_name().map_or_else(
        || file.source.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn status_cell(status: FileStatus) -> Cell {
    let cell = Cell::new(status.as_str());
    match status {
        FileStatus::Converted => cell.fg(Color::Green),
        FileStatus::AllDropped => cell.fg(Color::Yellow).add_attribute(Attribute::Bold),
        FileStatus::Failed => cell.fg(Color::Red).add_attribute(Attribute::Bold),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
