use anyhow::Result;
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use pulse_model::{CellValue, NormalizedTable};
use pulse_output::{EXPORT_DECIMALS, export_cell, is_hidden_column};
use pulse_transform::Headline;

use crate::cli::RenderArg;
use crate::config::{ConfigError, Source};

/// Prints a titled report table in the requested rendering.
pub fn print_report(title: &str, table: &NormalizedTable, render: RenderArg) -> Result<()> {
    println!("{title}");
    match render {
        RenderArg::Table => println!("{}", report_table(table)),
        RenderArg::Frame => println!("{}", table.frame()),
    }
    if table.estimated_columns().next().is_some() {
        println!("* estimated, not reported by the source");
    }
    Ok(())
}

/// Terminal view of a table. Provenance columns are left out and estimated
/// columns are marked with `*`.
pub fn report_table(table: &NormalizedTable) -> Table {
    let names = table.columns();
    let rows = table.rows();
    let visible: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_hidden_column(name))
        .map(|(idx, _)| idx)
        .collect();
    let mut out = Table::new();
    out.set_header(
        visible
            .iter()
            .map(|&idx| {
                let name = &names[idx];
                if table.is_estimated(name) {
                    header_cell(&format!("{name} *"))
                } else {
                    header_cell(name)
                }
            })
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut out);
    for row in &rows {
        out.add_row(
            visible
                .iter()
                .map(|&idx| value_cell(row.get(idx).unwrap_or(&CellValue::Missing)))
                .collect::<Vec<_>>(),
        );
    }
    for (position, &idx) in visible.iter().enumerate() {
        let numeric = rows
            .iter()
            .filter_map(|row| row.get(idx))
            .any(CellValue::is_numeric);
        if numeric {
            align_column(&mut out, position, CellAlignment::Right);
        }
    }
    out
}

pub fn print_headlines(headlines: &[Headline]) {
    if headlines.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for headline in headlines {
        table.add_row(vec![
            Cell::new(headline.label),
            Cell::new(&headline.display).add_attribute(Attribute::Bold),
        ]);
    }
    println!("{table}");
}

pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

/// Per-source credential status for `config-check`.
pub fn config_status_table(results: &[(Source, Result<(), ConfigError>)]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Status"),
        header_cell("Detail"),
    ]);
    apply_status_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for (source, result) in results {
        let (status, detail) = match result {
            Ok(()) => (
                Cell::new("ok").fg(Color::Green).add_attribute(Attribute::Bold),
                dim_cell("-"),
            ),
            Err(error) => (
                Cell::new("missing")
                    .fg(Color::Red)
                    .add_attribute(Attribute::Bold),
                Cell::new(error.to_string()),
            ),
        };
        table.add_row(vec![Cell::new(source.label()), status, detail]);
    }
    table
}

fn value_cell(value: &CellValue) -> Cell {
    match value {
        CellValue::Missing => dim_cell("-"),
        other => Cell::new(export_cell(other, EXPORT_DECIMALS)),
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn apply_status_table_style(table: &mut Table) {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NormalizedTable {
        let mut table = NormalizedTable::from_rows(
            ["Page", "Views", "_source_files"],
            vec![
                vec![
                    CellValue::text("/home"),
                    CellValue::Number(12.345),
                    CellValue::text("a.csv"),
                ],
                vec![CellValue::text("/about"), CellValue::Missing, CellValue::text("b.csv")],
            ],
        )
        .unwrap();
        table.mark_estimated("Views");
        table
    }

    #[test]
    fn report_table_hides_provenance_and_marks_estimates() {
        let rendered = report_table(&sample()).to_string();
        assert!(rendered.contains("Views *"));
        assert!(rendered.contains("12.35"));
        assert!(!rendered.contains("_source_files"));
        assert!(!rendered.contains("a.csv"));
    }

    #[test]
    fn status_table_lists_missing_keys() {
        let results = vec![
            (Source::Ga4, Ok(())),
            (
                Source::Youtube,
                Err(ConfigError::Missing {
                    key: "youtube.api_key",
                    env_var: "YOUTUBE_API_KEY",
                }),
            ),
        ];
        let rendered = config_status_table(&results).to_string();
        assert!(rendered.contains("Google Analytics 4"));
        assert!(rendered.contains("YOUTUBE_API_KEY"));
    }
}
