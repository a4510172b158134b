// Presentation seam.
//
// The core never renders anything itself; it hands tables and precomputed
// chart data to a `Presenter`. The console implementation draws grids and
// charts as markdown tables and drives cell edits through a tiny command
// language. Swapping in a different front end only means implementing this
// trait.
use crate::normalize::format_hours;
use crate::table::DataTable;
use crate::types::{BarChart, Chart, CountChart, SeriesChart};
use std::io::{self, Write};
use tabled::builder::Builder;
use tabled::settings::Style;

pub trait Presenter {
    /// Render the table for interactive editing and return the edited copy.
    fn edit_table(&mut self, table: &DataTable) -> DataTable;

    /// Render a labeled categorical selector; `None` means the user
    /// cancelled.
    fn pick(&mut self, prompt: &str, options: &[String]) -> Option<usize>;

    /// Render precomputed chart data.
    fn render_chart(&mut self, chart: &Chart);

    fn info(&mut self, message: &str);
    fn warn(&mut self, message: &str);
}

/// Render a data grid with 1-based row numbers and numbered column headers
/// (the numbers double as edit-command addresses).
pub fn render_grid(table: &DataTable) -> String {
    if table.columns().is_empty() {
        return "(empty table)".to_string();
    }
    let mut builder = Builder::default();
    let mut header = vec!["#".to_string()];
    header.extend(
        table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}", i + 1, c)),
    );
    builder.push_record(header);
    for (i, row) in table.rows().iter().enumerate() {
        let mut record = vec![(i + 1).to_string()];
        record.extend(row.iter().cloned());
        builder.push_record(record);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn render_chart_text(chart: &Chart) -> String {
    match chart {
        Chart::Counts(c) => render_counts(c),
        Chart::Bars(c) => render_bars(c),
        Chart::Series(c) => render_series(c),
    }
}

fn render_counts(chart: &CountChart) -> String {
    if chart.bars.is_empty() {
        return format!("{}\n(nothing to plot)", chart.title);
    }
    let mut builder = Builder::default();
    builder.push_record(["Label", "Count"]);
    for (label, count) in &chart.bars {
        builder.push_record([label.clone(), count.to_string()]);
    }
    let body = builder.build().with(Style::markdown()).to_string();
    format!("{}\n{}", chart.title, body)
}

fn render_bars(chart: &BarChart) -> String {
    if chart.bars.is_empty() {
        return format!("{}\n(nothing to plot)", chart.title);
    }
    let mut builder = Builder::default();
    builder.push_record(["Label", "Hours"]);
    for (label, hours) in &chart.bars {
        builder.push_record([label.clone(), format_hours(*hours)]);
    }
    let body = builder.build().with(Style::markdown()).to_string();
    format!("{}\n{}", chart.title, body)
}

fn render_series(chart: &SeriesChart) -> String {
    if chart.series.is_empty() || chart.x_labels.is_empty() {
        return format!("{}\n(nothing to plot)", chart.title);
    }
    let mut builder = Builder::default();
    let mut header = vec![String::new()];
    header.extend(chart.series.iter().map(|s| s.name.clone()));
    builder.push_record(header);
    for (i, x) in chart.x_labels.iter().enumerate() {
        let mut record = vec![x.clone()];
        record.extend(
            chart
                .series
                .iter()
                .map(|s| format!("{:.2}", s.values.get(i).copied().unwrap_or(0.0))),
        );
        builder.push_record(record);
    }
    let body = builder.build().with(Style::markdown()).to_string();
    format!("{}\n{}", chart.title, body)
}

#[derive(Default)]
pub struct ConsolePresenter;

impl ConsolePresenter {
    fn read_line(prompt: &str) -> String {
        print!("{}", prompt);
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        buf.trim().to_string()
    }
}

impl Presenter for ConsolePresenter {
    fn edit_table(&mut self, table: &DataTable) -> DataTable {
        let mut edited = table.clone();
        loop {
            println!("{}\n", render_grid(&edited));
            println!("Commands: set <row> <col#> <value> | add | done");
            let line = Self::read_line("Edit: ");
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("done") | None => break,
                Some("add") => edited.push_empty_row(),
                Some("set") => {
                    let row = parts.next().and_then(|s| s.parse::<usize>().ok());
                    let column = parts.next().and_then(|s| s.parse::<usize>().ok());
                    let value = parts.collect::<Vec<_>>().join(" ");
                    match (row, column) {
                        (Some(row), Some(column)) if row >= 1 && column >= 1 => {
                            let name = edited.columns().get(column - 1).cloned();
                            let ok = name
                                .map(|name| edited.set_cell(row - 1, &name, &value))
                                .unwrap_or(false);
                            if !ok {
                                println!("No such cell.");
                            }
                        }
                        _ => println!("Usage: set <row> <col#> <value>"),
                    }
                }
                Some(_) => println!("Unknown command."),
            }
        }
        edited
    }

    fn pick(&mut self, prompt: &str, options: &[String]) -> Option<usize> {
        if options.is_empty() {
            return None;
        }
        println!("{}", prompt);
        for (i, option) in options.iter().enumerate() {
            println!("[{}] {}", i + 1, option);
        }
        loop {
            let line = Self::read_line("Enter choice (blank to cancel): ");
            if line.is_empty() {
                return None;
            }
            match line.parse::<usize>() {
                Ok(n) if n >= 1 && n <= options.len() => return Some(n - 1),
                _ => println!("Invalid choice."),
            }
        }
    }

    fn render_chart(&mut self, chart: &Chart) {
        println!("{}\n", render_chart_text(chart));
    }

    fn info(&mut self, message: &str) {
        println!("{}", message);
    }

    fn warn(&mut self, message: &str) {
        println!("Warning: {}", message);
    }
}
