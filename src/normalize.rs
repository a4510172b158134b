// Schema normalization.
//
// A loaded table is only a bag of strings; this pass makes it fit the shape
// the rest of the dashboard expects. Missing numeric columns appear filled
// with zero, date cells are rewritten to canonical ISO form (bad cells
// become the empty sentinel, never an error), the Month label is derived
// from the primary date column, and derived totals are recomputed. The pass
// is pure: it works on a copy and never touches the caller's table.
use crate::table::DataTable;
use crate::types::Month;
use crate::util::{parse_date_safe, parse_f64_safe};
use once_cell::sync::Lazy;

pub mod columns {
    pub const ACTIVITY_NAME: &str = "Activity Name";
    pub const SCHEDULED_DATE: &str = "Scheduled Date";
    pub const STATUS: &str = "Status";
    pub const ESTIMATED_HOURS: &str = "Estimated Hours";
    pub const ACTUAL_HOURS: &str = "Actual Hours";
    pub const TECHNICAL_RESOURCE: &str = "Technical Resource";
    pub const TECHNICAL_TIME: &str = "Technical Time";
    pub const FUNCTIONAL_RESOURCE: &str = "Functional Resource";
    pub const FUNCTIONAL_TIME: &str = "Functional Time";
    pub const IMPLEMENTED_SERVERS: &str = "Implemented Servers";
    pub const MONTH: &str = "Month";
    pub const ME_MONTH: &str = "ME Month";
    pub const TOTAL_ME_HOURS: &str = "Total ME Hours";

    /// The three ME resource/hour column pairs.
    pub const RESOURCE_SLOTS: [(&str, &str); 3] = [
        ("Resource 1", "Resource 1 Hours"),
        ("Resource 2", "Resource 2 Hours"),
        ("Resource 3", "Resource 3 Hours"),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Date,
    Text,
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Default for a missing column. Numeric columns are always created
    /// zero-filled; text columns are only fabricated when a default is
    /// given here (just "Implemented Servers"), dates never are.
    pub fill: Option<&'static str>,
}

impl ColumnSpec {
    fn numeric(name: &'static str) -> ColumnSpec {
        ColumnSpec {
            name,
            kind: ColumnKind::Numeric,
            fill: Some("0"),
        }
    }

    fn date(name: &'static str) -> ColumnSpec {
        ColumnSpec {
            name,
            kind: ColumnKind::Date,
            fill: None,
        }
    }

    fn text(name: &'static str) -> ColumnSpec {
        ColumnSpec {
            name,
            kind: ColumnKind::Text,
            fill: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TotalSpec {
    pub name: &'static str,
    pub parts: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    pub columns: Vec<ColumnSpec>,
    /// Primary date column the Month label derives from. When the column is
    /// absent from the table the month step is skipped entirely.
    pub date_column: Option<&'static str>,
    pub total: Option<TotalSpec>,
    /// Columns recomputed by this pass; stripped before persistence.
    pub derived: Vec<&'static str>,
}

pub static ACTIVITIES_SCHEMA: Lazy<TableSchema> = Lazy::new(|| TableSchema {
    columns: vec![
        ColumnSpec::text(columns::ACTIVITY_NAME),
        ColumnSpec::date(columns::SCHEDULED_DATE),
        ColumnSpec::text(columns::STATUS),
        ColumnSpec::numeric(columns::ESTIMATED_HOURS),
        ColumnSpec::numeric(columns::ACTUAL_HOURS),
        ColumnSpec::text(columns::TECHNICAL_RESOURCE),
        ColumnSpec::numeric(columns::TECHNICAL_TIME),
        ColumnSpec::text(columns::FUNCTIONAL_RESOURCE),
        ColumnSpec::numeric(columns::FUNCTIONAL_TIME),
        ColumnSpec {
            name: columns::IMPLEMENTED_SERVERS,
            kind: ColumnKind::Text,
            fill: Some(""),
        },
    ],
    date_column: Some(columns::SCHEDULED_DATE),
    total: None,
    derived: vec![columns::MONTH],
});

pub static ME_HOURS_SCHEMA: Lazy<TableSchema> = Lazy::new(|| {
    let mut cols = vec![ColumnSpec::date(columns::ME_MONTH)];
    for (resource, hours) in columns::RESOURCE_SLOTS {
        cols.push(ColumnSpec::text(resource));
        cols.push(ColumnSpec::numeric(hours));
    }
    TableSchema {
        columns: cols,
        date_column: Some(columns::ME_MONTH),
        total: Some(TotalSpec {
            name: columns::TOTAL_ME_HOURS,
            parts: columns::RESOURCE_SLOTS.iter().map(|(_, h)| *h).collect(),
        }),
        derived: vec![columns::MONTH, columns::TOTAL_ME_HOURS],
    }
});

/// Automations and servers carry whatever columns they were uploaded with.
pub static OPEN_SCHEMA: Lazy<TableSchema> = Lazy::new(|| TableSchema {
    columns: Vec::new(),
    date_column: None,
    total: None,
    derived: Vec::new(),
});

/// Normalize `table` against `schema`, returning the adjusted copy.
pub fn normalize(table: &DataTable, schema: &TableSchema) -> DataTable {
    let mut out = table.clone();

    for spec in &schema.columns {
        match spec.kind {
            ColumnKind::Numeric => out.add_column(spec.name, spec.fill.unwrap_or("0")),
            ColumnKind::Text => {
                if let Some(fill) = spec.fill {
                    out.add_column(spec.name, fill);
                }
            }
            ColumnKind::Date => canonicalize_dates(&mut out, spec.name),
        }
    }

    if let Some(date_column) = schema.date_column {
        derive_month(&mut out, date_column);
    }

    if let Some(total) = &schema.total {
        recompute_total(&mut out, total);
    }

    out
}

/// Rewrite every cell of a date column to `YYYY-MM-DD`, or to the empty
/// sentinel when the cell does not parse. Absent columns are left absent.
fn canonicalize_dates(table: &mut DataTable, column: &str) {
    if !table.has_column(column) {
        return;
    }
    for row in 0..table.row_count() {
        let canonical = parse_date_safe(table.cell(row, column))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        table.set_cell(row, column, &canonical);
    }
}

/// (Re)compute the Month label from the primary date column. Skipped when
/// the date column is absent; rows whose date does not parse get an empty
/// label and drop out of month-based views without being deleted.
fn derive_month(table: &mut DataTable, date_column: &str) {
    if !table.has_column(date_column) {
        return;
    }
    table.add_column(columns::MONTH, "");
    for row in 0..table.row_count() {
        let label = parse_date_safe(table.cell(row, date_column))
            .map(|d| Month::from_date(d).label())
            .unwrap_or_default();
        table.set_cell(row, columns::MONTH, &label);
    }
}

/// Recompute a derived total as the arithmetic sum of its parts. The parts
/// are numeric schema columns, so they exist (zero-filled) by the time this
/// runs; unparseable cells count as zero.
fn recompute_total(table: &mut DataTable, total: &TotalSpec) {
    table.add_column(total.name, "0");
    for row in 0..table.row_count() {
        let sum: f64 = total
            .parts
            .iter()
            .map(|part| parse_f64_safe(table.cell(row, part)).unwrap_or(0.0))
            .sum();
        table.set_cell(row, total.name, &format_hours(sum));
    }
}

/// Hours render without a trailing ".0" when whole.
pub fn format_hours(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
