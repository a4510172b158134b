// Persistence and console previews.
//
// Saving is a whole-file overwrite of the canonical CSV; derived columns
// (Month, Total ME Hours) are stripped first and recomputed on reload, so
// the file only ever holds user-editable data.
use crate::table::DataTable;
use serde::Serialize;
use std::error::Error;
use tabled::{settings::Style, Table, Tabled};

/// Write `table` to `path`, dropping the `derived` columns first. The write
/// replaces prior contents; there is no temp-file-and-rename step.
pub fn save_table(path: &str, table: &DataTable, derived: &[&str]) -> Result<(), Box<dyn Error>> {
    let mut persisted = table.clone();
    for column in derived {
        persisted.drop_column(column);
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(persisted.columns())?;
    for row in persisted.rows() {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_table;
    use crate::normalize::{columns::*, normalize, ME_HOURS_SCHEMA};
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tracker_output_{}_{}", std::process::id(), name))
    }

    #[test]
    fn save_and_reload_round_trips_modulo_derived_columns() {
        let mut t = DataTable::with_columns([ME_MONTH, "Resource 1", "Resource 1 Hours"]);
        t.push_row(vec!["2025-02-01".into(), "Alice".into(), "12.5".into()]);
        let mut edited = normalize(&t, &ME_HOURS_SCHEMA);
        edited.set_cell(0, "Resource 1 Hours", "9");
        let edited = normalize(&edited, &ME_HOURS_SCHEMA);

        let path = temp_path("roundtrip.csv");
        let derived = [MONTH, TOTAL_ME_HOURS];
        save_table(path.to_str().unwrap(), &edited, &derived).unwrap();
        let reloaded = normalize(&load_table(path.to_str().unwrap()).table, &ME_HOURS_SCHEMA);
        fs::remove_file(&path).ok();

        assert_eq!(reloaded, edited);
        // The derived total came back recomputed, not persisted.
        assert_eq!(reloaded.cell(0, TOTAL_ME_HOURS), Some("9"));
    }

    #[test]
    fn saved_file_does_not_contain_derived_columns() {
        let mut t = DataTable::with_columns([ME_MONTH, "Resource 1", "Resource 1 Hours"]);
        t.push_row(vec!["2025-02-01".into(), "Alice".into(), "3".into()]);
        let normalized = normalize(&t, &ME_HOURS_SCHEMA);

        let path = temp_path("derived.csv");
        save_table(path.to_str().unwrap(), &normalized, &[MONTH, TOTAL_ME_HOURS]).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();

        let header: Vec<&str> = raw.lines().next().unwrap().split(',').collect();
        assert!(!header.contains(&MONTH));
        assert!(!header.contains(&TOTAL_ME_HOURS));
        assert!(header.contains(&"Resource 1 Hours"));
    }

    #[test]
    fn save_overwrites_prior_contents() {
        let path = temp_path("overwrite.csv");
        fs::write(&path, "Old,Header\nstale,row\n").unwrap();

        let mut t = DataTable::with_columns(["Server", "Environment"]);
        t.push_row(vec!["srv01".into(), "prod".into()]);
        save_table(path.to_str().unwrap(), &t, &[]).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();

        assert!(!raw.contains("stale"));
        assert!(raw.contains("srv01"));
    }
}
