// Table loading with the tracker's tolerance rules: a missing file is an
// empty table, a broken or empty upload is an empty table plus a warning.
// Nothing here ever aborts the session.
use crate::table::DataTable;
use crate::xlsx;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub table: DataTable,
    pub warnings: Vec<String>,
    /// The file was simply absent; distinct from a parse failure so the
    /// front end can show an informational note instead of a warning.
    pub missing_file: bool,
}

impl LoadOutcome {
    fn missing() -> LoadOutcome {
        LoadOutcome {
            missing_file: true,
            ..LoadOutcome::default()
        }
    }

    fn failed(message: String) -> LoadOutcome {
        LoadOutcome {
            warnings: vec![message],
            ..LoadOutcome::default()
        }
    }

    pub fn rows_loaded(&self) -> usize {
        self.table.row_count()
    }
}

/// Load a table from `path`, dispatching on the extension: `.xlsx` goes
/// through the spreadsheet reader (first sheet only), everything else is
/// treated as delimited text.
pub fn load_table(path: &str) -> LoadOutcome {
    if !Path::new(path).exists() {
        return LoadOutcome::missing();
    }
    let parsed = if is_spreadsheet(path) {
        xlsx::read_first_sheet_path(path)
    } else {
        DataTable::from_csv_path(path)
    };
    match parsed {
        Ok(table) if table.is_empty() => {
            LoadOutcome::failed(format!("{} is empty; starting with an empty table", path))
        }
        Ok(table) => LoadOutcome {
            table,
            ..LoadOutcome::default()
        },
        Err(e) => LoadOutcome::failed(format!("could not parse {}: {}", path, e)),
    }
}

fn is_spreadsheet(path: &str) -> bool {
    Path::new(path)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false)
}
