// Session context.
//
// One `Session` owns the four in-memory tables and their canonical file
// paths. Every page operates on this context; nothing is process-global.
// Edits only become visible on disk after an explicit `save`, which
// overwrites the canonical file (last writer wins).
use crate::loader::{load_table, LoadOutcome};
use crate::normalize::{
    normalize, TableSchema, ACTIVITIES_SCHEMA, ME_HOURS_SCHEMA, OPEN_SCHEMA,
};
use crate::output::save_table;
use crate::table::DataTable;
use std::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Activities,
    Automations,
    Servers,
    MeHours,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Activities,
        TableKind::Automations,
        TableKind::Servers,
        TableKind::MeHours,
    ];

    pub fn default_path(self) -> &'static str {
        match self {
            TableKind::Activities => "activities.csv",
            TableKind::Automations => "automations.csv",
            TableKind::Servers => "servers.csv",
            TableKind::MeHours => "me_hours.csv",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            TableKind::Activities => "Upcoming Activities",
            TableKind::Automations => "Automation Details",
            TableKind::Servers => "Server List",
            TableKind::MeHours => "ME Hours",
        }
    }

    pub fn schema(self) -> &'static TableSchema {
        match self {
            TableKind::Activities => &ACTIVITIES_SCHEMA,
            TableKind::MeHours => &ME_HOURS_SCHEMA,
            TableKind::Automations | TableKind::Servers => &OPEN_SCHEMA,
        }
    }

    fn index(self) -> usize {
        match self {
            TableKind::Activities => 0,
            TableKind::Automations => 1,
            TableKind::Servers => 2,
            TableKind::MeHours => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableSlot {
    pub path: String,
    pub table: DataTable,
    pub loaded: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    slots: [TableSlot; 4],
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Session {
        Session {
            slots: TableKind::ALL.map(|kind| TableSlot {
                path: kind.default_path().to_string(),
                table: DataTable::new(),
                loaded: false,
            }),
        }
    }

    /// A session whose canonical files live under `dir` instead of the
    /// working directory.
    pub fn with_base_dir(dir: &std::path::Path) -> Session {
        Session {
            slots: TableKind::ALL.map(|kind| TableSlot {
                path: dir.join(kind.default_path()).to_string_lossy().into_owned(),
                table: DataTable::new(),
                loaded: false,
            }),
        }
    }

    pub fn table(&self, kind: TableKind) -> &DataTable {
        &self.slots[kind.index()].table
    }

    pub fn path(&self, kind: TableKind) -> &str {
        &self.slots[kind.index()].path
    }

    /// Load the canonical file on first access. Returns the load outcome
    /// for diagnostics, or `None` when the table was already in memory.
    pub fn ensure_loaded(&mut self, kind: TableKind) -> Option<LoadOutcome> {
        if self.slots[kind.index()].loaded {
            return None;
        }
        let outcome = load_table(self.path(kind));
        let slot = &mut self.slots[kind.index()];
        slot.table = normalize(&outcome.table, kind.schema());
        slot.loaded = true;
        Some(outcome)
    }

    /// Replace a table with an edited copy. Normalization runs again so
    /// derived columns (Month, totals) are recomputed after every edit.
    pub fn replace(&mut self, kind: TableKind, table: DataTable) {
        let slot = &mut self.slots[kind.index()];
        slot.table = normalize(&table, kind.schema());
        slot.loaded = true;
    }

    /// Replace a table from an uploaded file. The canonical path is
    /// unchanged; the upload only lives on disk once the user saves.
    pub fn import(&mut self, kind: TableKind, path: &str) -> LoadOutcome {
        let outcome = load_table(path);
        // A missing or broken upload must not wipe the current table.
        if !outcome.missing_file && outcome.warnings.is_empty() {
            self.replace(kind, outcome.table.clone());
        }
        outcome
    }

    /// Persist a table to its canonical file, derived columns stripped.
    pub fn save(&self, kind: TableKind) -> Result<(), Box<dyn Error>> {
        let slot = &self.slots[kind.index()];
        save_table(&slot.path, &slot.table, &kind.schema().derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::columns::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tracker_session_{}_{}",
            std::process::id(),
            name
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn first_access_loads_and_normalizes_the_canonical_file() {
        let dir = temp_dir("load");
        fs::write(
            dir.join("activities.csv"),
            "Activity Name,Scheduled Date,Status\npatch,2025-04-12,Planned\n",
        )
        .unwrap();
        let mut session = Session::with_base_dir(&dir);

        let outcome = session.ensure_loaded(TableKind::Activities).unwrap();
        assert_eq!(outcome.rows_loaded(), 1);
        assert_eq!(
            session.table(TableKind::Activities).cell(0, MONTH),
            Some("April 2025")
        );
        // Second access keeps the in-memory table.
        assert!(session.ensure_loaded(TableKind::Activities).is_none());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_canonical_file_yields_an_editable_empty_table() {
        let dir = temp_dir("missing");
        let mut session = Session::with_base_dir(&dir);
        let outcome = session.ensure_loaded(TableKind::MeHours).unwrap();
        assert!(outcome.missing_file);
        // Normalization still provides the numeric schema columns so the
        // grid has headers to edit into.
        assert!(session.table(TableKind::MeHours).has_column("Resource 1 Hours"));
        assert_eq!(session.table(TableKind::MeHours).row_count(), 0);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn replace_recomputes_derived_columns_after_edits() {
        let dir = temp_dir("replace");
        let mut session = Session::with_base_dir(&dir);
        session.ensure_loaded(TableKind::MeHours);

        let mut edited = session.table(TableKind::MeHours).clone();
        edited.add_column(ME_MONTH, "");
        edited.add_column("Resource 1", "");
        edited.push_row(Vec::new());
        edited.set_cell(0, ME_MONTH, "2025-02-01");
        edited.set_cell(0, "Resource 1", "Alice");
        edited.set_cell(0, "Resource 1 Hours", "7");
        session.replace(TableKind::MeHours, edited);

        let table = session.table(TableKind::MeHours);
        assert_eq!(table.cell(0, TOTAL_ME_HOURS), Some("7"));
        assert_eq!(table.cell(0, MONTH), Some("February 2025"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn failed_import_keeps_the_current_table() {
        let dir = temp_dir("import");
        fs::write(dir.join("servers.csv"), "Server,Environment\nsrv01,prod\n").unwrap();
        fs::write(dir.join("upload.csv"), "").unwrap();
        let mut session = Session::with_base_dir(&dir);
        session.ensure_loaded(TableKind::Servers);

        let outcome = session.import(TableKind::Servers, dir.join("upload.csv").to_str().unwrap());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(session.table(TableKind::Servers).cell(0, "Server"), Some("srv01"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn save_then_reload_preserves_the_edited_table() {
        let dir = temp_dir("save");
        let mut session = Session::with_base_dir(&dir);
        session.ensure_loaded(TableKind::Activities);

        let mut edited = session.table(TableKind::Activities).clone();
        edited.add_column(ACTIVITY_NAME, "");
        edited.add_column(SCHEDULED_DATE, "");
        edited.push_row(Vec::new());
        edited.set_cell(0, ACTIVITY_NAME, "patch run");
        edited.set_cell(0, SCHEDULED_DATE, "2025-06-15");
        session.replace(TableKind::Activities, edited);
        session.save(TableKind::Activities).unwrap();

        let mut fresh = Session::with_base_dir(&dir);
        fresh.ensure_loaded(TableKind::Activities);
        assert_eq!(fresh.table(TableKind::Activities), session.table(TableKind::Activities));
        fs::remove_dir_all(&dir).ok();
    }
}
