// In-memory table model.
//
// Every flat file the tracker touches (activities, automations, servers,
// ME hours) becomes a `DataTable`: an ordered header row plus string cells.
// Cells stay strings until an aggregation asks for a typed view; the empty
// string is the missing-value sentinel throughout.
use csv::ReaderBuilder;
use std::error::Error;
use std::io::Read;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn new() -> DataTable {
        DataTable::default()
    }

    pub fn with_columns<I, S>(columns: I) -> DataTable
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DataTable {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// A table with neither columns nor rows, i.e. nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// Set one cell. Returns `false` when the row or column does not exist.
    pub fn set_cell(&mut self, row: usize, column: &str, value: &str) -> bool {
        let Some(col) = self.column_index(column) else {
            return false;
        };
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Append a row, padding or truncating it to the current width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn push_empty_row(&mut self) {
        self.rows.push(vec![String::new(); self.columns.len()]);
    }

    /// Add a column filled with `fill` for every existing row. No-op when a
    /// column with that name already exists.
    pub fn add_column(&mut self, name: &str, fill: &str) {
        if self.has_column(name) {
            return;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(fill.to_string());
        }
    }

    pub fn drop_column(&mut self, name: &str) {
        let Some(col) = self.column_index(name) else {
            return;
        };
        self.columns.remove(col);
        for row in &mut self.rows {
            if col < row.len() {
                row.remove(col);
            }
        }
    }

    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let col = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(col).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Read a delimited table from any reader. The header row defines the
    /// column names; short and long records are padded/truncated to match.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<DataTable, Box<dyn Error>> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut table = DataTable::with_columns(columns);
        for result in rdr.records() {
            let record = result?;
            table.push_row(record.iter().map(str::to_string).collect());
        }
        Ok(table)
    }

    pub fn from_csv_path(path: &str) -> Result<DataTable, Box<dyn Error>> {
        let file = std::fs::File::open(path)?;
        DataTable::from_csv_reader(file)
    }
}
