// Minimal .xlsx extraction: enough of the OOXML format to pull the first
// worksheet out of an upload as strings. Shared strings (`t="s"`) and inline
// strings (`t="inlineStr"`) are resolved; every other cell value is taken
// verbatim from its `<v>` element. Only the first sheet is read.
use crate::table::DataTable;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use std::error::Error;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_TEXT: QName = QName(b"t");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_VALUE: QName = QName(b"v");

pub fn read_first_sheet_path(path: &str) -> Result<DataTable, Box<dyn Error>> {
    let file = std::fs::File::open(path)?;
    read_first_sheet(file)
}

/// Read the first worksheet of an `.xlsx` archive into a `DataTable`.
/// The first spreadsheet row becomes the header row.
pub fn read_first_sheet<RS: Read + Seek>(source: RS) -> Result<DataTable, Box<dyn Error>> {
    let mut zip = ZipArchive::new(source)?;

    let shared = match member_name(&zip, "xl/sharedStrings.xml") {
        Some(name) => {
            let file = zip.by_name(&name)?;
            load_shared_strings(BufReader::new(file))?
        }
        None => Vec::new(),
    };

    let sheet_name = first_sheet_member(&zip).ok_or("workbook contains no worksheets")?;
    let sheet = zip.by_name(&sheet_name)?;
    let grid = read_sheet_rows(BufReader::new(sheet), &shared)?;

    let mut iter = grid.into_iter();
    let Some(header) = iter.next() else {
        return Ok(DataTable::new());
    };
    let mut table = DataTable::with_columns(header);
    for row in iter {
        table.push_row(row);
    }
    Ok(table)
}

/// Case-insensitive archive member lookup; xlsx writers disagree on casing.
fn member_name<RS: Read + Seek>(zip: &ZipArchive<RS>, name: &str) -> Option<String> {
    zip.file_names()
        .find(|file_name| file_name.eq_ignore_ascii_case(name))
        .map(str::to_owned)
}

fn first_sheet_member<RS: Read + Seek>(zip: &ZipArchive<RS>) -> Option<String> {
    let mut sheets: Vec<String> = zip
        .file_names()
        .filter(|name| {
            let lower = name.to_ascii_lowercase();
            lower.starts_with("xl/worksheets/sheet") && lower.ends_with(".xml")
        })
        .map(str::to_owned)
        .collect();
    sheets.sort();
    sheets.into_iter().next()
}

fn xml_reader<R: BufRead>(source: R) -> Reader<R> {
    let mut reader = Reader::from_reader(source);
    let config = reader.config_mut();
    config.check_end_names = false;
    // Empty cells arrive as `<c .../>`; expanding them keeps one code path.
    config.expand_empty_elements = true;
    reader
}

/// The shared string table: `<si>` items in index order, text accumulated
/// from their `<t>` children.
fn load_shared_strings<R: BufRead>(source: R) -> Result<Vec<String>, Box<dyn Error>> {
    let mut reader = xml_reader(source);
    let mut buf = Vec::with_capacity(1024);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) if e.name() == TAG_SHARED_STRING_ITEM => {
                in_item = true;
                current.clear();
            }
            Event::Start(e) if in_item && e.name() == TAG_TEXT => in_text = true,
            Event::Text(t) if in_text => current.push_str(&t.xml_content()?),
            Event::End(e) if e.name() == TAG_TEXT => in_text = false,
            Event::End(e) if e.name() == TAG_SHARED_STRING_ITEM => {
                strings.push(current.clone());
                in_item = false;
            }
            _ => (),
        }
        buf.clear();
    }
    Ok(strings)
}

fn read_sheet_rows<R: BufRead>(
    source: R,
    shared: &[String],
) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let mut reader = xml_reader(source);
    let mut buf = Vec::with_capacity(1024);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut col = 0usize;
    let mut is_shared = false;
    let mut capture = false;
    let mut value = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) if e.name() == TAG_ROW => row = Vec::new(),
            Event::Start(e) if e.name() == TAG_CELL => {
                // Place the cell by its `r` reference so gaps left by empty
                // cells stay empty; fall back to the next free position.
                col = e
                    .try_get_attribute("r")?
                    .and_then(|a| a.unescape_value().ok())
                    .and_then(|r| reference_column(&r))
                    .unwrap_or(row.len());
                is_shared = matches!(
                    e.try_get_attribute("t")?
                        .and_then(|a| a.unescape_value().ok()),
                    Some(t) if t == "s"
                );
                value.clear();
            }
            // `<v>` holds plain values, `<is><t>` holds inline strings;
            // capturing both into the same buffer covers either layout.
            Event::Start(e) if e.name() == TAG_VALUE || e.name() == TAG_TEXT => capture = true,
            Event::Text(t) if capture => value.push_str(&t.xml_content()?),
            Event::End(e) if e.name() == TAG_VALUE || e.name() == TAG_TEXT => capture = false,
            Event::End(e) if e.name() == TAG_CELL => {
                let resolved = if is_shared {
                    value
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared.get(i))
                        .cloned()
                        .unwrap_or_default()
                } else {
                    value.clone()
                };
                if row.len() <= col {
                    row.resize(col + 1, String::new());
                }
                row[col] = resolved;
            }
            Event::End(e) if e.name() == TAG_ROW => rows.push(std::mem::take(&mut row)),
            _ => (),
        }
        buf.clear();
    }
    Ok(rows)
}

/// Column index from an A1-style reference: "A2" -> 0, "AB7" -> 27.
fn reference_column(reference: &str) -> Option<usize> {
    let letters: String = reference
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for c in letters.chars() {
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(index - 1)
}
