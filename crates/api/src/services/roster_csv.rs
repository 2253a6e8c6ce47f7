//! CSV front-end for roster imports.
//!
//! Expected columns: `name,email,affiliation,phone` (only `email` is required,
//! `college` is accepted for `affiliation`). Headers are trimmed and matched
//! case-insensitively.

use csv::{ByteRecord, ReaderBuilder, Trim};
use domain::models::roster::MAX_ROSTER_IMPORT_RECORDS;
use domain::models::RosterRecord;
use thiserror::Error;

const UTF8_BOM: &str = "\u{feff}";

/// Line number of the first data row; line 1 is the header.
pub const FIRST_DATA_ROW: usize = 2;

/// Failures that reject a whole upload.
#[derive(Debug, Error)]
pub enum RosterCsvError {
    #[error("CSV file is empty")]
    Empty,

    #[error("CSV header is unreadable: {0}")]
    Header(String),

    #[error("CSV header must include an email column")]
    MissingEmailColumn,

    #[error("CSV contains more than {0} rows")]
    TooManyRows(usize),
}

/// Column positions resolved from the header row.
#[derive(Debug, Default)]
struct Columns {
    email: usize,
    name: Option<usize>,
    affiliation: Option<usize>,
    phone: Option<usize>,
}

impl Columns {
    fn resolve(headers: &ByteRecord) -> Result<Self, RosterCsvError> {
        let mut email = None;
        let mut columns = Columns::default();

        for (index, raw) in headers.iter().enumerate() {
            let header = std::str::from_utf8(raw)
                .map_err(|e| RosterCsvError::Header(e.to_string()))?
                .trim_start_matches(UTF8_BOM)
                .trim()
                .to_ascii_lowercase();
            match header.as_str() {
                "email" => email = email.or(Some(index)),
                "name" => columns.name = columns.name.or(Some(index)),
                "affiliation" | "college" => {
                    columns.affiliation = columns.affiliation.or(Some(index))
                }
                "phone" => columns.phone = columns.phone.or(Some(index)),
                _ => {}
            }
        }

        columns.email = email.ok_or(RosterCsvError::MissingEmailColumn)?;
        Ok(columns)
    }

    fn record(&self, row: &ByteRecord) -> Result<RosterRecord, String> {
        let field = |index: Option<usize>| -> Result<Option<String>, String> {
            match index.and_then(|i| row.get(i)) {
                Some(bytes) => std::str::from_utf8(bytes)
                    .map(|s| Some(s.to_string()))
                    .map_err(|_| "Row is not valid UTF-8".to_string()),
                None => Ok(None),
            }
        };

        Ok(RosterRecord {
            email: field(Some(self.email))?,
            name: field(self.name)?,
            affiliation: field(self.affiliation)?,
            phone: field(self.phone)?,
        })
    }
}

/// Parses an uploaded roster CSV into raw rows.
///
/// Each data row yields either a record or the reason it could not be read;
/// row failures are left for the import to count.
pub fn parse_roster_csv(bytes: &[u8]) -> Result<Vec<Result<RosterRecord, String>>, RosterCsvError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = reader
        .byte_headers()
        .map_err(|e| RosterCsvError::Header(e.to_string()))?
        .clone();
    if headers.is_empty() {
        return Err(RosterCsvError::Empty);
    }
    let columns = Columns::resolve(&headers)?;

    let mut rows = Vec::new();
    for result in reader.byte_records() {
        if rows.len() == MAX_ROSTER_IMPORT_RECORDS {
            return Err(RosterCsvError::TooManyRows(MAX_ROSTER_IMPORT_RECORDS));
        }
        rows.push(
            result
                .map_err(|e| e.to_string())
                .and_then(|row| columns.record(&row)),
        );
    }

    Ok(rows)
}
