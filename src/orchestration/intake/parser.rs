//! Parsing of delimited course lists.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const COURSE_ID_HEADERS: [&str; 2] = ["courseid", "course_id"];
const COURSE_URL_HEADERS: [&str; 3] = ["url", "courseurl", "course_url"];
const CATEGORY_HEADERS: [&str; 4] = [
    "categoryid",
    "category_id",
    "destinationcategoryid",
    "destination_category_id",
];

/// Field separator of an intake file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeDelimiter {
    /// `,`
    #[default]
    Comma,
    /// `;`
    Semicolon,
    /// Horizontal tab.
    Tab,
    /// `:`
    Colon,
}

impl IntakeDelimiter {
    /// Returns the separator character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Semicolon => ';',
            Self::Tab => '\t',
            Self::Colon => ':',
        }
    }
}

/// Whole-file intake errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntakeFileError {
    /// The file has no content.
    #[error("The file is empty")]
    Empty,

    /// The file has a header but no data rows.
    #[error("The file has no data rows")]
    NoDataRows,

    /// Required columns are absent from the header.
    #[error("Missing required columns: {0}")]
    MissingColumns(String),
}

/// One data row with its raw, trimmed cells. Blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeRow {
    /// One-based line number in the file.
    pub line: usize,
    /// Course identifier cell.
    pub course_id: Option<String>,
    /// Course URL cell.
    pub course_url: Option<String>,
    /// Destination category cell.
    pub category_id: Option<String>,
}

/// A parsed intake file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeFile {
    rows: Vec<IntakeRow>,
}

#[derive(Debug, Default)]
struct Columns {
    course_id: Option<usize>,
    course_url: Option<usize>,
    category_id: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[String]) -> Result<Self, IntakeFileError> {
        let mut columns = Self::default();
        for (index, cell) in cells.iter().enumerate() {
            let name = cell.trim().trim_start_matches('\u{feff}').to_ascii_lowercase();
            let slot = if COURSE_ID_HEADERS.contains(&name.as_str()) {
                &mut columns.course_id
            } else if COURSE_URL_HEADERS.contains(&name.as_str()) {
                &mut columns.course_url
            } else if CATEGORY_HEADERS.contains(&name.as_str()) {
                &mut columns.category_id
            } else {
                continue;
            };
            slot.get_or_insert(index);
        }

        let mut missing = Vec::new();
        if columns.course_id.is_none() && columns.course_url.is_none() {
            missing.push("courseid or url");
        }
        if columns.category_id.is_none() {
            missing.push("categoryid");
        }
        if missing.is_empty() {
            Ok(columns)
        } else {
            Err(IntakeFileError::MissingColumns(missing.join(", ")))
        }
    }

    fn row(&self, line: usize, cells: &[String]) -> IntakeRow {
        let cell = |column: Option<usize>| {
            column
                .and_then(|index| cells.get(index))
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };
        IntakeRow {
            line,
            course_id: cell(self.course_id),
            course_url: cell(self.course_url),
            category_id: cell(self.category_id),
        }
    }
}

impl IntakeFile {
    /// Parses delimited content whose first non-blank line is the header.
    ///
    /// Header names are matched case-insensitively. Blank lines are skipped.
    /// Fields may be wrapped in double quotes, with `""` escaping a quote; a
    /// quoted field may span lines and the row keeps the line number it
    /// starts on.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeFileError`] for empty files, files without data rows
    /// and headers missing a course column or the category column.
    pub fn parse(content: &str, delimiter: IntakeDelimiter) -> Result<Self, IntakeFileError> {
        let mut records = logical_records(content).into_iter();

        let (_, header) = records.next().ok_or(IntakeFileError::Empty)?;
        let columns = Columns::from_header(&split_record(&header, delimiter.as_char()))?;

        let rows: Vec<IntakeRow> = records
            .map(|(line, raw)| columns.row(line, &split_record(&raw, delimiter.as_char())))
            .collect();
        if rows.is_empty() {
            return Err(IntakeFileError::NoDataRows);
        }
        Ok(Self { rows })
    }

    /// Returns the data rows in file order.
    #[must_use]
    pub fn rows(&self) -> &[IntakeRow] {
        &self.rows
    }
}

/// Groups physical lines into records, joining lines while a quoted field
/// is still open. Blank lines outside quotes are dropped. Each record carries
/// the one-based number of its first line.
fn logical_records(content: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, line) in content.lines().enumerate() {
        let (start, mut record) = match pending.take() {
            Some((start, mut open)) => {
                open.push('\n');
                (start, open)
            }
            None if line.trim().is_empty() => continue,
            None => (index + 1, String::new()),
        };
        record.push_str(line);
        if has_open_quote(&record) {
            pending = Some((start, record));
        } else {
            records.push((start, record));
        }
    }
    // An unterminated quote runs to the end of the file.
    records.extend(pending);
    records
}

/// Escaped quotes come in pairs, so an odd count means a field is open.
fn has_open_quote(record: &str) -> bool {
    record
        .chars()
        .filter(|ch| *ch == '"')
        .fold(false, |open, _| !open)
}

/// Splits one record into fields, honouring double-quoted fields.
fn split_record(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ch if ch == delimiter && !in_quotes => fields.push(std::mem::take(&mut current)),
            ch => current.push(ch),
        }
    }
    fields.push(current);
    fields
}
