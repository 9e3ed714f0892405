//! Spreadsheet ingestion
//!
//! Builds a field schema out of an uploaded sheet with `Field Name`,
//! `Field Type`, and `Options` columns. The row interface is the seam;
//! the built-in front end reads CSV. Binary workbook formats (xlsx, ods,
//! legacy xls) are detected by magic bytes and rejected before any text
//! decode. Text decoding tries a fixed encoding list in order: strict
//! UTF-8 (BOM tolerated), then Latin-1.

use indexmap::IndexMap;
use thiserror::Error;

use crate::schema::{ChoiceConfig, FieldConfig};

const ZIP_MAGIC: &[u8] = &[0x50, 0x4b, 0x03, 0x04];
const OLE_MAGIC: &[u8] = &[0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1];
const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];

/// Upload ingestion failures
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    /// File is not a text spreadsheet
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Header row lacks a required column
    #[error("spreadsheet is missing required column `{column}`")]
    MissingColumn {
        /// The absent column name
        column: String,
    },

    /// Choice row present but the sheet has no `Options` column
    #[error("row {row}: `{kind}` fields need an `Options` column")]
    MissingOptionsColumn {
        /// 1-based row number, header counted as row 1
        row: usize,
        /// `dropdown` or `multiselect`
        kind: String,
    },

    /// Choice row whose options cell yields nothing usable
    #[error("row {row}: no options given for `{kind}` field")]
    EmptyOptions {
        /// 1-based row number, header counted as row 1
        row: usize,
        /// `dropdown` or `multiselect`
        kind: String,
    },

    /// Field type outside {text, dropdown, multiselect, image}
    #[error("row {row}: invalid field type `{value}`")]
    InvalidFieldType {
        /// 1-based row number, header counted as row 1
        row: usize,
        /// The rejected type value
        value: String,
    },

    /// Every row was skipped or the sheet was empty
    #[error("spreadsheet contains no fields")]
    NoFields,

    /// CSV structure errors
    #[error("failed to parse spreadsheet: {0}")]
    Csv(#[from] csv::Error),
}

/// One data row of the sheet, positionally numbered
#[derive(Debug, Clone)]
pub struct SpreadsheetRow {
    /// 1-based row number, header counted as row 1
    pub number: usize,
    /// `Field Name` cell
    pub name: String,
    /// `Field Type` cell
    pub field_type: String,
    /// `Options` cell; `None` when the sheet has no such column
    pub options: Option<String>,
}

/// Build a field schema from a sequence of rows.
///
/// Rows with a blank field name are skipped. Any invalid row fails the
/// whole operation with an error naming it. `required` defaults to false;
/// the sheet carries no column for it.
pub fn form_fields_from_rows<I>(rows: I) -> Result<IndexMap<String, FieldConfig>, SpreadsheetError>
where
    I: IntoIterator<Item = SpreadsheetRow>,
{
    let mut fields = IndexMap::new();
    for row in rows {
        let name = row.name.trim();
        if name.is_empty() {
            continue;
        }
        let kind = row.field_type.trim().to_lowercase();
        let config = match kind.as_str() {
            "text" => FieldConfig::Text { required: false },
            "image" => FieldConfig::Image { required: false },
            "dropdown" | "multiselect" => {
                let cell = row.options.as_deref().ok_or_else(|| {
                    SpreadsheetError::MissingOptionsColumn {
                        row: row.number,
                        kind: kind.clone(),
                    }
                })?;
                let options: Vec<String> = cell
                    .split(',')
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(String::from)
                    .collect();
                if options.is_empty() {
                    return Err(SpreadsheetError::EmptyOptions {
                        row: row.number,
                        kind,
                    });
                }
                let choice = ChoiceConfig {
                    required: false,
                    options,
                    sub_questions: IndexMap::new(),
                };
                if kind == "dropdown" {
                    FieldConfig::Dropdown(choice)
                } else {
                    FieldConfig::Multiselect(choice)
                }
            }
            other => {
                return Err(SpreadsheetError::InvalidFieldType {
                    row: row.number,
                    value: other.to_string(),
                })
            }
        };
        fields.insert(name.to_string(), config);
    }
    if fields.is_empty() {
        return Err(SpreadsheetError::NoFields);
    }
    Ok(fields)
}

/// Full ingestion path for uploaded bytes: sniff, decode, parse, build.
pub fn fields_from_upload(bytes: &[u8]) -> Result<IndexMap<String, FieldConfig>, SpreadsheetError> {
    sniff_format(bytes)?;
    let text = decode_text(bytes);
    form_fields_from_rows(parse_csv(&text)?)
}

fn sniff_format(bytes: &[u8]) -> Result<(), SpreadsheetError> {
    if bytes.starts_with(ZIP_MAGIC) {
        return Err(SpreadsheetError::UnsupportedFormat(
            "xlsx/ods workbooks are not supported, export the sheet as CSV".into(),
        ));
    }
    if bytes.starts_with(OLE_MAGIC) {
        return Err(SpreadsheetError::UnsupportedFormat(
            "legacy xls workbooks are not supported, export the sheet as CSV".into(),
        ));
    }
    Ok(())
}

/// Fixed encoding ladder: strict UTF-8 first, Latin-1 second. Latin-1 is
/// total over bytes, so the ladder always yields text.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn parse_csv(text: &str) -> Result<Vec<SpreadsheetRow>, SpreadsheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let find = |wanted: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
    };
    let name_idx = find("Field Name").ok_or_else(|| SpreadsheetError::MissingColumn {
        column: "Field Name".into(),
    })?;
    let type_idx = find("Field Type").ok_or_else(|| SpreadsheetError::MissingColumn {
        column: "Field Type".into(),
    })?;
    let options_idx = find("Options");

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        rows.push(SpreadsheetRow {
            // header occupies row 1
            number: i + 2,
            name: record.get(name_idx).unwrap_or_default().to_string(),
            field_type: record.get(type_idx).unwrap_or_default().to_string(),
            options: options_idx.map(|idx| record.get(idx).unwrap_or_default().to_string()),
        });
    }
    Ok(rows)
}
