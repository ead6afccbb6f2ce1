//! Wide-format import: one row per term with a `Grade 1` … `Grade 5` column
//! each, the layout of the published CTCAE spreadsheet export.
//!
//! Each wide row is unfolded into five long-format rows and handed to the
//! regular extractor, so both layouts share the same validation.

use std::io::Read;

use crate::error::ExtractionError;
use crate::extract::{TermBlock, extract};
use crate::table::{ReferenceRow, ReferenceTable, normalize_header};

const GRADE_COLUMNS: [&str; 5] = ["grade 1", "grade 2", "grade 3", "grade 4", "grade 5"];

/// Read a wide-format CSV into a long-format table.
///
/// Blank and `-` grade cells become "Not Applicable" rows. A grade 5 cell
/// reading "Death" is labelled with the Death level.
pub fn read_wide_csv<R: Read>(reader: R) -> Result<ReferenceTable, ExtractionError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(normalize_header).collect();
    let locate = |name: &str| headers.iter().position(|h| h == name);
    let require =
        |name: &str| locate(name).ok_or_else(|| ExtractionError::MissingColumn(name.to_string()));

    let soc = require("meddra soc")?;
    let term = require("ctcae term")?;
    let code = locate("meddra code");
    let definition = locate("definition");
    let note = locate("navigational note");
    let grade_columns = GRADE_COLUMNS
        .iter()
        .map(|name| require(*name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .trim()
                .to_string()
        };
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 2);

        let term_name = cell(Some(term));
        if term_name.is_empty() {
            continue;
        }

        for (grade_idx, column) in grade_columns.iter().enumerate() {
            let text = cell(Some(*column));
            let grade_number = grade_idx + 1;
            let (label, description) = if text.is_empty() || text == "-" {
                ("Not Applicable".to_string(), String::new())
            } else if grade_number == 5 && text.eq_ignore_ascii_case("death") {
                ("Death".to_string(), text)
            } else {
                (grade_number.to_string(), text)
            };

            rows.push(ReferenceRow {
                line,
                section: cell(Some(soc)),
                term: term_name.clone(),
                grade: label,
                description,
                meddra_code: cell(code),
                definition: cell(definition),
                navigational_note: cell(note),
            });
        }
    }

    Ok(ReferenceTable::from_rows(rows))
}

/// Read and extract a wide-format CSV in one step.
pub fn extract_wide<R: Read>(reader: R) -> Result<Vec<TermBlock>, ExtractionError> {
    let table = read_wide_csv(reader)?;
    extract(&table)
}
