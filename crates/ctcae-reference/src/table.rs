use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::ExtractionError;

/// Column aliases, compared after lowercasing and replacing `_` with a space.
mod column {
    pub const SECTION: &[&str] = &[
        "section",
        "organ system",
        "meddra soc",
        "soc",
        "system organ class",
    ];
    pub const TERM: &[&str] = &["term", "ctcae term", "term name"];
    pub const GRADE: &[&str] = &["grade", "grade level", "grade label"];
    pub const DESCRIPTION: &[&str] = &["description", "grade description"];
    pub const MEDDRA_CODE: &[&str] = &["meddra code"];
    pub const DEFINITION: &[&str] = &["definition", "short description", "term definition"];
    pub const NAVIGATIONAL_NOTE: &[&str] = &["navigational note"];
}

/// One raw row of the long-format reference table (one row per term/grade
/// pair). Cells are kept verbatim apart from trimming; blank means "inherit".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceRow {
    /// 1-based source line, for error messages.
    pub line: usize,
    pub section: String,
    pub term: String,
    pub grade: String,
    pub description: String,
    pub meddra_code: String,
    pub definition: String,
    pub navigational_note: String,
}

impl ReferenceRow {
    pub fn is_blank(&self) -> bool {
        self.section.is_empty()
            && self.term.is_empty()
            && self.grade.is_empty()
            && self.description.is_empty()
            && self.meddra_code.is_empty()
            && self.definition.is_empty()
            && self.navigational_note.is_empty()
    }

    /// A section header carries only the organ-system cell.
    pub fn is_section_header(&self) -> bool {
        !self.section.is_empty()
            && self.term.is_empty()
            && self.grade.is_empty()
            && self.description.is_empty()
    }
}

/// The tabular reference source, in row order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    pub rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn from_rows(rows: Vec<ReferenceRow>) -> Self {
        Self { rows }
    }

    /// Read a long-format CSV. The header row locates columns by name;
    /// section, term, grade and description are required.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ExtractionError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let locate = |aliases: &[&str]| {
            headers
                .iter()
                .position(|h| aliases.contains(&normalize_header(h).as_str()))
        };
        let require = |aliases: &[&str]| {
            locate(aliases).ok_or_else(|| ExtractionError::MissingColumn(aliases[0].to_string()))
        };

        let section = require(column::SECTION)?;
        let term = require(column::TERM)?;
        let grade = require(column::GRADE)?;
        let description = require(column::DESCRIPTION)?;
        let meddra_code = locate(column::MEDDRA_CODE);
        let definition = locate(column::DEFINITION);
        let navigational_note = locate(column::NAVIGATIONAL_NOTE);

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

            rows.push(ReferenceRow {
                line,
                section: cell(Some(section)),
                term: cell(Some(term)),
                grade: cell(Some(grade)),
                description: cell(Some(description)),
                meddra_code: cell(meddra_code),
                definition: cell(definition),
                navigational_note: cell(navigational_note),
            });
        }

        Ok(Self { rows })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, ExtractionError> {
        let file = File::open(path)?;
        let table = Self::from_csv_reader(file)?;
        info!(path = %path.display(), rows = table.rows.len(), "reference table loaded");
        Ok(table)
    }
}

pub(crate) fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace('_', " ")
}
