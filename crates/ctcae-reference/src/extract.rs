use std::collections::HashSet;

use tracing::{debug, info};

use ctcae_core::models::grade::{GradeEntry, GradeLevel};
use ctcae_core::models::term::TermEntry;
pub use ctcae_core::models::term::TermBlock;

use crate::error::ExtractionError;
use crate::table::{ReferenceRow, ReferenceTable};

/// Parse a reference table into term blocks, in source order.
///
/// Section header rows set the organ system for the rows beneath them. A
/// blank term cell continues the previous term, and a blank description
/// inherits the previous non-blank description of the same term. Rows
/// labelled "Not Applicable" are accepted but yield no grade.
pub fn extract(table: &ReferenceTable) -> Result<Vec<TermBlock>, ExtractionError> {
    let mut blocks = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut section: Option<String> = None;
    let mut current: Option<BlockBuilder> = None;

    for row in &table.rows {
        if row.is_blank() {
            continue;
        }

        if row.is_section_header() {
            if let Some(builder) = current.take() {
                blocks.push(builder.finish()?);
            }
            debug!(line = row.line, section = %row.section, "section header");
            section = Some(row.section.clone());
            continue;
        }

        if !row.section.is_empty() {
            section = Some(row.section.clone());
        }

        let continues_current = match &current {
            Some(builder) => row.term.is_empty() || row.term == builder.term.term_name,
            None => false,
        };

        if !continues_current {
            if row.term.is_empty() {
                return Err(ExtractionError::OrphanRow { line: row.line });
            }
            if let Some(builder) = current.take() {
                blocks.push(builder.finish()?);
            }

            let term_id = TermEntry::id_for(&row.term);
            if term_id.is_empty() {
                return Err(ExtractionError::InvalidTermName {
                    line: row.line,
                    term: row.term.clone(),
                });
            }
            if !seen.insert(term_id.clone()) {
                return Err(ExtractionError::DuplicateTerm {
                    line: row.line,
                    term: row.term.clone(),
                    term_id,
                });
            }
            let organ_system = section.clone().ok_or_else(|| ExtractionError::MissingSection {
                line: row.line,
                term: row.term.clone(),
            })?;

            current = Some(BlockBuilder::new(row, term_id, organ_system));
        }

        if let Some(builder) = current.as_mut() {
            builder.push(row)?;
        }
    }

    if let Some(builder) = current.take() {
        blocks.push(builder.finish()?);
    }

    info!(
        terms = blocks.len(),
        grades = blocks.iter().map(|b| b.grades.len()).sum::<usize>(),
        "reference table extracted"
    );

    Ok(blocks)
}

struct BlockBuilder {
    line: usize,
    term: TermEntry,
    grades: Vec<GradeEntry>,
    levels: HashSet<GradeLevel>,
    last_description: Option<String>,
}

impl BlockBuilder {
    fn new(row: &ReferenceRow, term_id: String, organ_system: String) -> Self {
        Self {
            line: row.line,
            term: TermEntry {
                term_id,
                term_name: row.term.clone(),
                organ_system,
                short_description: String::new(),
                meddra_code: None,
                navigational_note: None,
            },
            grades: Vec::new(),
            levels: HashSet::new(),
            last_description: None,
        }
    }

    fn push(&mut self, row: &ReferenceRow) -> Result<(), ExtractionError> {
        // Term-level cells are usually merged; take the first non-blank one.
        if self.term.short_description.is_empty() && !row.definition.is_empty() {
            self.term.short_description = row.definition.clone();
        }
        if self.term.meddra_code.is_none() && !row.meddra_code.is_empty() {
            self.term.meddra_code = Some(row.meddra_code.clone());
        }
        if self.term.navigational_note.is_none() && !row.navigational_note.is_empty() {
            self.term.navigational_note = Some(row.navigational_note.clone());
        }

        let level = GradeLevel::from_label(&row.grade).map_err(|_| {
            ExtractionError::InvalidGradeLabel {
                line: row.line,
                term: self.term.term_name.clone(),
                label: row.grade.clone(),
            }
        })?;

        // Only applicable grades feed the inherited description.
        if !level.is_applicable() {
            debug!(line = row.line, term = %self.term.term_name, "grade not applicable, skipped");
            return Ok(());
        }

        if !row.description.is_empty() {
            self.last_description = Some(row.description.clone());
        }

        if !self.levels.insert(level) {
            return Err(ExtractionError::DuplicateGrade {
                line: row.line,
                term: self.term.term_name.clone(),
                level,
            });
        }

        let description = self.last_description.clone().ok_or_else(|| {
            ExtractionError::MissingDescription {
                line: row.line,
                term: self.term.term_name.clone(),
                level,
            }
        })?;

        self.grades.push(GradeEntry {
            grade_id: GradeEntry::id_for(&self.term.term_id, level),
            term_id: self.term.term_id.clone(),
            grade_level: level,
            grade_description: description,
        });
        Ok(())
    }

    fn finish(self) -> Result<TermBlock, ExtractionError> {
        if self.grades.is_empty() {
            return Err(ExtractionError::NoGrades {
                line: self.line,
                term: self.term.term_name,
            });
        }
        Ok(TermBlock {
            term: self.term,
            grades: self.grades,
        })
    }
}
