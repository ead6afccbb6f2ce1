use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use ctcae_core::models::grade::GradeLevel;

use crate::error::CatalogError;
use crate::extract::TermBlock;

/// Processed reference data, persisted as JSON between extraction and
/// indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    /// CTCAE release the table came from, e.g. `"5.0"`.
    pub version: String,
    pub terms: Vec<TermBlock>,
    /// Sorted, de-duplicated organ systems.
    pub categories: Vec<String>,
}

impl ReferenceCatalog {
    pub fn from_blocks(version: impl Into<String>, terms: Vec<TermBlock>) -> Self {
        let categories: BTreeSet<String> = terms
            .iter()
            .map(|b| b.term.organ_system.clone())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            version: version.into(),
            terms,
            categories: categories.into_iter().collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog: ReferenceCatalog = serde_json::from_str(&contents)?;
        if catalog.terms.is_empty() {
            return Err(CatalogError::Empty(path.display().to_string()));
        }
        info!(path = %path.display(), terms = catalog.terms.len(), "reference catalog loaded");
        Ok(catalog)
    }

    /// Write the catalog as pretty JSON via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json.as_bytes())?;
        std::fs::rename(&tmp_path, path)?;

        info!(path = %path.display(), terms = self.terms.len(), "reference catalog saved");
        Ok(())
    }

    /// Case-insensitive lookup by term name.
    pub fn term_by_name(&self, name: &str) -> Option<&TermBlock> {
        let name = name.trim();
        self.terms
            .iter()
            .find(|b| b.term.term_name.eq_ignore_ascii_case(name))
    }

    pub fn grade_description(&self, term_name: &str, level: GradeLevel) -> Option<&str> {
        self.term_by_name(term_name)?
            .grades
            .iter()
            .find(|g| g.grade_level == level)
            .map(|g| g.grade_description.as_str())
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn terms_by_category(&self, category: &str) -> Vec<&TermBlock> {
        self.terms
            .iter()
            .filter(|b| b.term.organ_system == category)
            .collect()
    }

    /// Keyword search over term names, definitions, and grade descriptions.
    /// Each term appears at most once, in catalog order.
    pub fn search_terms(&self, keyword: &str) -> Vec<&TermBlock> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.terms
            .iter()
            .filter(|b| {
                b.term.term_name.to_lowercase().contains(&needle)
                    || b.term.short_description.to_lowercase().contains(&needle)
                    || b
                        .grades
                        .iter()
                        .any(|g| g.grade_description.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
