use serde::{Deserialize, Serialize};

/// A named adverse-event category, e.g. "Headache".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    pub term_id: String,
    pub term_name: String,
    /// MedDRA system organ class the term is listed under.
    pub organ_system: String,
    pub short_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meddra_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigational_note: Option<String>,
}

impl TermEntry {
    /// Derive the stable identifier for a term name.
    ///
    /// Lowercases ASCII alphanumerics and collapses every other run of
    /// characters into a single `-`: `"Pain in extremity"` → `pain-in-extremity`.
    pub fn id_for(term_name: &str) -> String {
        let mut id = String::with_capacity(term_name.len());
        let mut pending_dash = false;
        for c in term_name.trim().chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !id.is_empty() {
                    id.push('-');
                }
                pending_dash = false;
                id.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        id
    }
}

/// A term with every applicable grade listed for it. The unit produced by
/// extraction and consumed by indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermBlock {
    pub term: TermEntry,
    pub grades: Vec<super::grade::GradeEntry>,
}
