/// Default collection names in the vector index.
pub mod collection {
    pub const TERMS: &str = "ctcae_terms";
    pub const GRADES: &str = "ctcae_grades";
}

/// Build the text embedded for a term record: name plus short description.
pub fn term_embedding_text(term_name: &str, short_description: &str) -> String {
    let description = short_description.trim();
    if description.is_empty() {
        term_name.trim().to_string()
    } else {
        format!("{}: {}", term_name.trim(), description)
    }
}

/// Build the text embedded for a grade record.
///
/// The parent term name and grade label are prefixed so that generic
/// descriptions ("Moderate pain") stay distinguishable across terms.
pub fn grade_embedding_text(term_name: &str, grade_label: &str, grade_description: &str) -> String {
    format!(
        "{} Grade {}: {}",
        term_name.trim(),
        grade_label,
        grade_description.trim()
    )
}
