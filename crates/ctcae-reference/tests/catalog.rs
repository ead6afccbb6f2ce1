use ctcae_core::models::grade::GradeLevel;
use ctcae_reference::catalog::ReferenceCatalog;
use ctcae_reference::extract::extract;
use ctcae_reference::table::ReferenceTable;

const TABLE: &str = "\
Section,Term,Grade,Description,Definition
Nervous system disorders,Headache,1,Mild pain,A disorder characterized by a sensation of marked discomfort in various parts of the head
,,2,Moderate pain; limiting instrumental ADL,
Gastrointestinal disorders,Nausea,1,Loss of appetite without alteration in eating habits,A disorder characterized by a queasy sensation and/or the urge to vomit
,,2,Oral intake decreased without significant weight loss,
Nervous system disorders,Dizziness,1,Mild unsteadiness or sensation of movement,A disorder characterized by a disturbing sensation of lightheadedness
";

fn catalog() -> ReferenceCatalog {
    let table = ReferenceTable::from_csv_reader(TABLE.as_bytes()).expect("table should parse");
    let blocks = extract(&table).expect("extraction should succeed");
    ReferenceCatalog::from_blocks("5.0", blocks)
}

#[test]
fn categories_are_sorted_and_unique() {
    assert_eq!(
        catalog().categories(),
        ["Gastrointestinal disorders", "Nervous system disorders"]
    );
}

#[test]
fn lookups_are_case_insensitive() {
    let catalog = catalog();
    assert!(catalog.term_by_name("HEADACHE").is_some());
    assert_eq!(
        catalog.grade_description("nausea", GradeLevel::Two),
        Some("Oral intake decreased without significant weight loss")
    );
    assert_eq!(catalog.grade_description("nausea", GradeLevel::Four), None);
}

#[test]
fn terms_by_category_filters_on_organ_system() {
    let catalog = catalog();
    let names: Vec<_> = catalog
        .terms_by_category("Nervous system disorders")
        .iter()
        .map(|b| b.term.term_name.as_str())
        .collect();
    assert_eq!(names, vec!["Headache", "Dizziness"]);
}

#[test]
fn search_covers_names_definitions_and_grades() {
    let catalog = catalog();
    let hits = |q: &str| -> Vec<String> {
        catalog
            .search_terms(q)
            .iter()
            .map(|b| b.term.term_id.clone())
            .collect()
    };
    assert_eq!(hits("headache"), vec!["headache"]);
    assert_eq!(hits("queasy"), vec!["nausea"]);
    assert_eq!(hits("unsteadiness"), vec!["dizziness"]);
    assert!(hits("  ").is_empty());
}

#[test]
fn save_then_load_preserves_catalog() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data").join("ctcae_processed.json");

    let original = catalog();
    original.save(&path).expect("save should succeed");
    let loaded = ReferenceCatalog::load(&path).expect("load should succeed");

    assert_eq!(loaded, original);
    assert!(!path.with_extension("json.tmp").exists());
}
