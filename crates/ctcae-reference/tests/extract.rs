use ctcae_core::models::grade::GradeLevel;
use ctcae_reference::error::ExtractionError;
use ctcae_reference::extract::extract;
use ctcae_reference::table::ReferenceTable;

const LONG_TABLE: &str = "\
Section,Term,Grade,Description,Definition
Nervous system disorders,,,,
,Headache,Grade 1,Mild pain,A disorder characterized by a sensation of marked discomfort in various parts of the head
,,Grade 2,Moderate pain; limiting instrumental ADL,
,,Grade 3,Severe pain; limiting self care ADL; refractory to outpatient pain medication,
,Dizziness,1,Mild unsteadiness or sensation of movement,A disorder characterized by a disturbing sensation of lightheadedness
,,2,,
,,3,Severe unsteadiness or sensation of movement; limiting self care ADL,
Gastrointestinal disorders,,,,
,Nausea,G1,Loss of appetite without alteration in eating habits,A disorder characterized by a queasy sensation and/or the urge to vomit
,,G2,Oral intake decreased without significant weight loss,
,,G3,Inadequate oral caloric or fluid intake; tube feeding or hospitalization indicated,
,,-,,
";

fn table(csv: &str) -> ReferenceTable {
    ReferenceTable::from_csv_reader(csv.as_bytes()).expect("table should parse")
}

#[test]
fn extracts_terms_in_source_order() {
    let blocks = extract(&table(LONG_TABLE)).expect("extraction should succeed");

    let names: Vec<_> = blocks.iter().map(|b| b.term.term_name.as_str()).collect();
    assert_eq!(names, vec!["Headache", "Dizziness", "Nausea"]);

    let headache = &blocks[0];
    assert_eq!(headache.term.term_id, "headache");
    assert_eq!(headache.term.organ_system, "Nervous system disorders");
    assert!(headache.term.short_description.starts_with("A disorder characterized"));
    assert_eq!(headache.grades.len(), 3);
    assert_eq!(headache.grades[2].grade_id, "headache:3");
    assert!(
        headache.grades[2]
            .grade_description
            .contains("refractory to outpatient pain medication")
    );
}

#[test]
fn every_grade_references_its_term() {
    let blocks = extract(&table(LONG_TABLE)).expect("extraction should succeed");
    for block in &blocks {
        for grade in &block.grades {
            assert_eq!(
                grade.term_id, block.term.term_id,
                "grade {} is attached to the wrong term",
                grade.grade_id
            );
        }
    }
}

#[test]
fn blank_description_inherits_previous_row_of_same_term() {
    let blocks = extract(&table(LONG_TABLE)).expect("extraction should succeed");
    let dizziness = &blocks[1];
    assert_eq!(
        dizziness.grades[1].grade_description,
        "Mild unsteadiness or sensation of movement"
    );
}

#[test]
fn not_applicable_row_description_is_not_inherited() {
    let csv = "\
Section,Term,Grade,Description
Cardiac disorders,,,
,Ventricular fibrillation,Grade 4,Life-threatening consequences
,,Not Applicable,Not graded at this level
,,Grade 5,
";
    let blocks = extract(&table(csv)).expect("extraction should succeed");
    let vfib = &blocks[0];
    assert_eq!(vfib.grades.len(), 2);
    assert_eq!(vfib.grades[1].grade_level, GradeLevel::Five);
    assert_eq!(
        vfib.grades[1].grade_description,
        "Life-threatening consequences"
    );
}

#[test]
fn section_headers_scope_following_terms() {
    let blocks = extract(&table(LONG_TABLE)).expect("extraction should succeed");
    assert_eq!(blocks[2].term.organ_system, "Gastrointestinal disorders");
}

#[test]
fn not_applicable_rows_yield_no_grade() {
    let blocks = extract(&table(LONG_TABLE)).expect("extraction should succeed");
    let nausea = &blocks[2];
    let levels: Vec<_> = nausea.grades.iter().map(|g| g.grade_level).collect();
    assert_eq!(
        levels,
        vec![GradeLevel::One, GradeLevel::Two, GradeLevel::Three]
    );
}

#[test]
fn invalid_grade_label_is_rejected() {
    let csv = "\
Section,Term,Grade,Description
Nervous system disorders,Headache,Grade 1,Mild pain
,,Grade 9,Unheard-of pain
";
    match extract(&table(csv)) {
        Err(ExtractionError::InvalidGradeLabel { label, term, .. }) => {
            assert_eq!(label, "Grade 9");
            assert_eq!(term, "Headache");
        }
        other => panic!("expected InvalidGradeLabel, got {other:?}"),
    }
}

#[test]
fn term_without_applicable_grades_is_rejected() {
    let csv = "\
Section,Term,Grade,Description
Nervous system disorders,Headache,Grade 1,Mild pain
,Syncope,Not Applicable,
";
    assert!(matches!(
        extract(&table(csv)),
        Err(ExtractionError::NoGrades { ref term, .. }) if term == "Syncope"
    ));
}

#[test]
fn first_grade_without_description_is_rejected() {
    let csv = "\
Section,Term,Grade,Description
Nervous system disorders,Headache,Grade 1,
";
    assert!(matches!(
        extract(&table(csv)),
        Err(ExtractionError::MissingDescription { level: GradeLevel::One, .. })
    ));
}

#[test]
fn repeated_grade_within_term_is_rejected() {
    let csv = "\
Section,Term,Grade,Description
Nervous system disorders,Headache,1,Mild pain
,,1,Mild pain again
";
    assert!(matches!(
        extract(&table(csv)),
        Err(ExtractionError::DuplicateGrade { .. })
    ));
}

#[test]
fn term_reappearing_after_its_block_is_rejected() {
    let csv = "\
Section,Term,Grade,Description
Nervous system disorders,Headache,1,Mild pain
,Dizziness,1,Mild unsteadiness
,Headache,2,Moderate pain
";
    assert!(matches!(
        extract(&table(csv)),
        Err(ExtractionError::DuplicateTerm { ref term_id, .. }) if term_id == "headache"
    ));
}

#[test]
fn term_before_any_section_is_rejected() {
    let csv = "\
Section,Term,Grade,Description
,Headache,1,Mild pain
";
    assert!(matches!(
        extract(&table(csv)),
        Err(ExtractionError::MissingSection { .. })
    ));
}

#[test]
fn missing_required_column_is_reported() {
    let csv = "Section,Term,Description\nNervous system disorders,Headache,Mild pain\n";
    assert!(matches!(
        ReferenceTable::from_csv_reader(csv.as_bytes()),
        Err(ExtractionError::MissingColumn(ref c)) if c == "grade"
    ));
}
