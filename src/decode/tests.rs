use super::*;
use crate::correct::CellCorrector;

fn decoder() -> TableDecoder {
    let corrector = CellCorrector::new().expect("corrector rules should compile");
    TableDecoder::new(corrector, SubjectCatalog::default(), TableLayout::default())
}

fn cells(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn sample_grid() -> Vec<Vec<String>> {
    vec![
        cells(&[
            "Sl No", "USN", "Student Name", "CIE", "SEE", "TOTAL", "GRADE", "CIE", "SEE", "TOTAL",
            "GRADE",
        ]),
        cells(&[
            "SI No",
            "USN",
            "Name",
            "22CS7PCCCT",
            "22CS7PCCCT",
            "22CS7PCCCT",
            "22CS7PCCCT",
            "22CS7PENLP",
            "22CS7PENLP",
            "22CS7PENLP",
            "22CS7PENLP",
        ]),
        cells(&["", "", "", "Max 50", "Max 50", "100", "", "Max 50", "Max 50", "100", ""]),
        cells(&[
            "1",
            "1BM21CS001",
            "ADITYA DUA",
            "45",
            "48",
            "93",
            "A",
            "40",
            "42",
            "82",
            "B",
        ]),
        cells(&[
            "2",
            "1BM21CS0O2",
            "RAHUL C SHIRUR",
            "38",
            "41",
            "79",
            "B",
            "35",
            "30",
            "65",
            "C",
        ]),
    ]
}

#[test]
fn header_scan_collapses_each_repeated_code_to_one_subject() {
    let decoder = decoder();
    let header = cells(&[
        "SI No",
        "USN",
        "Name",
        "22CS7PCCCT",
        "22CS7PCCCT",
        "22CS7PCCCT",
        "22CS7PCCCT",
        "22CS7PENLP",
        "22CS7PENLP",
        "22CS7PENLP",
        "22CS7PENLP",
    ]);

    assert_eq!(
        decoder.scan_subject_codes(&header),
        vec!["22CS7PCCCT", "22CS7PENLP"]
    );
}

#[test]
fn header_scan_repairs_known_code_corruptions() {
    let decoder = decoder();
    let header = cells(&[
        "SI No",
        "USN",
        "Name",
        "22CSTPCCCT",
        "22CSTPCCCT",
        "22CSTPCCCT",
        "22CSTPCCCT",
        "22MEZOESSE",
        "22MEZOESSE",
        "22MEZOESSE",
        "22MEZOESSE",
    ]);

    assert_eq!(
        decoder.scan_subject_codes(&header),
        vec!["22CS7PCCCT", "22ME2OESSE"]
    );
}

#[test]
fn header_scan_skips_numeric_short_and_empty_cells() {
    let decoder = decoder();
    let header = cells(&[
        "SI No",
        "USN",
        "Name",
        "2212345678",
        "22CS7",
        "",
        "22CS7PERPA",
        "22CS7PERPA",
        "22CS7PERPA",
        "22CS7PERPA",
    ]);

    assert_eq!(decoder.scan_subject_codes(&header), vec!["22CS7PERPA"]);
}

#[test]
fn decode_accepts_students_and_resolves_subjects() {
    let decoder = decoder();
    let decoded = decoder.decode(&sample_grid()).expect("sample grid should decode");

    assert_eq!(decoded.subjects.len(), 2);
    assert_eq!(decoded.subjects[0].alias, "CC");
    assert_eq!(decoded.subjects[1].name, "Natural Language Processing");

    assert_eq!(decoded.students.len(), 2);
    assert_eq!(decoded.students[0].usn, "1BM21CS001");
    assert_eq!(decoded.students[0].name, "ADITYA DUA");
    assert_eq!(decoded.students[1].usn, "1BM21CS002");

    let cloud = decoded.students[0]
        .score("22CS7PCCCT")
        .expect("code-keyed block");
    assert_eq!(cloud.cie, "45");
    assert_eq!(cloud.grade, "A");

    let cloud_by_alias = decoded.students[0].score("CC").expect("alias-keyed block");
    assert_eq!(cloud_by_alias.total, "93");
}

#[test]
fn row_level_usn_cleanup_fixes_letter_oh_without_touching_branch_letters() {
    let decoder = decoder();
    let mut grid = sample_grid();
    grid[3][1] = "1BM21CS0O1".to_string();

    let decoded = decoder.decode(&grid).expect("grid should decode");

    assert_eq!(decoded.students[0].usn, "1BM21CS001");
}

#[test]
fn short_rows_still_carry_a_block_for_every_subject() {
    let decoder = decoder();
    let mut grid = sample_grid();
    grid[4] = cells(&["2", "1BM21CS002", "RAHUL C SHIRUR", "38", "41"]);

    let decoded = decoder.decode(&grid).expect("grid should decode");
    let short = &decoded.students[1];

    for key in ["22CS7PCCCT", "22CS7PENLP", "CC", "NLP"] {
        assert!(short.score(key).is_some(), "missing block for {key}");
    }
    assert_eq!(short.score("22CS7PCCCT"), Some(&ScoreBlock::default()));
    assert_eq!(short.score("22CS7PENLP"), Some(&ScoreBlock::default()));
}

#[test]
fn ordinals_resort_and_renumber_densely() {
    let decoder = decoder();
    let mut grid = sample_grid();
    grid[3][0] = "7".to_string();
    grid[4][0] = "".to_string();
    grid.push(cells(&[
        "2",
        "1BM21CS003",
        "KIRAN RAO",
        "30",
        "33",
        "63",
        "C",
        "31",
        "35",
        "66",
        "C",
    ]));

    let decoded = decoder.decode(&grid).expect("grid should decode");

    // Source ordinals come out as [7, 2 (sequential fallback), 2]; the stable
    // sort keeps the fallback row ahead of the explicit duplicate.
    let order: Vec<&str> = decoded
        .students
        .iter()
        .map(|student| student.usn.as_str())
        .collect();
    assert_eq!(order, ["1BM21CS002", "1BM21CS003", "1BM21CS001"]);

    let ordinals: Vec<i64> = decoded.students.iter().map(|student| student.sl_no).collect();
    assert_eq!(ordinals, [1, 2, 3]);
    assert_eq!(decoded.stats.ordinals_reassigned, 2);
}

#[test]
fn rows_with_invalid_usn_but_a_name_are_kept() {
    let decoder = decoder();
    let mut grid = sample_grid();
    grid[4] = cells(&[
        "2",
        "XX99",
        "PRIYA NAIR",
        "38",
        "41",
        "79",
        "B",
        "35",
        "30",
        "65",
        "C",
    ]);

    let decoded = decoder.decode(&grid).expect("grid should decode");

    assert_eq!(decoded.students.len(), 2);
    assert_eq!(decoded.students[1].usn, "XX99");
    assert_eq!(decoded.students[1].name, "PRIYA NAIR");
}

#[test]
fn blank_and_unidentifiable_rows_are_skipped_or_rejected() {
    let decoder = decoder();
    let mut grid = sample_grid();
    grid.push(cells(&["", "", "", "12", "13"]));
    grid.push(cells(&["", "1BM21", "", "12", "13"]));

    let decoded = decoder.decode(&grid).expect("grid should decode");

    assert_eq!(decoded.students.len(), 2);
    assert_eq!(decoded.stats.rows_skipped_empty, 1);
    assert_eq!(decoded.stats.rows_rejected, 1);
}

#[test]
fn missing_subject_codes_is_a_fatal_decode_error() {
    let decoder = decoder();
    let grid = vec![
        cells(&["Sl No", "USN", "Student Name"]),
        cells(&["SI No", "USN", "Name", "CIE", "SEE", "TOTAL", "GRADE"]),
        cells(&["", "", ""]),
        cells(&["1", "1BM21CS001", "ADITYA DUA", "45"]),
    ];

    let err = decoder
        .decode(&grid)
        .expect_err("header without codes must fail");
    assert!(matches!(err, DecodeError::NoSubjectCodes { .. }));
}

#[test]
fn grid_without_accepted_rows_is_a_fatal_decode_error() {
    let decoder = decoder();
    let grid = vec![
        cells(&["Sl No", "USN", "Student Name", "CIE", "SEE", "TOTAL", "GRADE"]),
        cells(&[
            "SI No",
            "USN",
            "Name",
            "22CS7PCCCT",
            "22CS7PCCCT",
            "22CS7PCCCT",
            "22CS7PCCCT",
        ]),
        cells(&["", "", ""]),
        cells(&["", "", "", "45", "48", "93", "A"]),
    ];

    let err = decoder.decode(&grid).expect_err("no students must fail");
    assert!(matches!(err, DecodeError::NoStudentRows { .. }));
}

#[test]
fn unknown_codes_fall_back_to_prefix_aliases() {
    let decoder = decoder();
    let mut grid = sample_grid();
    for column in 7..11 {
        grid[1][column] = "22EC7PEVLS".to_string();
    }

    let decoded = decoder.decode(&grid).expect("grid should decode");

    assert_eq!(decoded.subjects[1].alias, "22EC");
    assert_eq!(decoded.subjects[1].name, "22EC7PEVLS");
    assert!(decoded.students[0].score("22EC").is_some());
}

#[test]
fn catalog_json_overrides_replace_the_seeded_tables() {
    let raw = r#"{
        "aliases": { "25XX1ABCDE": "XA" },
        "names": { "25XX1ABCDE": "Example Subject" }
    }"#;

    let catalog = SubjectCatalog::from_json_str(raw).expect("catalog json should parse");

    assert_eq!(catalog.alias_for("25XX1ABCDE"), "XA");
    assert_eq!(catalog.name_for("25XX1ABCDE"), "Example Subject");
    assert_eq!(catalog.alias_for("22CS7PCCCT"), "22CS");
    assert_eq!(catalog.name_for("22CS7PCCCT"), "22CS7PCCCT");
}
