use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::DecodeArgs;
use crate::correct::CellCorrector;
use crate::decode::{TableDecoder, TableLayout};
use crate::model::{
    DecodeCounts, DecodePaths, DecodeRunManifest, GridSource, StudentRecord, Subject,
};
use crate::subjects::SubjectCatalog;
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};

#[derive(Debug, Clone, Copy)]
enum HeaderStyle {
    Code,
    Alias,
}

pub fn run(args: DecodeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("decode_run_{}.json", utc_compact_string(started_ts)))
    });
    let alias_output_csv = args
        .alias_output_csv
        .clone()
        .unwrap_or_else(|| derive_alias_output_path(&args.output_csv));

    info!(input = %args.input_csv.display(), run_id = %run_id, "starting decode");

    let grid = read_grid(&args.input_csv)?;
    let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
    let sha256 = sha256_file(&args.input_csv)?;

    info!(rows = grid.len(), columns, "loaded grid");

    let corrector = CellCorrector::new()?;
    let (corrected, correction_stats) = corrector.correct_grid(&grid);

    info!(
        cells = correction_stats.cells_total,
        changed = correction_stats.cells_changed,
        usn = correction_stats.usn_cells,
        mark = correction_stats.mark_cells,
        free_text = correction_stats.free_text_cells,
        "applied context-aware corrections"
    );

    let catalog = load_catalog(args.subject_catalog.as_deref())?;
    let layout = TableLayout {
        header_row: args.header_row,
        data_start_row: args.data_start_row,
        ..TableLayout::default()
    };

    let decoder = TableDecoder::new(corrector, catalog, layout);
    let decoded = decoder
        .decode(&corrected)
        .with_context(|| format!("failed to decode {}", args.input_csv.display()))?;

    for subject in &decoded.subjects {
        info!(code = %subject.code, alias = %subject.alias, name = %subject.name, "subject discovered");
    }
    info!(
        students = decoded.students.len(),
        subjects = decoded.subjects.len(),
        rejected = decoded.stats.rows_rejected,
        "decode completed"
    );

    let alias_fallbacks = decoded
        .subjects
        .iter()
        .filter(|subject| !decoder.catalog().has_alias(&subject.code))
        .count();

    let mut warnings = Vec::new();
    if decoded.stats.rows_rejected > 0 {
        warnings.push(format!(
            "{} data rows failed student acceptance and were dropped",
            decoded.stats.rows_rejected
        ));
    }
    if alias_fallbacks > 0 {
        warnings.push(format!(
            "{alias_fallbacks} subject codes missing from the alias table; fell back to code prefixes"
        ));
    }
    for warning in &warnings {
        warn!("{warning}");
    }

    write_records_csv(
        &args.output_csv,
        &decoded.subjects,
        &decoded.students,
        HeaderStyle::Code,
    )?;
    write_records_csv(
        &alias_output_csv,
        &decoded.subjects,
        &decoded.students,
        HeaderStyle::Alias,
    )?;

    let manifest = DecodeRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_decode_command(&args),
        input: GridSource {
            filename: display_filename(&args.input_csv),
            sha256,
            rows: grid.len(),
            columns,
        },
        paths: DecodePaths {
            cache_root: args.cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            input_csv: args.input_csv.display().to_string(),
            output_csv: args.output_csv.display().to_string(),
            alias_output_csv: alias_output_csv.display().to_string(),
            subject_catalog: args
                .subject_catalog
                .as_ref()
                .map(|path| path.display().to_string()),
        },
        counts: DecodeCounts {
            cells_total: correction_stats.cells_total,
            cells_changed: correction_stats.cells_changed,
            empty_cells: correction_stats.empty_cells,
            usn_cells: correction_stats.usn_cells,
            mark_cells: correction_stats.mark_cells,
            free_text_cells: correction_stats.free_text_cells,
            subject_count: decoded.subjects.len(),
            alias_fallback_count: alias_fallbacks,
            student_count: decoded.students.len(),
            rows_scanned: decoded.stats.rows_scanned,
            rows_skipped_empty: decoded.stats.rows_skipped_empty,
            rows_rejected: decoded.stats.rows_rejected,
            ordinals_reassigned: decoded.stats.ordinals_reassigned,
        },
        subjects: decoded.subjects.clone(),
        warnings,
        notes: vec![
            "Corrections are deterministic character substitutions chosen per cell category."
                .to_string(),
            "Subject blocks are read as 4 consecutive columns (CIE, SEE, TOTAL, GRADE) per code."
                .to_string(),
        ],
    };

    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote decode run manifest");
    info!(
        students = decoded.students.len(),
        subjects = decoded.subjects.len(),
        "decode run finished"
    );

    Ok(())
}

pub fn read_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut grid = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("failed to read row {} of {}", index, path.display()))?;
        grid.push(record.iter().map(ToOwned::to_owned).collect());
    }

    Ok(grid)
}

fn write_records_csv(
    path: &Path,
    subjects: &[Subject],
    students: &[StudentRecord],
    style: HeaderStyle,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;

    let mut header = vec![
        "Sl_No".to_string(),
        "USN".to_string(),
        "Student_Name".to_string(),
    ];
    for subject in subjects {
        let key = match style {
            HeaderStyle::Code => &subject.code,
            HeaderStyle::Alias => &subject.alias,
        };
        for component in ["CIE", "SEE", "TOTAL", "GRADE"] {
            header.push(format!("{key}_{component}"));
        }
    }
    writer
        .write_record(&header)
        .with_context(|| format!("failed to write header to {}", path.display()))?;

    for student in students {
        let mut row = vec![
            student.sl_no.to_string(),
            student.usn.clone(),
            student.name.clone(),
        ];
        for subject in subjects {
            let block = student.score(&subject.code).cloned().unwrap_or_default();
            row.extend([block.cie, block.see, block.total, block.grade]);
        }
        writer
            .write_record(&row)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    info!(path = %path.display(), rows = students.len(), "wrote records csv");

    Ok(())
}

fn load_catalog(path: Option<&Path>) -> Result<SubjectCatalog> {
    match path {
        Some(path) => {
            let catalog = SubjectCatalog::from_json_file(path)?;
            info!(path = %path.display(), "loaded subject catalog");
            Ok(catalog)
        }
        None => Ok(SubjectCatalog::default()),
    }
}

fn derive_alias_output_path(output_csv: &Path) -> PathBuf {
    let stem = output_csv
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("student_marks");
    output_csv.with_file_name(format!("{stem}_alias.csv"))
}

fn display_filename(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| path.display().to_string())
}

fn render_decode_command(args: &DecodeArgs) -> String {
    let mut parts = vec![
        "marksheet decode".to_string(),
        format!("--input-csv {}", args.input_csv.display()),
        format!("--cache-root {}", args.cache_root.display()),
        format!("--output-csv {}", args.output_csv.display()),
        format!("--header-row {}", args.header_row),
        format!("--data-start-row {}", args.data_start_row),
    ];

    if let Some(path) = &args.alias_output_csv {
        parts.push(format!("--alias-output-csv {}", path.display()));
    }
    if let Some(path) = &args.subject_catalog {
        parts.push(format!("--subject-catalog {}", path.display()));
    }
    if let Some(path) = &args.manifest_path {
        parts.push(format!("--manifest-path {}", path.display()));
    }

    parts.join(" ")
}
