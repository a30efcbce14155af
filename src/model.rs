use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One examined subject, discovered once from the header row and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub code: String,
    pub alias: String,
    pub name: String,
}

/// The four score components recorded per subject per student. An empty
/// string means the source cell carried no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBlock {
    pub cie: String,
    pub see: String,
    pub total: String,
    pub grade: String,
}

/// One decoded student row. Score blocks are stored under both the canonical
/// subject code and its alias, so the record is queryable either way; every
/// discovered subject has a block even when the source row was short.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub sl_no: i64,
    pub usn: String,
    pub name: String,
    pub scores: HashMap<String, ScoreBlock>,
}

impl StudentRecord {
    pub fn score(&self, key: &str) -> Option<&ScoreBlock> {
        self.scores.get(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSource {
    pub filename: String,
    pub sha256: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodePaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub input_csv: String,
    pub output_csv: String,
    pub alias_output_csv: String,
    pub subject_catalog: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodeCounts {
    pub cells_total: usize,
    pub cells_changed: usize,
    pub empty_cells: usize,
    pub usn_cells: usize,
    pub mark_cells: usize,
    pub free_text_cells: usize,
    pub subject_count: usize,
    pub alias_fallback_count: usize,
    pub student_count: usize,
    pub rows_scanned: usize,
    pub rows_skipped_empty: usize,
    pub rows_rejected: usize,
    pub ordinals_reassigned: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub input: GridSource,
    pub paths: DecodePaths,
    pub counts: DecodeCounts,
    pub subjects: Vec<Subject>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}
