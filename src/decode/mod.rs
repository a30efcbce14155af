use std::collections::HashMap;

use thiserror::Error;

use crate::correct::CellCorrector;
use crate::model::{ScoreBlock, StudentRecord, Subject};
use crate::subjects::SubjectCatalog;

#[cfg(test)]
mod tests;

/// Number of score columns each subject code spans in the header: CIE, SEE,
/// TOTAL and GRADE.
const COMPONENTS_PER_SUBJECT: usize = 4;

// Known header-level OCR corruptions of the subject-code prefix.
const CODE_REPAIRS: &[(&str, &str)] = &[("22CST", "22CS7"), ("22MEZO", "22ME2O")];

/// Fatal decode failures. Malformed individual cells never fail the decode;
/// they degrade to empty defaults so a partially readable sheet still yields
/// every student it can.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(
        "no subject codes found in header row {header_row}; scanned {cells_scanned} cells, preview {preview:?}"
    )]
    NoSubjectCodes {
        header_row: usize,
        cells_scanned: usize,
        preview: Vec<String>,
    },
    #[error(
        "no student rows accepted; scanned {rows_scanned} rows, skipped {rows_skipped_empty} empty, rejected {rows_rejected}"
    )]
    NoStudentRows {
        rows_scanned: usize,
        rows_skipped_empty: usize,
        rows_rejected: usize,
    },
}

/// Fixed physical layout of the marksheet grid: a descriptive row, the
/// subject-code header, a metadata row, then student rows. The decoder
/// assumes this layout; it does not infer it.
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub header_row: usize,
    pub data_start_row: usize,
    pub identity_columns: usize,
    pub subject_code_prefix: String,
    pub subject_code_min_len: usize,
    pub usn_prefix: String,
    pub usn_min_len: usize,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            header_row: 1,
            data_start_row: 3,
            identity_columns: 3,
            subject_code_prefix: "22".to_string(),
            subject_code_min_len: 8,
            usn_prefix: "1BM".to_string(),
            usn_min_len: 9,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct DecodeStats {
    pub rows_scanned: usize,
    pub rows_skipped_empty: usize,
    pub rows_rejected: usize,
    pub ordinals_reassigned: usize,
}

#[derive(Debug)]
pub struct DecodedTable {
    pub students: Vec<StudentRecord>,
    pub subjects: Vec<Subject>,
    pub stats: DecodeStats,
}

#[derive(Debug)]
pub struct TableDecoder {
    corrector: CellCorrector,
    catalog: SubjectCatalog,
    layout: TableLayout,
}

impl TableDecoder {
    pub fn new(corrector: CellCorrector, catalog: SubjectCatalog, layout: TableLayout) -> Self {
        Self {
            corrector,
            catalog,
            layout,
        }
    }

    pub fn catalog(&self) -> &SubjectCatalog {
        &self.catalog
    }

    /// Decodes a corrected grid into student records plus the subjects
    /// discovered from the header row.
    pub fn decode(&self, grid: &[Vec<String>]) -> Result<DecodedTable, DecodeError> {
        let header = grid
            .get(self.layout.header_row)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let codes = self.scan_subject_codes(header);

        if codes.is_empty() {
            return Err(DecodeError::NoSubjectCodes {
                header_row: self.layout.header_row,
                cells_scanned: header.len().saturating_sub(self.layout.identity_columns),
                preview: header.iter().take(8).cloned().collect(),
            });
        }

        let subjects: Vec<Subject> = codes.iter().map(|code| self.catalog.describe(code)).collect();

        let mut students = Vec::new();
        let mut stats = DecodeStats::default();

        for row in grid.iter().skip(self.layout.data_start_row) {
            stats.rows_scanned += 1;

            if self.row_is_blank(row) {
                stats.rows_skipped_empty += 1;
                continue;
            }

            match self.decode_row(row, &codes, students.len()) {
                Some(record) => students.push(record),
                None => stats.rows_rejected += 1,
            }
        }

        if students.is_empty() {
            return Err(DecodeError::NoStudentRows {
                rows_scanned: stats.rows_scanned,
                rows_skipped_empty: stats.rows_skipped_empty,
                rows_rejected: stats.rows_rejected,
            });
        }

        // Source ordinals are OCR output and may repeat or vanish; the sort is
        // stable, so ties keep acceptance order, and renumbering makes the
        // final sequence dense.
        students.sort_by_key(|student| student.sl_no);
        for (index, student) in students.iter_mut().enumerate() {
            let dense = (index + 1) as i64;
            if student.sl_no != dense {
                stats.ordinals_reassigned += 1;
            }
            student.sl_no = dense;
        }

        Ok(DecodedTable {
            students,
            subjects,
            stats,
        })
    }

    /// Header scan. A code repeats across its component columns, so a cell is
    /// only a new subject when it differs from the immediately preceding
    /// accepted code; acceptance jumps the scan past the repeats.
    pub fn scan_subject_codes(&self, header: &[String]) -> Vec<String> {
        let mut codes = Vec::new();
        let mut index = self.layout.identity_columns;

        while index < header.len() {
            let cell = header[index].trim();

            if !self.cell_is_subject_code(cell) {
                index += 1;
                continue;
            }

            let code = self.normalize_subject_code(cell);
            if codes.last().map(String::as_str) != Some(code.as_str()) {
                codes.push(code);
            }

            index += COMPONENTS_PER_SUBJECT;
        }

        codes
    }

    fn cell_is_subject_code(&self, cell: &str) -> bool {
        !cell.is_empty()
            && cell.starts_with(&self.layout.subject_code_prefix)
            && cell.len() >= self.layout.subject_code_min_len
            && !cell.chars().all(|ch| ch.is_ascii_digit())
    }

    fn normalize_subject_code(&self, cell: &str) -> String {
        let mut code = cell.to_uppercase();
        for &(from, to) in CODE_REPAIRS {
            code = code.replace(from, to);
        }
        code.split_whitespace().collect()
    }

    fn row_is_blank(&self, row: &[String]) -> bool {
        row.iter()
            .take(self.layout.identity_columns)
            .all(|cell| cell.trim().is_empty())
    }

    fn decode_row(
        &self,
        row: &[String],
        codes: &[String],
        accepted_so_far: usize,
    ) -> Option<StudentRecord> {
        let raw_usn = row.get(1).map(String::as_str).unwrap_or("");
        let raw_name = row.get(2).map(String::as_str).unwrap_or("");

        let usn = self.corrector.clean_usn(raw_usn);
        let name = self.corrector.clean_name(raw_name);

        // Strict USN validation, with a permissive fallback: dropping a real
        // student is worse than keeping a row with a malformed USN.
        let strict = !usn.is_empty()
            && usn.len() >= self.layout.usn_min_len
            && usn.starts_with(&self.layout.usn_prefix);
        let fallback = !usn.is_empty() && !name.is_empty();

        if !strict && !fallback {
            return None;
        }

        let sl_no = row
            .first()
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty() && cell.chars().all(|ch| ch.is_ascii_digit()))
            .and_then(|cell| cell.parse::<i64>().ok())
            .unwrap_or((accepted_so_far + 1) as i64);

        let mut scores = HashMap::new();
        let mut column = self.layout.identity_columns;

        for code in codes {
            let block = self.read_score_block(row, column);
            let alias = self.catalog.alias_for(code);
            if alias != *code {
                scores.insert(alias, block.clone());
            }
            scores.insert(code.clone(), block);
            column += COMPONENTS_PER_SUBJECT;
        }

        Some(StudentRecord {
            sl_no,
            usn,
            name,
            scores,
        })
    }

    /// Reads one CIE/SEE/TOTAL/GRADE block. A row too short to contain the
    /// whole block yields an all-empty block.
    fn read_score_block(&self, row: &[String], start: usize) -> ScoreBlock {
        if start + COMPONENTS_PER_SUBJECT > row.len() {
            return ScoreBlock::default();
        }

        ScoreBlock {
            cie: row[start].trim().to_string(),
            see: row[start + 1].trim().to_string(),
            total: row[start + 2].trim().to_string(),
            grade: row[start + 3].trim().to_string(),
        }
    }
}
