use anyhow::{Context, Result};
use regex::Regex;


/// Category assigned to a single OCR cell, derived from the cell text alone.
/// Classification never looks at neighbouring cells, so it can be re-derived
/// from any corrected string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellCategory {
    Usn,
    Mark,
    FreeText,
}

impl CellCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            CellCategory::Usn => "usn",
            CellCategory::Mark => "mark",
            CellCategory::FreeText => "free_text",
        }
    }
}

// Glyphs that are wrong in every context: currency/copyright marks the OCR
// emits for a printed C, plus curly quotes.
const ALWAYS_FIXES: &[(char, char)] = &[
    ('\u{20AC}', 'C'),
    ('\u{24B8}', 'C'),
    ('\u{00A9}', 'C'),
    ('\u{2018}', '\''),
    ('\u{2019}', '\''),
    ('\u{201C}', '"'),
    ('\u{201D}', '"'),
];

// Trial substitution used only while testing whether a cell is shaped like a
// USN; never committed to the cell text.
const USN_TRIAL_FIXES: &[(char, char)] = &[('O', '0'), ('I', '1'), ('B', '8')];

// Committed letter-to-digit repairs for cells classified as USNs.
const USN_FIXES: &[(char, char)] = &[
    ('O', '0'),
    ('I', '1'),
    ('l', '1'),
    ('B', '8'),
    ('Z', '2'),
    ('S', '5'),
];

// Marks reuse the USN table minus the Z rule.
const MARK_FIXES: &[(char, char)] = &[
    ('O', '0'),
    ('I', '1'),
    ('l', '1'),
    ('B', '8'),
    ('S', '5'),
];

// Row-level USN cleanup table: B, S and Z are legitimate letters inside
// institution and branch codes, so only the unambiguous pairs apply here.
const ROW_USN_FIXES: &[(char, char)] = &[('O', '0'), ('I', '1'), ('l', '1')];

#[derive(Debug, Default, Clone)]
pub struct CorrectionStats {
    pub cells_total: usize,
    pub cells_changed: usize,
    pub empty_cells: usize,
    pub usn_cells: usize,
    pub mark_cells: usize,
    pub free_text_cells: usize,
}

#[derive(Debug)]
pub struct CellCorrector {
    usn_shape: Regex,
    mark_shape: Regex,
    usn_transposition: Regex,
    non_alnum: Regex,
    name_charset: Regex,
    non_printable: Regex,
    whitespace: Regex,
}

impl CellCorrector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            usn_shape: Regex::new(r"^1[BM][A-Z0-9]{7,9}$")
                .context("failed to compile USN shape regex")?,
            mark_shape: Regex::new(r"^(?:\d+\s*\d*|[A-FP]|AB)$")
                .context("failed to compile mark shape regex")?,
            usn_transposition: Regex::new(r"1BM2[I1]CS")
                .context("failed to compile USN transposition regex")?,
            non_alnum: Regex::new(r"[^A-Z0-9]")
                .context("failed to compile non-alphanumeric regex")?,
            name_charset: Regex::new(r"[^A-Za-z\s\-'.]")
                .context("failed to compile name charset regex")?,
            non_printable: Regex::new(r"[^\x20-\x7E]")
                .context("failed to compile printable-ASCII regex")?,
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
        })
    }

    /// Classifies a cell from its own content.
    pub fn classify(&self, text: &str) -> CellCategory {
        if self.looks_like_usn(text) {
            return CellCategory::Usn;
        }
        if self.looks_like_mark(text) {
            return CellCategory::Mark;
        }
        CellCategory::FreeText
    }

    /// Context-aware correction of one cell. Total: absent or blank input
    /// yields an empty string, never an error.
    pub fn correct(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw else {
            return String::new();
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let prepared = apply_char_fixes(trimmed, ALWAYS_FIXES);
        self.correct_prepared(&prepared).1
    }

    /// Corrects every cell of a grid and tallies categories along the way.
    pub fn correct_grid(&self, grid: &[Vec<String>]) -> (Vec<Vec<String>>, CorrectionStats) {
        let mut stats = CorrectionStats::default();
        let mut corrected = Vec::with_capacity(grid.len());

        for row in grid {
            let mut out_row = Vec::with_capacity(row.len());

            for cell in row {
                stats.cells_total += 1;

                let trimmed = cell.trim();
                if trimmed.is_empty() {
                    stats.empty_cells += 1;
                    if !cell.is_empty() {
                        stats.cells_changed += 1;
                    }
                    out_row.push(String::new());
                    continue;
                }

                let prepared = apply_char_fixes(trimmed, ALWAYS_FIXES);
                let (category, fixed) = self.correct_prepared(&prepared);

                match category {
                    CellCategory::Usn => stats.usn_cells += 1,
                    CellCategory::Mark => stats.mark_cells += 1,
                    CellCategory::FreeText => stats.free_text_cells += 1,
                }
                if fixed != *cell {
                    stats.cells_changed += 1;
                }

                out_row.push(fixed);
            }

            corrected.push(out_row);
        }

        (corrected, stats)
    }

    /// Row-level USN cleanup used by the structural decoder, which does not
    /// trust upstream per-cell correction alone.
    pub fn clean_usn(&self, raw: &str) -> String {
        let usn = raw.trim().to_uppercase();
        if usn.is_empty() {
            return usn;
        }

        let usn = apply_char_fixes(&usn, ROW_USN_FIXES);
        self.non_alnum.replace_all(&usn, "").into_owned()
    }

    /// Row-level name cleanup: keeps letters, spaces, hyphens, apostrophes
    /// and periods; everything else becomes a space so words never fuse.
    pub fn clean_name(&self, raw: &str) -> String {
        let kept = self.name_charset.replace_all(raw.trim(), " ");
        self.whitespace.replace_all(&kept, " ").trim().to_string()
    }

    fn correct_prepared(&self, prepared: &str) -> (CellCategory, String) {
        let category = self.classify(prepared);
        let fixed = match category {
            CellCategory::Usn => self.fix_usn(prepared),
            CellCategory::Mark => self.fix_mark(prepared),
            CellCategory::FreeText => self.fix_free_text(prepared),
        };
        (category, fixed)
    }

    fn looks_like_usn(&self, text: &str) -> bool {
        let trial = apply_char_fixes(&text.trim().to_uppercase(), USN_TRIAL_FIXES);
        self.usn_shape.is_match(&trial)
    }

    fn looks_like_mark(&self, text: &str) -> bool {
        self.mark_shape.is_match(&text.trim().to_uppercase())
    }

    fn fix_usn(&self, text: &str) -> String {
        let usn = apply_char_fixes(&text.to_uppercase(), USN_FIXES);
        let usn = self.usn_transposition.replace_all(&usn, "1BM21CS");
        self.non_alnum.replace_all(&usn, "").into_owned()
    }

    fn fix_mark(&self, text: &str) -> String {
        let fixed = apply_char_fixes(text, MARK_FIXES);
        self.whitespace.replace_all(&fixed, "").into_owned()
    }

    fn fix_free_text(&self, text: &str) -> String {
        let ascii = self.non_printable.replace_all(text, " ");
        self.whitespace.replace_all(&ascii, " ").trim().to_string()
    }
}

fn apply_char_fixes(text: &str, fixes: &[(char, char)]) -> String {
    text.chars()
        .map(|ch| {
            fixes
                .iter()
                .find(|(from, _)| *from == ch)
                .map(|&(_, to)| to)
                .unwrap_or(ch)
        })
        .collect()
}
