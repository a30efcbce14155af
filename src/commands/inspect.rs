use anyhow::Result;
use tracing::{info, warn};

use crate::cli::InspectArgs;
use crate::commands::decode::read_grid;
use crate::correct::CellCorrector;
use crate::decode::{TableDecoder, TableLayout};
use crate::subjects::SubjectCatalog;

pub fn run(args: InspectArgs) -> Result<()> {
    let grid = read_grid(&args.input_csv)?;
    let columns = grid.iter().map(Vec::len).max().unwrap_or(0);

    info!(path = %args.input_csv.display(), rows = grid.len(), columns, "inspecting grid");

    let corrector = CellCorrector::new()?;
    let (corrected, stats) = corrector.correct_grid(&grid);

    info!(
        cells = stats.cells_total,
        changed = stats.cells_changed,
        empty = stats.empty_cells,
        usn = stats.usn_cells,
        mark = stats.mark_cells,
        free_text = stats.free_text_cells,
        "classification summary"
    );

    for (index, row) in corrected.iter().take(args.preview_rows).enumerate() {
        let preview: Vec<String> = row
            .iter()
            .take(8)
            .map(|cell| {
                if cell.is_empty() {
                    "(empty)".to_string()
                } else {
                    format!("{}:{}", corrector.classify(cell).as_str(), cell)
                }
            })
            .collect();
        info!(row = index, cells = ?preview, "row preview");
    }

    let layout = TableLayout {
        header_row: args.header_row,
        ..TableLayout::default()
    };
    let decoder = TableDecoder::new(corrector, SubjectCatalog::default(), layout);

    let header = corrected
        .get(args.header_row)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let codes = decoder.scan_subject_codes(header);

    if codes.is_empty() {
        warn!(
            header_row = args.header_row,
            "header scan found no subject codes"
        );
    } else {
        info!(count = codes.len(), codes = ?codes, "header scan found subject codes");
    }

    Ok(())
}
