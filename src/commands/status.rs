use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::DecodeRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");

    info!(cache_root = %args.cache_root.display(), "status requested");

    let Some(latest) = find_latest_manifest(&manifest_dir)? else {
        warn!(path = %manifest_dir.display(), "no decode run manifests found");
        return Ok(());
    };

    let raw = fs::read(&latest).with_context(|| format!("failed to read {}", latest.display()))?;
    let manifest: DecodeRunManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", latest.display()))?;

    info!(
        run_id = %manifest.run_id,
        status = %manifest.status,
        started_at = %manifest.started_at,
        updated_at = %manifest.updated_at,
        input = %manifest.paths.input_csv,
        input_sha256 = %manifest.input.sha256,
        output = %manifest.paths.output_csv,
        alias_output = %manifest.paths.alias_output_csv,
        students = manifest.counts.student_count,
        subjects = manifest.counts.subject_count,
        rows_rejected = manifest.counts.rows_rejected,
        cells_changed = manifest.counts.cells_changed,
        "loaded decode run manifest"
    );

    for warning in &manifest.warnings {
        warn!(run_id = %manifest.run_id, "{warning}");
    }

    Ok(())
}

fn find_latest_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut manifests = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();

        let is_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("decode_run_") && name.ends_with(".json"))
            .unwrap_or(false);

        if is_manifest {
            manifests.push(path);
        }
    }

    // Manifest filenames embed a compact UTC timestamp, so lexicographic
    // order is chronological order.
    manifests.sort();

    Ok(manifests.pop())
}
