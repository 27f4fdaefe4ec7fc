use log::{info, warn};
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::Args;
use crate::conversion::apply_box_geometry;
use crate::error::Result;
use crate::io::{load_annotations, save_manifest};
use crate::manifest::{build_manifest_records, ManifestOptions};
use crate::types::{AnnotationRow, ProcessingStats, DAMAGE_LABEL, OK_LABEL};
use crate::utils::creation_date;

/// Run the whole conversion described by the command-line arguments
pub fn process_dataset(args: &Args) -> Result<ProcessingStats> {
    let options = ManifestOptions {
        source_prefix: args.source_prefix.clone(),
        creation_date: creation_date(),
        job_name: args.job_name.clone(),
    };

    convert_table(&args.csv_file, &args.manifest_file, args.delimiter, &options)
}

/// Load the table at `csv_file`, build its records and write them to `manifest_file`
pub fn convert_table(
    csv_file: &Path,
    manifest_file: &Path,
    delimiter: u8,
    options: &ManifestOptions,
) -> Result<ProcessingStats> {
    let loaded = load_annotations(csv_file, delimiter)?;
    info!(
        "Loaded {} annotation rows ({} empty rows dropped).",
        loaded.rows.len(),
        loaded.empty_rows_dropped
    );

    let mut stats = ProcessingStats {
        rows_loaded: loaded.rows.len(),
        empty_rows_dropped: loaded.empty_rows_dropped,
        unrecognized_classes: count_unrecognized_classes(&loaded.rows),
        ..ProcessingStats::default()
    };

    let rows = apply_box_geometry(loaded.rows);
    let records = build_manifest_records(rows, options)?;
    info!("Built {} manifest records.", records.len());

    save_manifest(manifest_file, &records)?;

    stats.images_written = records.len();
    stats.annotations_written = records.iter().map(|r| r.image.annotations.len()).sum();
    Ok(stats)
}

// Classes other than the two known labels still map to 0; report them once each
fn count_unrecognized_classes(rows: &[AnnotationRow]) -> usize {
    let unrecognized: Vec<&str> = rows
        .iter()
        .filter_map(|row| row.class.as_deref())
        .filter(|class| *class != OK_LABEL && *class != DAMAGE_LABEL)
        .collect();

    let distinct: BTreeSet<&str> = unrecognized.iter().copied().collect();
    for class in distinct {
        warn!("Unrecognized class {:?} will be written as class 0", class);
    }

    unrecognized.len()
}
