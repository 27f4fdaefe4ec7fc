//! Grouping of annotation rows by image and construction of manifest records

use std::collections::HashMap;

use crate::error::{ManifestError, Result};
use crate::types::{
    class_map, GeometryRow, ImageEntry, ImageGroup, ImageMetadata, ImageSize, ManifestAnnotation,
    ManifestRecord, ObjectConfidence, ANNOTATION_TYPE, DEFAULT_JOB_NAME, IMAGE_DEPTH,
};

/// Values shared by every record of one run
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestOptions {
    /// Object storage location prepended to each filename
    pub source_prefix: String,
    pub creation_date: String,
    pub job_name: String,
}

impl ManifestOptions {
    pub fn new(source_prefix: impl Into<String>, creation_date: impl Into<String>) -> Self {
        Self {
            source_prefix: source_prefix.into(),
            creation_date: creation_date.into(),
            job_name: DEFAULT_JOB_NAME.to_string(),
        }
    }
}

/// Partition rows by filename, in order of first appearance
pub fn group_by_filename(rows: Vec<GeometryRow>) -> Vec<ImageGroup> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<ImageGroup> = Vec::new();

    for row in rows {
        match positions.get(&row.row.filename) {
            Some(&index) => groups[index].rows.push(row),
            None => {
                positions.insert(row.row.filename.clone(), groups.len());
                groups.push(ImageGroup {
                    filename: row.row.filename.clone(),
                    rows: vec![row],
                });
            }
        }
    }

    groups
}

/// Build the manifest record of one image.
///
/// Image size and filename come from the first row of the group.
pub fn build_manifest_record(
    group: &ImageGroup,
    index: usize,
    options: &ManifestOptions,
) -> Result<ManifestRecord> {
    let first = group
        .rows
        .first()
        .ok_or(ManifestError::EmptyGroup { index })?;

    let annotations = group
        .rows
        .iter()
        .map(|r| ManifestAnnotation {
            class_id: r.row.class_id,
            top: r.bbox.top,
            left: r.bbox.left,
            width: r.bbox.width,
            height: r.bbox.height,
        })
        .collect();

    Ok(ManifestRecord {
        source_ref: format!("{}{}", options.source_prefix, first.row.filename),
        image_index: index,
        image: ImageEntry {
            image_size: [ImageSize {
                width: first.row.width,
                height: first.row.height,
                depth: IMAGE_DEPTH,
            }],
            annotations,
        },
        metadata: ImageMetadata {
            objects: vec![ObjectConfidence { confidence: 1 }; group.rows.len()],
            class_map: class_map(),
            annotation_type: ANNOTATION_TYPE.to_string(),
            human_annotated: "yes".to_string(),
            creation_date: options.creation_date.clone(),
            job_name: options.job_name.clone(),
        },
    })
}

/// Build one record per distinct filename
pub fn build_manifest_records(
    rows: Vec<GeometryRow>,
    options: &ManifestOptions,
) -> Result<Vec<ManifestRecord>> {
    group_by_filename(rows)
        .iter()
        .enumerate()
        .map(|(index, group)| build_manifest_record(group, index, options))
        .collect()
}
