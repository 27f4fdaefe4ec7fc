use crate::types::{AnnotationRow, BoxGeometry, GeometryRow, DAMAGE_LABEL};

/// Binary class code: 1 for the damage label, 0 for anything else
pub fn class_id_for(class: Option<&str>) -> u8 {
    match class {
        Some(DAMAGE_LABEL) => 1,
        _ => 0,
    }
}

/// Derive the pixel box of a row from its min/max coordinates.
///
/// A missing coordinate leaves the fields that depend on it empty.
pub fn compute_box_geometry(row: &AnnotationRow) -> BoxGeometry {
    let width = row.xmax.zip(row.xmin).map(|(xmax, xmin)| xmax - xmin);
    let height = row.ymax.zip(row.ymin).map(|(ymax, ymin)| ymax - ymin);
    // ymax - (ymax - ymin), which is ymin
    let top = row.ymax.zip(height).map(|(ymax, height)| ymax - height);

    BoxGeometry {
        top,
        left: row.xmin,
        width,
        height,
    }
}

/// Attach box geometry to every row, keeping order
pub fn apply_box_geometry(rows: Vec<AnnotationRow>) -> Vec<GeometryRow> {
    rows.into_iter()
        .map(|row| {
            let bbox = compute_box_geometry(&row);
            GeometryRow { row, bbox }
        })
        .collect()
}
