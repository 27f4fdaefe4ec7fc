use log::{debug, info};
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use crate::conversion::class_id_for;
use crate::error::{ManifestError, Result};
use crate::types::{AnnotationRow, ManifestRecord, Numeric, REQUIRED_COLUMNS};
use crate::utils::create_progress_bar;

// A table row before the filename has been checked
#[derive(Debug, Deserialize)]
struct RawRow {
    filename: Option<String>,
    class: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    xmin: Option<Numeric>,
    #[serde(default, deserialize_with = "blank_as_none")]
    xmax: Option<Numeric>,
    #[serde(default, deserialize_with = "blank_as_none")]
    ymin: Option<Numeric>,
    #[serde(default, deserialize_with = "blank_as_none")]
    ymax: Option<Numeric>,
    #[serde(default, deserialize_with = "blank_as_none")]
    width: Option<Numeric>,
    #[serde(default, deserialize_with = "blank_as_none")]
    height: Option<Numeric>,
}

// Numeric cells may be padded; whitespace-only cells are missing values
fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<Numeric>, D::Error>
where
    D: Deserializer<'de>,
{
    let cell: Option<String> = Option::deserialize(deserializer)?;
    match cell.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Rows read from the input table
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadedAnnotations {
    pub rows: Vec<AnnotationRow>,
    pub empty_rows_dropped: usize,
}

/// Open the annotation table at `path` and load it
pub fn load_annotations(path: &Path, delimiter: u8) -> Result<LoadedAnnotations> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ManifestError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => ManifestError::InputRead {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    info!("Reading annotations from {}", path.display());
    read_annotations(file, delimiter)
}

/// Parse a delimited annotation table.
///
/// The header must name every required column. Rows where every field is
/// empty are dropped; other rows keep their missing cells as `None`, including
/// trailing cells left off a short row. Text cells are kept verbatim.
pub fn read_annotations<R: Read>(reader: R, delimiter: u8) -> Result<LoadedAnnotations> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers().map_err(ManifestError::from_csv)?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ManifestError::MissingColumns { columns: missing });
    }

    let mut loaded = LoadedAnnotations::default();
    for result in reader.records() {
        let record = result.map_err(ManifestError::from_csv)?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);

        if record.len() > headers.len() {
            return Err(ManifestError::Parse {
                line,
                message: format!(
                    "found record with {} fields, but the header has {} fields",
                    record.len(),
                    headers.len()
                ),
            });
        }

        if record.iter().all(|field| field.trim().is_empty()) {
            debug!("Dropping empty row at line {}", line);
            loaded.empty_rows_dropped += 1;
            continue;
        }

        let raw: RawRow = record
            .deserialize(Some(&headers))
            .map_err(ManifestError::from_csv)?;
        let filename = raw
            .filename
            .ok_or(ManifestError::MissingFilename { line })?;
        let class_id = class_id_for(raw.class.as_deref());

        loaded.rows.push(AnnotationRow {
            filename,
            class: raw.class,
            xmin: raw.xmin,
            xmax: raw.xmax,
            ymin: raw.ymin,
            ymax: raw.ymax,
            width: raw.width,
            height: raw.height,
            class_id,
        });
    }

    Ok(loaded)
}

/// Write one record as a single JSON line
pub fn write_record<W: Write>(writer: &mut W, record: &ManifestRecord) -> Result<()> {
    serde_json::to_writer(&mut *writer, record).map_err(|e| {
        if e.is_io() {
            ManifestError::OutputWrite(e.into())
        } else {
            ManifestError::Serialization {
                source_ref: record.source_ref.clone(),
                source: e,
            }
        }
    })?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write every record, in order, as newline-delimited JSON
pub fn write_manifest<W: Write>(writer: W, records: &[ManifestRecord]) -> Result<()> {
    write_records(writer, records, |_| {})
}

// Calls `on_record` after each line is written
fn write_records<W, F>(
    mut writer: W,
    records: &[ManifestRecord],
    mut on_record: F,
) -> Result<()>
where
    W: Write,
    F: FnMut(&ManifestRecord),
{
    for record in records {
        write_record(&mut writer, record)?;
        on_record(record);
    }
    writer.flush()?;
    Ok(())
}

/// Create (or truncate) the manifest file at `path` and write the records to it
pub fn save_manifest(path: &Path, records: &[ManifestRecord]) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    let pb = create_progress_bar(records.len() as u64, "Manifest");

    write_records(writer, records, |_| pb.inc(1))?;
    pb.finish_and_clear();

    info!("Wrote {} manifest lines to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Numeric::{Float, Int};

    const HEADER: &str = "filename,width,height,class,xmin,ymin,xmax,ymax\n";

    #[test]
    fn test_read_annotations() {
        let csv = format!(
            "{}a.jpg,100,50,Damage,0,0,10,5\na.jpg,100,50,Ok,2,1,8,4\nb.jpg,640,480,Unknown,1.5,2,3,4\n",
            HEADER
        );

        let loaded = read_annotations(csv.as_bytes(), b',').unwrap();

        assert_eq!(loaded.rows.len(), 3);
        assert_eq!(loaded.empty_rows_dropped, 0);
        assert_eq!(loaded.rows[0].class_id, 1);
        assert_eq!(loaded.rows[1].class_id, 0);
        assert_eq!(loaded.rows[2].class_id, 0);
        assert_eq!(loaded.rows[2].class.as_deref(), Some("Unknown"));
        assert_eq!(loaded.rows[2].xmin, Some(Float(1.5)));
        assert_eq!(loaded.rows[2].width, Some(Int(640)));
    }

    #[test]
    fn test_empty_rows_are_dropped() {
        let csv = format!("{},,,,,,,\na.jpg,100,50,Ok,0,0,1,1\n , , , , , , , \n", HEADER);

        let loaded = read_annotations(csv.as_bytes(), b',').unwrap();

        assert_eq!(loaded.rows.len(), 1);
        assert_eq!(loaded.empty_rows_dropped, 2);
    }

    #[test]
    fn test_partial_rows_keep_missing_cells() {
        let csv = format!("{}a.jpg,100,50,,0,,10,5\n", HEADER);

        let loaded = read_annotations(csv.as_bytes(), b',').unwrap();

        let row = &loaded.rows[0];
        assert_eq!(row.class, None);
        assert_eq!(row.class_id, 0);
        assert_eq!(row.ymin, None);
        assert_eq!(row.xmax, Some(Int(10)));
    }

    #[test]
    fn test_short_rows_fill_trailing_cells_with_none() {
        let csv = "filename,class,xmin,xmax,ymin,ymax,width,height\na.jpg,Ok,0,10,0,5,100\n";

        let loaded = read_annotations(csv.as_bytes(), b',').unwrap();

        let row = &loaded.rows[0];
        assert_eq!(row.width, Some(Int(100)));
        assert_eq!(row.height, None);
        assert_eq!(row.ymax, Some(Int(5)));
    }

    #[test]
    fn test_long_rows_are_a_parse_error() {
        let csv = format!("{}a.jpg,100,50,Ok,0,0,1,1,extra\n", HEADER);

        let err = read_annotations(csv.as_bytes(), b',').unwrap_err();

        assert!(matches!(err, ManifestError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_text_cells_are_not_trimmed() {
        let csv = format!("{} a.jpg ,100,50, Damage ,0,0,10,5\n", HEADER);

        let loaded = read_annotations(csv.as_bytes(), b',').unwrap();

        let row = &loaded.rows[0];
        assert_eq!(row.filename, " a.jpg ");
        assert_eq!(row.class.as_deref(), Some(" Damage "));
        assert_eq!(row.class_id, 0);
    }

    #[test]
    fn test_padded_numeric_cells() {
        let csv = format!("{}a.jpg, 100 ,50,Ok, 1.5 ,  ,10,5\n", HEADER);

        let loaded = read_annotations(csv.as_bytes(), b',').unwrap();

        let row = &loaded.rows[0];
        assert_eq!(row.width, Some(Int(100)));
        assert_eq!(row.xmin, Some(Float(1.5)));
        assert_eq!(row.ymin, None);
    }

    #[test]
    fn test_tab_delimited() {
        let tsv = "filename\tclass\txmin\txmax\tymin\tymax\twidth\theight\nc.png\tDamage\t1\t2\t3\t4\t5\t6\n";

        let loaded = read_annotations(tsv.as_bytes(), b'\t').unwrap();

        assert_eq!(loaded.rows[0].filename, "c.png");
        assert_eq!(loaded.rows[0].height, Some(Int(6)));
    }

    #[test]
    fn test_missing_columns() {
        let csv = "filename,class,xmin,xmax\na.jpg,Ok,0,1\n";

        let err = read_annotations(csv.as_bytes(), b',').unwrap_err();

        match err {
            ManifestError::MissingColumns { columns } => {
                assert_eq!(columns, vec!["ymin", "ymax", "width", "height"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_coordinate_is_a_parse_error() {
        let csv = format!("{}a.jpg,100,50,Ok,zero,0,1,1\n", HEADER);

        let err = read_annotations(csv.as_bytes(), b',').unwrap_err();

        assert!(matches!(err, ManifestError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_missing_filename() {
        let csv = format!("{}a.jpg,100,50,Ok,0,0,1,1\n,100,50,Ok,0,0,1,1\n", HEADER);

        let err = read_annotations(csv.as_bytes(), b',').unwrap_err();

        assert!(matches!(err, ManifestError::MissingFilename { line: 3 }));
    }

    #[test]
    fn test_load_annotations_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");

        let err = load_annotations(&path, b',').unwrap_err();

        assert!(matches!(err, ManifestError::InputNotFound { .. }));
    }
}
