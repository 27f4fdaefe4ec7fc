use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Sub;
use std::str::FromStr;

// Columns the input table must provide
pub const REQUIRED_COLUMNS: &[&str] = &[
    "filename", "class", "xmin", "xmax", "ymin", "ymax", "width", "height",
];

pub const DAMAGE_LABEL: &str = "Damage";
pub const OK_LABEL: &str = "Ok";

// Images are assumed to be RGB
pub const IMAGE_DEPTH: u8 = 3;

pub const ANNOTATION_TYPE: &str = "groundtruth/object-detection";
pub const DEFAULT_JOB_NAME: &str = "Python custom manifest creator";

/// A numeric table cell, kept as an integer whenever the source text was one
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(v) => v as f64,
            Numeric::Float(v) => v,
        }
    }
}

impl Sub for Numeric {
    type Output = Numeric;

    fn sub(self, rhs: Numeric) -> Numeric {
        match (self, rhs) {
            (Numeric::Int(a), Numeric::Int(b)) => match a.checked_sub(b) {
                Some(v) => Numeric::Int(v),
                None => Numeric::Float(a as f64 - b as f64),
            },
            (a, b) => Numeric::Float(a.as_f64() - b.as_f64()),
        }
    }
}

impl FromStr for Numeric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(v) = s.parse::<i64>() {
            return Ok(Numeric::Int(v));
        }
        s.parse::<f64>()
            .map(Numeric::Float)
            .map_err(|_| format!("invalid number: {:?}", s))
    }
}

// serde_json writes non-finite floats as null
impl Serialize for Numeric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Numeric::Int(v) => serializer.serialize_i64(v),
            Numeric::Float(v) => serializer.serialize_f64(v),
        }
    }
}

/// One labeled object in one image, as read from the input table
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRow {
    pub filename: String,
    pub class: Option<String>,
    pub xmin: Option<Numeric>,
    pub xmax: Option<Numeric>,
    pub ymin: Option<Numeric>,
    pub ymax: Option<Numeric>,
    pub width: Option<Numeric>,
    pub height: Option<Numeric>,
    pub class_id: u8,
}

/// Box position and size in pixels, derived from the min/max coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxGeometry {
    pub top: Option<Numeric>,
    pub left: Option<Numeric>,
    pub width: Option<Numeric>,
    pub height: Option<Numeric>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRow {
    pub row: AnnotationRow,
    pub bbox: BoxGeometry,
}

/// All rows sharing one image filename, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGroup {
    pub filename: String,
    pub rows: Vec<GeometryRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSize {
    pub width: Option<Numeric>,
    pub height: Option<Numeric>,
    pub depth: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestAnnotation {
    pub class_id: u8,
    pub top: Option<Numeric>,
    pub left: Option<Numeric>,
    pub width: Option<Numeric>,
    pub height: Option<Numeric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageEntry {
    pub image_size: [ImageSize; 1],
    pub annotations: Vec<ManifestAnnotation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectConfidence {
    pub confidence: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageMetadata {
    pub objects: Vec<ObjectConfidence>,
    pub class_map: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub annotation_type: String,
    pub human_annotated: String,
    pub creation_date: String,
    pub job_name: String,
}

/// The class-id to label mapping written into every record
pub fn class_map() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("0".to_string(), OK_LABEL.to_string()),
        ("1".to_string(), DAMAGE_LABEL.to_string()),
    ])
}

/// One manifest line describing a single image
///
/// Serialized as an object with three keys: `source-ref`, `image-<n>` and
/// `image-<n>-metadata`, where `n` is the image index within the run.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRecord {
    pub source_ref: String,
    pub image_index: usize,
    pub image: ImageEntry,
    pub metadata: ImageMetadata,
}

impl ManifestRecord {
    pub fn image_id(&self) -> String {
        format!("image-{}", self.image_index)
    }

    pub fn metadata_key(&self) -> String {
        format!("{}-metadata", self.image_id())
    }
}

impl Serialize for ManifestRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("source-ref", &self.source_ref)?;
        map.serialize_entry(&self.image_id(), &self.image)?;
        map.serialize_entry(&self.metadata_key(), &self.metadata)?;
        map.end()
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessingStats {
    pub rows_loaded: usize,
    pub empty_rows_dropped: usize,
    pub images_written: usize,
    pub annotations_written: usize,
    pub unrecognized_classes: usize,
}

impl ProcessingStats {
    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Rows loaded: {}", self.rows_loaded);
        log::info!("Empty rows dropped: {}", self.empty_rows_dropped);
        log::info!("Images written: {}", self.images_written);
        log::info!("Annotations written: {}", self.annotations_written);
        if self.unrecognized_classes > 0 {
            log::warn!(
                "Rows with a class other than {:?} or {:?} (written as class 0): {}",
                OK_LABEL,
                DAMAGE_LABEL,
                self.unrecognized_classes
            );
        }
    }
}
