use std::path::PathBuf;

/// Errors that abort a manifest conversion run
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Input table not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Failed to open input table ({}): {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input table is missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("Failed to parse input table at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Row at line {line} has no filename")]
    MissingFilename { line: u64 },

    #[error("There are no annotation rows for image {index}")]
    EmptyGroup { index: usize },

    #[error("Failed to write manifest: {0}")]
    OutputWrite(#[from] std::io::Error),

    #[error("Failed to serialize manifest record for {source_ref}: {source}")]
    Serialization {
        source_ref: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ManifestError>;

impl ManifestError {
    /// Wrap a csv reader error, keeping the line it was raised on
    pub(crate) fn from_csv(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line()).unwrap_or(0);
        let message = match err.kind() {
            csv::ErrorKind::Deserialize { err, .. } => match err.field() {
                Some(field) => format!("field {}: {}", field + 1, err.kind()),
                None => err.kind().to_string(),
            },
            _ => err.to_string(),
        };
        ManifestError::Parse { line, message }
    }
}
