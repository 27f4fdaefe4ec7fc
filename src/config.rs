use clap::Parser;
use std::path::PathBuf;

use crate::types::DEFAULT_JOB_NAME;
use crate::utils::parse_delimiter;

/// Command-line arguments for converting a CSV annotation table into a
/// SageMaker Ground Truth object-detection manifest.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Delimited table with filename, class, xmin, xmax, ymin, ymax, width and height columns
    #[arg(short = 'i', long = "csv_file")]
    pub csv_file: PathBuf,

    /// Manifest file to create (overwritten if it exists)
    #[arg(short = 'o', long = "manifest_file")]
    pub manifest_file: PathBuf,

    /// Object storage location prepended to every filename, e.g. s3://bucket/container-train/
    #[arg(short = 'b', long = "source_prefix")]
    pub source_prefix: String,

    /// Field delimiter of the input table: a single character, or 'tab'
    #[arg(long = "delimiter", default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Value written to every record's job-name field
    #[arg(long = "job_name", default_value = DEFAULT_JOB_NAME)]
    pub job_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_defaults() {
        let args = Args::try_parse_from([
            "csv2manifest",
            "-i",
            "train/_annotations.csv",
            "-o",
            "train.manifest",
            "-b",
            "s3://bucket/container-train/",
        ])
        .unwrap();

        assert_eq!(args.csv_file, PathBuf::from("train/_annotations.csv"));
        assert_eq!(args.manifest_file, PathBuf::from("train.manifest"));
        assert_eq!(args.source_prefix, "s3://bucket/container-train/");
        assert_eq!(args.delimiter, b',');
        assert_eq!(args.job_name, DEFAULT_JOB_NAME);
    }

    #[test]
    fn test_parse_args_overrides() {
        let args = Args::try_parse_from([
            "csv2manifest",
            "--csv_file",
            "a.tsv",
            "--manifest_file",
            "a.manifest",
            "--source_prefix",
            "s3://b/",
            "--delimiter",
            "tab",
            "--job_name",
            "container-damage",
        ])
        .unwrap();

        assert_eq!(args.delimiter, b'\t');
        assert_eq!(args.job_name, "container-damage");
    }

    #[test]
    fn test_source_prefix_is_required() {
        assert!(Args::try_parse_from(["csv2manifest", "-i", "a.csv", "-o", "a.manifest"]).is_err());
    }
}
