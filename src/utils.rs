use chrono::{Local, NaiveDate, NaiveTime};
use indicatif::{ProgressBar, ProgressStyle};

/// Format a calendar date the way the manifest's `creation-date` expects it.
///
/// Only the date is recorded, so the time part is always midnight.
pub fn format_creation_date(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// Creation date for the current run, taken from the local clock
pub fn creation_date() -> String {
    format_creation_date(Local::now().date_naive())
}

/// Parse a delimiter argument: a single ASCII character, or `\t` / `tab`
pub fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "tab" | "\t" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err("DELIMITER must be a single ASCII character".to_string()),
        },
    }
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
