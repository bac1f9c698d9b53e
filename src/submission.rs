use crate::error::{AppError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// One row of the response spreadsheet: a participant's file upload.
///
/// Form rows carry the submission timestamp in the first column, the
/// author's name in the third, and the shared-file URL in the last one;
/// whatever sits in between is form questions we do not care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub author: String,
    pub timestamp: String,
    pub source_url: String,
    pub file_id: String,
}

const LINK_SCHEME_MARKER: &str = "https://";

fn file_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r".*id=(.*)$").unwrap())
}

/// Validates a spreadsheet row and extracts the submission it describes.
///
/// Fails with a validation error when the row is too short, the URL does
/// not carry the https scheme marker, or no file id can be extracted.
pub fn parse_row(row: &[String]) -> Result<Submission> {
    if row.len() < 3 {
        return Err(AppError::Validation(format!(
            "row has {} cells, need at least 3",
            row.len()
        )));
    }
    let timestamp = row[0].clone();
    let author = row[2].clone();
    // Unwrap is fine: len >= 3 was just checked.
    let source_url = row.last().unwrap().clone();

    if !source_url.contains(LINK_SCHEME_MARKER) {
        return Err(AppError::Validation(format!(
            "invalid URL for submission {author}: {source_url}"
        )));
    }

    let file_id = file_id_pattern()
        .captures(&source_url)
        .map(|caps| caps[1].to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            AppError::Validation(format!(
                "no file id in URL for submission {author}: {source_url}"
            ))
        })?;

    Ok(Submission {
        author,
        timestamp,
        source_url,
        file_id,
    })
}
