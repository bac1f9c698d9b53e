use serde::Deserialize;
use std::path::PathBuf;

/// Configuration management for the application.
///
/// Every knob that used to be a module-level constant in earlier revisions
/// lives here and is passed explicitly into the runner.

/// Configuration for the submission fetcher.
///
/// # Examples
///
/// ```
/// use drive_fetch::Config;
///
/// let config = Config::default();
/// assert!(config.max_attempts > 0);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Exact name of the Drive folder holding the submissions.
    pub folder_name: String,
    /// Substring marking the response spreadsheet inside the folder.
    pub sheet_marker: String,
    /// Root directory for downloaded files; one subdirectory per author.
    pub dest_dir: PathBuf,
    /// Path of the persisted OAuth token file.
    pub token_path: PathBuf,
    /// Manual floor for the estimated last data row. Compensates for rows
    /// added outside the normal form-submission flow.
    pub forced_rows: u32,
    /// Retry budget per submission download.
    pub max_attempts: u32,
    /// When true, a malformed row aborts the whole run instead of being
    /// recorded in the watch list and skipped.
    pub abort_on_invalid_row: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folder_name: String::from("Desafio 8"),
            sheet_marker: String::from("(respostas)"),
            dest_dir: PathBuf::from("./Files"),
            token_path: PathBuf::from("token.json"),
            forced_rows: 0,
            max_attempts: 5,
            abort_on_invalid_row: false,
        }
    }
}
