/// A batch downloader for form-submission files shared through Google Drive.
///
/// The program locates a named Drive folder, finds the response-collecting
/// spreadsheet inside it, reads the submission rows, and downloads each
/// shared file into a per-author local directory, retrying transient
/// failures a bounded number of times.
///
/// # Architecture
///
/// - `Config`: run configuration with documented defaults
/// - `DriveClient` / `SheetsClient`: thin REST clients behind the
///   `DriveApi` / `SheetsApi` traits
/// - `sheet::estimate_range`: corrects the over-reported grid extent
/// - `submission::parse_row`: row validation and file-id extraction
/// - `Downloader`: chunked streaming to disk with percent tracking
/// - `SubmissionProcessor`: bounded-retry loop and outcome aggregation
/// - `Runner`: sequential end-to-end orchestration
pub mod auth;
pub mod config;
pub mod downloader;
pub mod drive;
pub mod error;
pub mod processor;
pub mod progress;
pub mod runner;
pub mod sheet;
pub mod submission;

// Re-export commonly used items
pub use config::Config;
pub use downloader::Downloader;
pub use drive::{DriveApi, DriveClient};
pub use error::{AppError, Result};
pub use processor::{RunReport, SubmissionProcessor};
pub use progress::TransferProgress;
pub use runner::Runner;
pub use sheet::{SheetsApi, SheetsClient};
pub use submission::Submission;
