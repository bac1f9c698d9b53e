use crate::config::Config;
use crate::downloader::Downloader;
use crate::drive::DriveApi;
use crate::error::AppError;
use crate::error::Result;
use crate::submission::{parse_row, Submission};
use tracing::{info, warn};

/// Bounded-retry processing of submission rows.
///
/// Each row is carried to a terminal state before the next one starts:
/// either the download reaches 100 percent, the remote file turns out to
/// be empty, or the retry budget runs out. Only empty files (and, by
/// default, malformed rows) end up in the final watch list; rows that
/// merely exhausted their retries are warned about and dropped from the
/// report.

/// Per-submission lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Pending,
    Fetching,
    Succeeded,
    GivingUp,
}

/// Structured result of one download attempt.
#[derive(Debug)]
pub struct AttemptResult {
    pub completed: bool,
    pub percent: u8,
    pub error: Option<String>,
}

/// Terminal record for one submission.
#[derive(Debug)]
pub struct RetryOutcome {
    pub author: String,
    pub attempts_used: u32,
    pub succeeded: bool,
    pub last_error: Option<String>,
}

/// A row the end-of-run report should call out.
#[derive(Debug, PartialEq, Eq)]
pub struct WatchEntry {
    pub author: String,
    pub reason: String,
}

/// Aggregate of a whole processing run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub successes: usize,
    pub watch_list: Vec<WatchEntry>,
    pub outcomes: Vec<RetryOutcome>,
}

pub struct SubmissionProcessor<'a> {
    drive: &'a dyn DriveApi,
    downloader: &'a Downloader,
    config: &'a Config,
}

impl<'a> SubmissionProcessor<'a> {
    pub fn new(drive: &'a dyn DriveApi, downloader: &'a Downloader, config: &'a Config) -> Self {
        Self {
            drive,
            downloader,
            config,
        }
    }

    /// Processes spreadsheet rows top to bottom.
    ///
    /// Malformed rows are recorded in the watch list and skipped unless
    /// `abort_on_invalid_row` is set, in which case the first one fails
    /// the whole run.
    pub async fn process_rows(&self, rows: &[Vec<String>]) -> Result<RunReport> {
        info!(count = rows.len(), "submissions to process");
        let mut report = RunReport::default();

        for (index, row) in rows.iter().enumerate() {
            let submission = match parse_row(row) {
                Ok(submission) => submission,
                Err(err) if self.config.abort_on_invalid_row => return Err(err),
                Err(err) => {
                    // Sheet data starts at row 2, so index 0 is row 2.
                    let author = row
                        .get(2)
                        .cloned()
                        .unwrap_or_else(|| format!("row {}", index + 2));
                    warn!(author, error = %err, "skipping malformed row");
                    report.watch_list.push(WatchEntry {
                        author,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            self.process_submission(&submission, &mut report).await;
        }

        Ok(report)
    }

    /// Drives one submission to a terminal state.
    async fn process_submission(&self, submission: &Submission, report: &mut RunReport) {
        info!(
            author = submission.author,
            url = submission.source_url,
            "processing submission"
        );

        let mut state = SubmissionState::Pending;
        let mut attempts_remaining = self.config.max_attempts;
        let mut attempts_used = 0;
        let mut last_error = None;
        let mut percent = 0u8;

        while percent < 100 && attempts_remaining > 0 {
            state = SubmissionState::Fetching;
            attempts_used += 1;

            match self.attempt(submission).await {
                Ok(attempt) if attempt.completed && attempt.percent >= 100 => {
                    state = SubmissionState::Succeeded;
                    percent = attempt.percent;
                }
                Ok(attempt) => {
                    percent = attempt.percent;
                    last_error = attempt.error;
                    attempts_remaining -= 1;
                    if attempts_remaining == 0 {
                        state = SubmissionState::GivingUp;
                        warn!(
                            author = submission.author,
                            attempts = attempts_used,
                            last_error = last_error.as_deref().unwrap_or("incomplete transfer"),
                            "giving up on submission"
                        );
                    }
                }
                // An empty remote file never gets better; skip the rest of
                // the retry budget and put the row on the watch list.
                Err(err @ AppError::EmptyFile(_)) => {
                    warn!(author = submission.author, error = %err, "empty remote file");
                    report.watch_list.push(WatchEntry {
                        author: submission.author.clone(),
                        reason: err.to_string(),
                    });
                    report.outcomes.push(RetryOutcome {
                        author: submission.author.clone(),
                        attempts_used,
                        succeeded: false,
                        last_error: Some(err.to_string()),
                    });
                    return;
                }
                Err(err) => {
                    last_error = Some(err.to_string());
                    attempts_remaining -= 1;
                    if attempts_remaining == 0 {
                        state = SubmissionState::GivingUp;
                        warn!(
                            author = submission.author,
                            attempts = attempts_used,
                            error = %err,
                            "giving up on submission"
                        );
                    }
                }
            }
        }

        let succeeded = state == SubmissionState::Succeeded;
        if succeeded {
            report.successes += 1;
        }
        report.outcomes.push(RetryOutcome {
            author: submission.author.clone(),
            attempts_used,
            succeeded,
            last_error,
        });
    }

    /// One metadata-fetch-plus-download attempt.
    ///
    /// Failures come back as a failed `AttemptResult` so the caller's
    /// retry accounting stays in one place; an empty remote file is the
    /// only error that escapes, since it is terminal.
    async fn attempt(&self, submission: &Submission) -> Result<AttemptResult> {
        let metadata = match self.drive.file_metadata(&submission.file_id).await {
            Ok(metadata) => metadata,
            Err(err) => {
                return Ok(AttemptResult {
                    completed: false,
                    percent: 0,
                    error: Some(err.to_string()),
                })
            }
        };

        info!(
            file = metadata.name,
            bytes = metadata.size,
            id = metadata.id,
            timestamp = submission.timestamp,
            "found file"
        );

        if metadata.size == 0 {
            return Err(AppError::EmptyFile(format!(
                "{} uploaded by {} is zero bytes",
                metadata.name, submission.author
            )));
        }

        match self
            .downloader
            .download(
                self.drive,
                &submission.file_id,
                &submission.author,
                &metadata.name,
                metadata.size,
            )
            .await
        {
            Ok(percent) => Ok(AttemptResult {
                completed: percent >= 100,
                percent,
                error: None,
            }),
            Err(err) => Ok(AttemptResult {
                completed: false,
                percent: 0,
                error: Some(err.to_string()),
            }),
        }
    }
}
