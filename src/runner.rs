use crate::config::Config;
use crate::downloader::Downloader;
use crate::drive::DriveApi;
use crate::error::{AppError, Result};
use crate::processor::{RunReport, SubmissionProcessor};
use crate::sheet::{estimate_range, SheetsApi};
use tracing::{info, warn};

/// End-to-end orchestration of one fetch run.
///
/// Locates the configured folder, picks the response spreadsheet inside
/// it, estimates the data range, and hands the rows to the submission
/// processor. Everything is strictly sequential.
pub struct Runner<'a> {
    drive: &'a dyn DriveApi,
    sheets: &'a dyn SheetsApi,
    config: &'a Config,
}

impl<'a> Runner<'a> {
    pub fn new(drive: &'a dyn DriveApi, sheets: &'a dyn SheetsApi, config: &'a Config) -> Self {
        Self {
            drive,
            sheets,
            config,
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let folders = self.drive.list_folders(&self.config.folder_name).await?;
        let folder = folders.into_iter().next().ok_or_else(|| {
            AppError::NotFound(format!("no folder named '{}'", self.config.folder_name))
        })?;
        info!(name = folder.name, id = folder.id, "folder found");

        let files = self.drive.list_children(&folder.id).await?;
        let sheet = files
            .into_iter()
            .find(|file| file.name.contains(&self.config.sheet_marker));
        let sheet = match sheet {
            Some(sheet) => sheet,
            None => {
                info!(
                    marker = self.config.sheet_marker,
                    "no submissions found: folder has no response spreadsheet"
                );
                return Ok(RunReport::default());
            }
        };
        info!(name = sheet.name, id = sheet.id, "response sheet located");

        let shape = self.sheets.grid_shape(&sheet.id).await?;
        info!(
            rows = shape.row_count,
            cols = shape.column_count,
            "sheet shape"
        );
        let range = estimate_range(shape.row_count, shape.column_count, self.config.forced_rows)?;
        info!(range = %range, "estimated data range");

        let rows = self.sheets.values(&sheet.id, &range.to_string()).await?;
        if rows.is_empty() {
            info!("no data found in estimated range");
            return Ok(RunReport::default());
        }

        let downloader = Downloader::new(self.config.dest_dir.clone());
        let processor = SubmissionProcessor::new(self.drive, &downloader, self.config);
        let report = processor.process_rows(&rows).await?;

        info!(
            downloaded = report.successes,
            total = report.outcomes.len(),
            "run complete"
        );
        for entry in &report.watch_list {
            warn!(author = entry.author, reason = entry.reason, "file to watch");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{ByteStream, DriveFile, FileMetadata};
    use crate::sheet::GridShape;
    use bytes::Bytes;
    use futures::stream;
    use std::sync::Mutex;

    /// One fake standing in for both services, happy-path by default.
    struct FakeServices {
        folders: Vec<DriveFile>,
        files: Vec<DriveFile>,
        shape: GridShape,
        rows: Vec<Vec<String>>,
        requested_ranges: Mutex<Vec<String>>,
    }

    impl Default for FakeServices {
        fn default() -> Self {
            Self {
                folders: vec![DriveFile {
                    id: String::from("folder-1"),
                    name: String::from("Desafio 8"),
                }],
                files: vec![
                    DriveFile {
                        id: String::from("doc-1"),
                        name: String::from("Enunciado"),
                    },
                    DriveFile {
                        id: String::from("sheet-1"),
                        name: String::from("Desafio 8 (respostas)"),
                    },
                ],
                shape: GridShape {
                    row_count: 136,
                    column_count: 32,
                },
                rows: vec![vec![
                    String::from("t1"),
                    String::from("-"),
                    String::from("Alice"),
                    String::from("https://host/x?id=F1"),
                ]],
                requested_ranges: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl DriveApi for FakeServices {
        async fn list_folders(&self, _name: &str) -> Result<Vec<DriveFile>> {
            Ok(self.folders.clone())
        }

        async fn list_children(&self, _folder_id: &str) -> Result<Vec<DriveFile>> {
            Ok(self.files.clone())
        }

        async fn file_metadata(&self, file_id: &str) -> Result<FileMetadata> {
            Ok(FileMetadata {
                id: file_id.to_string(),
                name: format!("{file_id}.bin"),
                created_time: None,
                size: 4,
            })
        }

        async fn fetch_content(&self, _file_id: &str) -> Result<ByteStream> {
            Ok(Box::pin(stream::iter(vec![Ok(Bytes::from_static(
                b"data",
            ))])))
        }
    }

    #[async_trait::async_trait]
    impl SheetsApi for FakeServices {
        async fn grid_shape(&self, _spreadsheet_id: &str) -> Result<GridShape> {
            Ok(self.shape)
        }

        async fn values(&self, _spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
            self.requested_ranges.lock().unwrap().push(range.to_string());
            Ok(self.rows.clone())
        }
    }

    fn test_config(dest: &std::path::Path) -> Config {
        Config {
            dest_dir: dest.to_path_buf(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn happy_path_downloads_and_requests_corrected_range() {
        let dir = tempfile::tempdir().unwrap();
        let services = FakeServices::default();
        let config = test_config(dir.path());

        let report = Runner::new(&services, &services, &config).run().await.unwrap();

        assert_eq!(report.successes, 1);
        assert!(dir.path().join("Alice/F1.bin").is_file());
        let ranges = services.requested_ranges.lock().unwrap();
        assert_eq!(ranges.as_slice(), ["A2:Z36"]);
    }

    #[tokio::test]
    async fn missing_folder_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let services = FakeServices {
            folders: vec![],
            ..FakeServices::default()
        };
        let config = test_config(dir.path());

        let err = Runner::new(&services, &services, &config).run().await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn no_marker_match_completes_with_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let services = FakeServices {
            files: vec![DriveFile {
                id: String::from("doc-1"),
                name: String::from("Enunciado"),
            }],
            ..FakeServices::default()
        };
        let config = test_config(dir.path());

        let report = Runner::new(&services, &services, &config).run().await.unwrap();
        assert_eq!(report.successes, 0);
        assert!(report.outcomes.is_empty());
        assert!(report.watch_list.is_empty());
    }

    #[tokio::test]
    async fn empty_value_range_completes_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let services = FakeServices {
            rows: vec![],
            ..FakeServices::default()
        };
        let config = test_config(dir.path());

        let report = Runner::new(&services, &services, &config).run().await.unwrap();
        assert!(report.outcomes.is_empty());
    }
}
