use crate::drive::DriveApi;
use crate::error::{AppError, Result};
use crate::progress::TransferProgress;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Streams Drive files to per-author directories on local disk.
pub struct Downloader {
    dest_dir: PathBuf,
}

/// Checks that a value is usable as one path component.
///
/// Authors come from sheet cells and filenames from remote metadata;
/// neither is trusted to stay inside the destination root on its own.
fn safe_component(value: &str) -> Result<&str> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(AppError::Validation(format!(
            "unsafe path component: {value:?}"
        )));
    }
    Ok(value)
}

impl Downloader {
    pub fn new(dest_dir: PathBuf) -> Self {
        Self { dest_dir }
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Downloads one file into `<dest_dir>/<author>/<filename>`, creating
    /// the author directory on first use.
    ///
    /// `expected_bytes` is the metadata-reported size; cumulative percent
    /// complete is tracked against it after every chunk. Returns the final
    /// percent, which only reaches 100 when the whole body arrived.
    pub async fn download(
        &self,
        drive: &dyn DriveApi,
        file_id: &str,
        author: &str,
        filename: &str,
        expected_bytes: u64,
    ) -> Result<u8> {
        let author_dir = self.dest_dir.join(safe_component(author)?);
        let path = author_dir.join(safe_component(filename)?);
        if !author_dir.is_dir() {
            info!(dir = %author_dir.display(), "creating author folder");
            tokio::fs::create_dir_all(&author_dir).await?;
        }

        let mut file = tokio::fs::File::create(&path).await?;
        let mut stream = drive.fetch_content(file_id).await?;
        let mut progress = TransferProgress::new(expected_bytes);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            let percent = progress.advance(chunk.len() as u64);
            debug!(percent, file = filename, "download progress");
        }
        file.flush().await?;

        info!(
            file = filename,
            author,
            bytes = progress.received_bytes(),
            percent = progress.percent(),
            "download finished"
        );
        Ok(progress.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{ByteStream, DriveFile, FileMetadata};
    use crate::error::AppError;
    use bytes::Bytes;
    use futures::stream;

    /// Drive fake that serves one fixed body, or fails mid-stream.
    struct FixedContent {
        chunks: Vec<std::result::Result<Vec<u8>, ()>>,
    }

    #[async_trait::async_trait]
    impl DriveApi for FixedContent {
        async fn list_folders(&self, _name: &str) -> Result<Vec<DriveFile>> {
            unimplemented!("not used by downloader tests")
        }

        async fn list_children(&self, _folder_id: &str) -> Result<Vec<DriveFile>> {
            unimplemented!("not used by downloader tests")
        }

        async fn file_metadata(&self, _file_id: &str) -> Result<FileMetadata> {
            unimplemented!("not used by downloader tests")
        }

        async fn fetch_content(&self, _file_id: &str) -> Result<ByteStream> {
            let items: Vec<Result<Bytes>> = self
                .chunks
                .iter()
                .map(|chunk| match chunk {
                    Ok(data) => Ok(Bytes::from(data.clone())),
                    Err(()) => Err(AppError::Validation(String::from("stream broke"))),
                })
                .collect();
            Ok(Box::pin(stream::iter(items)))
        }
    }

    #[tokio::test]
    async fn writes_file_under_author_directory() {
        let dir = tempfile::tempdir().unwrap();
        let drive = FixedContent {
            chunks: vec![Ok(b"abc".to_vec()), Ok(b"def".to_vec())],
        };
        let downloader = Downloader::new(dir.path().to_path_buf());

        let percent = downloader
            .download(&drive, "f1", "Alice", "essay.pdf", 6)
            .await
            .unwrap();

        assert_eq!(percent, 100);
        let written = std::fs::read(dir.path().join("Alice/essay.pdf")).unwrap();
        assert_eq!(written, b"abcdef");
    }

    #[tokio::test]
    async fn partial_body_reports_partial_percent() {
        let dir = tempfile::tempdir().unwrap();
        let drive = FixedContent {
            chunks: vec![Ok(b"abc".to_vec())],
        };
        let downloader = Downloader::new(dir.path().to_path_buf());

        let percent = downloader
            .download(&drive, "f1", "Bob", "half.bin", 6)
            .await
            .unwrap();
        assert_eq!(percent, 50);
    }

    #[tokio::test]
    async fn author_escaping_dest_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let drive = FixedContent { chunks: vec![] };
        let downloader = Downloader::new(dir.path().join("root"));

        let err = downloader
            .download(&drive, "f1", "../outside", "essay.pdf", 6)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got: {err:?}");
        assert!(!dir.path().join("outside").exists());
    }

    #[tokio::test]
    async fn filename_with_separator_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let drive = FixedContent { chunks: vec![] };
        let downloader = Downloader::new(dir.path().to_path_buf());

        let err = downloader
            .download(&drive, "f1", "Alice", "nested/essay.pdf", 6)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got: {err:?}");
        // Nothing gets created for a rejected submission.
        assert!(!dir.path().join("Alice").exists());
    }

    #[tokio::test]
    async fn mid_stream_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let drive = FixedContent {
            chunks: vec![Ok(b"abc".to_vec()), Err(())],
        };
        let downloader = Downloader::new(dir.path().to_path_buf());

        let err = downloader
            .download(&drive, "f1", "Bob", "broken.bin", 6)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
