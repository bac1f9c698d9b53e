use crate::error::{AppError, Result};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Deserialize;
use url::Url;

/// Google Drive v3 integration.
///
/// The REST surface we need is tiny: folder lookup by name, folder listing,
/// file metadata, and media download. It is expressed as a trait so the
/// processing pipeline can be driven by a scripted fake in tests.

pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Stream of raw body chunks from a media download.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

#[derive(Debug, Clone, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
}

/// Metadata for a single Drive file, as returned by `files.get`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_time: Option<String>,
    /// Drive reports size as a decimal string; folders and Google-native
    /// documents omit it entirely.
    #[serde(default, deserialize_with = "de_size")]
    pub size: u64,
}

fn de_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeRepr {
        Text(String),
        Number(u64),
    }
    match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Number(n) => Ok(n),
        SizeRepr::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Client-side view of the Drive API.
#[async_trait::async_trait]
pub trait DriveApi: Send + Sync {
    /// Lists folders whose name matches `name` exactly.
    async fn list_folders(&self, name: &str) -> Result<Vec<DriveFile>>;

    /// Lists the files directly inside the given folder.
    async fn list_children(&self, folder_id: &str) -> Result<Vec<DriveFile>>;

    /// Fetches id, name, creation time and size for one file.
    async fn file_metadata(&self, file_id: &str) -> Result<FileMetadata>;

    /// Opens a chunked download of the file content.
    async fn fetch_content(&self, file_id: &str) -> Result<ByteStream>;
}

/// reqwest-backed Drive client using a bearer token.
pub struct DriveClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DriveClient {
    pub fn new(client: reqwest::Client, token: String) -> Self {
        Self::with_base_url(client, token, DRIVE_BASE_URL.to_string())
    }

    pub fn with_base_url(client: reqwest::Client, token: String, base_url: String) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    async fn list(&self, query: &str) -> Result<Vec<DriveFile>> {
        let endpoint = Url::parse(&format!("{}/files", self.base_url))?;
        let response = self
            .client
            .get(endpoint.clone())
            .bearer_auth(&self.token)
            .query(&[
                ("q", query),
                ("pageSize", "20"),
                ("fields", "nextPageToken, files(id, name)"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::Api {
                status: response.status(),
                endpoint: endpoint.to_string(),
            });
        }
        let list: FileList = response.json().await?;
        Ok(list.files)
    }
}

#[async_trait::async_trait]
impl DriveApi for DriveClient {
    async fn list_folders(&self, name: &str) -> Result<Vec<DriveFile>> {
        self.list(&format!(
            "mimeType = '{FOLDER_MIME_TYPE}' and name = '{name}'"
        ))
        .await
    }

    async fn list_children(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        self.list(&format!("'{folder_id}' in parents")).await
    }

    async fn file_metadata(&self, file_id: &str) -> Result<FileMetadata> {
        let endpoint = Url::parse(&format!("{}/files/{}", self.base_url, file_id))?;
        let response = self
            .client
            .get(endpoint)
            .bearer_auth(&self.token)
            .query(&[("fields", "id,name,createdTime,size")])
            .send()
            .await
            .map_err(AppError::Transfer)?
            .error_for_status()
            .map_err(AppError::Transfer)?;
        Ok(response.json().await?)
    }

    async fn fetch_content(&self, file_id: &str) -> Result<ByteStream> {
        let endpoint = Url::parse(&format!("{}/files/{}", self.base_url, file_id))?;
        let response = self
            .client
            .get(endpoint)
            .bearer_auth(&self.token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(AppError::Transfer)?
            .error_for_status()
            .map_err(AppError::Transfer)?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(AppError::Transfer))
            .boxed())
    }
}
