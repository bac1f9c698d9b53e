use crate::error::{AppError, Result};
use serde::Deserialize;
use url::Url;

/// Google Sheets integration and data-range estimation.
///
/// The Sheets API reports a grid extent that is padded past the real data:
/// empirically it adds 6 columns to the right of the last non-empty column
/// and 100 rows below the last non-empty row. `estimate_range` undoes that
/// padding to produce the `A2:..` range actually worth fetching.

pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Columns the service over-reports past the last real data column
/// (observed on form-response sheets; not documented anywhere).
pub const COLUMN_OVERREPORT: usize = 6;

/// Rows the service over-reports past the last real data row.
pub const ROW_OVERREPORT: u32 = 100;

/// Rectangular cell range believed to hold real data. The first cell is
/// always A2: row 1 is the form's header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    pub last_column: String,
    pub last_row: u32,
}

impl std::fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "A2:{}{}", self.last_column, self.last_row)
    }
}

/// Ordered spreadsheet column labels A..Z then AA..AZ (52 labels).
fn column_labels() -> Vec<String> {
    let singles = ('A'..='Z').map(String::from);
    let doubles = ('A'..='Z').map(|c| format!("A{c}"));
    singles.chain(doubles).collect()
}

/// Estimates the data range from the grid extent the service reports.
///
/// `forced_minimum_rows` floors the row estimate; it guards against
/// undershoot when rows were added outside the form-submission flow.
/// A reported column count of `COLUMN_OVERREPORT` or less cannot be
/// corrected and is rejected rather than wrapped around.
pub fn estimate_range(
    reported_rows: u32,
    reported_cols: usize,
    forced_minimum_rows: u32,
) -> Result<RangeSpec> {
    let labels = column_labels();
    let idx = reported_cols.min(labels.len());
    if idx <= COLUMN_OVERREPORT {
        return Err(AppError::Validation(format!(
            "sheet reports only {reported_cols} columns; cannot correct for the \
             {COLUMN_OVERREPORT}-column over-report"
        )));
    }
    let last_column = labels[idx - 1 - COLUMN_OVERREPORT].clone();
    let last_row = reported_rows.saturating_sub(ROW_OVERREPORT).max(forced_minimum_rows);
    Ok(RangeSpec {
        last_column,
        last_row,
    })
}

/// Row/column counts from the sheet's grid properties.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridShape {
    pub row_count: u32,
    pub column_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    grid_properties: GridShape,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Client-side view of the Sheets API.
#[async_trait::async_trait]
pub trait SheetsApi: Send + Sync {
    /// Reported grid extent of the spreadsheet's first sheet.
    async fn grid_shape(&self, spreadsheet_id: &str) -> Result<GridShape>;

    /// Cell values for a range, row-major. Trailing empty cells are absent.
    async fn values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>>;
}

/// reqwest-backed Sheets client using a bearer token.
pub struct SheetsClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl SheetsClient {
    pub fn new(client: reqwest::Client, token: String) -> Self {
        Self::with_base_url(client, token, SHEETS_BASE_URL.to_string())
    }

    pub fn with_base_url(client: reqwest::Client, token: String, base_url: String) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: String,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let endpoint = Url::parse(&endpoint)?;
        let response = self
            .client
            .get(endpoint.clone())
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AppError::Api {
                status: response.status(),
                endpoint: endpoint.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl SheetsApi for SheetsClient {
    async fn grid_shape(&self, spreadsheet_id: &str) -> Result<GridShape> {
        let props: SpreadsheetProperties = self
            .get_json(
                format!("{}/spreadsheets/{}", self.base_url, spreadsheet_id),
                &[("fields", "sheets.properties")],
            )
            .await?;
        let first = props.sheets.into_iter().next().ok_or_else(|| {
            AppError::NotFound(format!("spreadsheet {spreadsheet_id} has no sheets"))
        })?;
        Ok(first.properties.grid_properties)
    }

    async fn values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let result: ValueRange = self
            .get_json(
                format!(
                    "{}/spreadsheets/{}/values/{}",
                    self.base_url, spreadsheet_id, range
                ),
                &[],
            )
            .await?;
        Ok(result.values)
    }
}
