//! Hugging Face dataset-server loader
//!
//! Pages through `GET {hub_url}/rows?dataset=..&config=..&split=..&offset=..&length=..`
//! until `num_rows_total` rows have been read.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{BatchError, Result};
use crate::util::{truncate_body, CONNECT_TIMEOUT, FETCH_TIMEOUT, HUB_PAGE_SIZE, USER_AGENT};

/// Client for the dataset-server `/rows` endpoint
#[derive(Clone)]
pub struct HubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HubClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BatchError::InvalidConfig {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Fetch every row of `dataset/config/split`, in row order
    #[instrument(skip(self))]
    pub async fn fetch_rows(&self, dataset: &str, config: &str, split: &str) -> Result<Vec<Value>> {
        let mut rows = Vec::new();
        let mut total: Option<usize> = None;

        loop {
            let page = self.fetch_page(dataset, config, split, rows.len()).await?;
            let expected = *total.get_or_insert(page.num_rows_total);

            if page.rows.is_empty() {
                break;
            }
            rows.extend(page.rows.into_iter().map(|entry| entry.row));
            debug!(fetched = rows.len(), total = expected, "Fetched dataset page");

            if rows.len() >= expected {
                break;
            }
        }

        if let Some(expected) = total {
            if rows.len() < expected {
                return Err(BatchError::DatasetLoad {
                    dataset: dataset.to_string(),
                    reason: format!("server reported {expected} rows but returned {}", rows.len()),
                });
            }
        }

        Ok(rows)
    }

    async fn fetch_page(
        &self,
        dataset: &str,
        config: &str,
        split: &str,
        offset: usize,
    ) -> Result<RowsPage> {
        let url = format!("{}/rows", self.base_url);
        let offset = offset.to_string();
        let length = HUB_PAGE_SIZE.to_string();

        let mut request = self.client.get(&url).query(&[
            ("dataset", dataset),
            ("config", config),
            ("split", split),
            ("offset", offset.as_str()),
            ("length", length.as_str()),
        ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let load_error = |reason: String| BatchError::DatasetLoad {
            dataset: dataset.to_string(),
            reason,
        };

        let response = request
            .send()
            .await
            .map_err(|e| load_error(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BatchError::DatasetNotFound {
                dataset: format!("{dataset} (config '{config}', split '{split}')"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(load_error(format!("{status}: {}", truncate_body(&body))));
        }

        response
            .json::<RowsPage>()
            .await
            .map_err(|e| load_error(format!("malformed rows page: {e}")))
    }
}

// ============================================================================
// API TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
    num_rows_total: usize,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: Value,
}
