//! HTTP client for the payroll REST API.

use std::sync::Arc;
use std::time::Duration;

use nomina_core::filter::{FilterState, PageRequest, QueryPairs, SortSpec, build_query};
use nomina_core::record::RawRecord;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::aggregate::{Page, PageSource};
use crate::auth::TokenProvider;
use crate::error::SyncError;
use crate::options::{FALLBACK_PERIOD, FilterOptions, OptionCount, latest_month};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    /// `base_url` like `http://localhost:3001`; a trailing slash is dropped.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("nomina/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    total: Option<u64>,
    page_size: Option<u32>,
}

/// `{ success, data, total?, pagination?, error? }`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    total: Option<u64>,
    pagination: Option<Pagination>,
    error: Option<String>,
    unique_curp_count: Option<u64>,
}

impl<T> Envelope<T> {
    fn ensure_success(self) -> Result<Self, SyncError> {
        if self.success {
            Ok(self)
        } else {
            Err(SyncError::Api(
                self.error
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ))
        }
    }
}

/// Client for the payroll endpoints.
pub struct PayrollClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl PayrollClient {
    pub fn new(config: ClientConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            tokens: None,
        })
    }

    /// Attach bearer tokens from `provider` to every request.
    pub fn with_tokens(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(provider);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Add the bearer header. A failing provider sends the request without it.
    async fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let Some(provider) = &self.tokens else {
            return req;
        };
        match provider.token().await {
            Ok(Some(token)) => req.bearer_auth(token),
            Ok(None) => req,
            Err(e) => {
                warn!(error = %e, "token fetch failed; sending request without credentials");
                req
            }
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryPairs,
    ) -> Result<Envelope<T>, SyncError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, params = query.len(), "GET");
        let req = self.authorize(self.client.get(&url).query(query)).await;
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let body = resp.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        envelope.ensure_success()
    }

    /// One page of `/api/payroll`, mapped through the alias adapter.
    pub async fn payroll_page(
        &self,
        filters: &FilterState,
        page: PageRequest,
        sort: Option<SortSpec>,
    ) -> Result<Page, SyncError> {
        let query = build_query(filters, Some(page), sort);
        let envelope: Envelope<Vec<Value>> = self.get("/api/payroll", &query).await?;
        let pagination = envelope.pagination.unwrap_or_default();
        let records: Vec<RawRecord> = envelope
            .data
            .unwrap_or_default()
            .iter()
            .map(RawRecord::from_json)
            .collect();
        info!(page = page.page, count = records.len(), "fetched payroll page");
        Ok(Page {
            records,
            total: envelope.total.or(pagination.total),
            page_size: pagination.page_size,
        })
    }

    /// Latest reporting period as `YYYY-MM`, if the API reports a valid one.
    pub async fn try_latest_period(&self) -> Result<Option<String>, SyncError> {
        let envelope: Envelope<Vec<OptionCount>> =
            self.get("/api/payroll/periodos", &QueryPairs::new()).await?;
        let periods = envelope.data.unwrap_or_default();
        Ok(latest_month(periods.iter().map(|p| p.value.as_str())))
    }

    /// Latest reporting period, or [`FALLBACK_PERIOD`] when it cannot be determined.
    pub async fn latest_period(&self) -> String {
        match self.try_latest_period().await {
            Ok(Some(period)) => period,
            Ok(None) => {
                warn!(fallback = FALLBACK_PERIOD, "no valid period reported");
                FALLBACK_PERIOD.to_string()
            }
            Err(e) => {
                warn!(error = %e, fallback = FALLBACK_PERIOD, "could not load latest period");
                FALLBACK_PERIOD.to_string()
            }
        }
    }

    /// Facet options, with job categories rolled up from job titles if absent.
    pub async fn filter_options(&self) -> Result<FilterOptions, SyncError> {
        let envelope: Envelope<FilterOptions> =
            self.get("/api/payroll/filters", &QueryPairs::new()).await?;
        Ok(envelope.data.unwrap_or_default().with_categories())
    }

    /// Server-side count of distinct personal IDs matching `filters`.
    pub async fn unique_count(&self, filters: &FilterState) -> Result<u64, SyncError> {
        let envelope: Envelope<Value> = self
            .get("/api/payroll/demographic/unique-count", &filters.query_pairs())
            .await?;
        Ok(envelope.unique_curp_count.unwrap_or(0))
    }
}

#[async_trait::async_trait]
impl PageSource for PayrollClient {
    async fn fetch_page(
        &self,
        filters: &FilterState,
        page: PageRequest,
        sort: Option<SortSpec>,
    ) -> Result<Page, SyncError> {
        self.payroll_page(filters, page, sort).await
    }
}
