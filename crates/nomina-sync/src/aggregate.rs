//! Sequential page-by-page aggregation with partial results on failure.

use nomina_core::filter::{FilterState, PageRequest, SortSpec};
use nomina_core::record::RawRecord;
use tracing::{debug, info, warn};

use crate::error::SyncError;

/// One page of records as returned by a [`PageSource`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<RawRecord>,
    /// Server-reported total across all pages, if any.
    pub total: Option<u64>,
    /// Page size the server actually applied, if reported.
    pub page_size: Option<u32>,
}

/// Anything that can serve one page of payroll records.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(
        &self,
        filters: &FilterState,
        page: PageRequest,
        sort: Option<SortSpec>,
    ) -> Result<Page, SyncError>;
}

/// Records gathered by [`fetch_all`].
///
/// When `error` is set the result is partial: it holds every record from
/// the pages that succeeded before the failure.
#[derive(Debug, Default)]
pub struct Aggregated {
    pub records: Vec<RawRecord>,
    pub total: Option<u64>,
    pub pages_fetched: u32,
    pub error: Option<SyncError>,
}

impl Aggregated {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Records, or the error if nothing at all was fetched.
    pub fn into_result(self) -> Result<Vec<RawRecord>, SyncError> {
        match self.error {
            Some(e) if self.records.is_empty() => Err(e),
            _ => Ok(self.records),
        }
    }
}

/// Fetch every page for `filters`, one request at a time, starting at page 1.
///
/// Stops on an empty page, once the accumulated count reaches the reported
/// total, after the last page implied by the total, or (with no total) after
/// a short page. A failed request ends the loop; the records gathered so far
/// are returned together with the error.
pub async fn fetch_all<S>(source: &S, filters: &FilterState, page_size: u32) -> Aggregated
where
    S: PageSource + ?Sized,
{
    let mut out = Aggregated::default();
    let mut page_no = 1u32;
    let mut total_pages: Option<u64> = None;
    let mut effective_size = page_size.max(1);

    loop {
        let request = PageRequest::new(page_no, page_size);
        let page = match source.fetch_page(filters, request, None).await {
            Ok(page) => page,
            Err(e) => {
                warn!(page = page_no, fetched = out.records.len(), error = %e, "page fetch failed; returning partial result");
                out.error = Some(e);
                break;
            }
        };
        out.pages_fetched += 1;

        // The server may cap the page below what was asked for.
        if let Some(size) = page.page_size {
            effective_size = size.max(1);
        }
        if page_no == 1 {
            out.total = page.total;
            total_pages = page.total.map(|t| t.div_ceil(u64::from(effective_size)));
            debug!(total = ?out.total, total_pages = ?total_pages, "first page received");
        }

        let received = page.records.len();
        out.records.extend(page.records);
        debug!(page = page_no, received, accumulated = out.records.len(), "page received");

        if received == 0 {
            break;
        }
        if let Some(total) = out.total {
            if out.records.len() as u64 >= total {
                break;
            }
        } else if received < effective_size as usize {
            break;
        }
        if total_pages.is_some_and(|n| u64::from(page_no) >= n) {
            break;
        }
        page_no += 1;
    }

    info!(
        count = out.records.len(),
        pages = out.pages_fetched,
        complete = out.is_complete(),
        "aggregation finished"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory source serving `total` records in pages, optionally failing one page.
    struct MemorySource {
        total: usize,
        fail_on: Option<u32>,
        report_total: bool,
        /// Largest page the source will serve, whatever was requested.
        cap: Option<u32>,
        requested: Mutex<Vec<u32>>,
    }

    impl MemorySource {
        fn new(total: usize) -> Self {
            Self {
                total,
                fail_on: None,
                report_total: true,
                cap: None,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl PageSource for MemorySource {
        async fn fetch_page(
            &self,
            _filters: &FilterState,
            page: PageRequest,
            _sort: Option<SortSpec>,
        ) -> Result<Page, SyncError> {
            self.requested.lock().unwrap().push(page.page);
            if self.fail_on == Some(page.page) {
                return Err(SyncError::Server {
                    status: 502,
                    body: "bad gateway".into(),
                });
            }
            let served = self.cap.map_or(page.page_size, |c| c.min(page.page_size));
            let size = served as usize;
            let start = (page.page as usize - 1) * size;
            let end = (start + size).min(self.total);
            let records = (start..end.max(start))
                .map(|i| RawRecord {
                    personal_id: Some(format!("ID{i:06}")),
                    ..Default::default()
                })
                .collect();
            Ok(Page {
                records,
                total: self.report_total.then_some(self.total as u64),
                page_size: Some(served),
            })
        }
    }

    #[tokio::test]
    async fn gathers_all_pages() {
        let source = MemorySource::new(337);
        let result = fetch_all(&source, &FilterState::default(), 100).await;
        assert!(result.is_complete());
        assert_eq!(result.records.len(), 337);
        assert_eq!(result.total, Some(337));
        assert_eq!(result.pages_fetched, 4);
        assert_eq!(*source.requested.lock().unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn failed_page_returns_partial() {
        let source = MemorySource {
            fail_on: Some(2),
            ..MemorySource::new(337)
        };
        let result = fetch_all(&source, &FilterState::default(), 100).await;
        assert!(!result.is_complete());
        assert_eq!(result.records.len(), 100);
        assert!(matches!(result.error, Some(SyncError::Server { status: 502, .. })));
        assert_eq!(*source.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn first_page_failure_is_an_error() {
        let source = MemorySource {
            fail_on: Some(1),
            ..MemorySource::new(10)
        };
        let result = fetch_all(&source, &FilterState::default(), 100).await;
        assert!(result.records.is_empty());
        assert!(result.into_result().is_err());
    }

    #[tokio::test]
    async fn stops_on_empty_page_when_total_overstated() {
        struct Overstated;

        #[async_trait::async_trait]
        impl PageSource for Overstated {
            async fn fetch_page(
                &self,
                _filters: &FilterState,
                page: PageRequest,
                _sort: Option<SortSpec>,
            ) -> Result<Page, SyncError> {
                let records = if page.page == 1 {
                    vec![RawRecord::default(); 50]
                } else {
                    Vec::new()
                };
                Ok(Page {
                    records,
                    total: Some(1_000),
                    page_size: Some(50),
                })
            }
        }

        let result = fetch_all(&Overstated, &FilterState::default(), 50).await;
        assert!(result.is_complete());
        assert_eq!(result.records.len(), 50);
        assert_eq!(result.pages_fetched, 2);
    }

    #[tokio::test]
    async fn short_page_ends_when_total_unknown() {
        let source = MemorySource {
            report_total: false,
            ..MemorySource::new(250)
        };
        let result = fetch_all(&source, &FilterState::default(), 100).await;
        assert_eq!(result.records.len(), 250);
        assert_eq!(result.total, None);
        assert_eq!(result.pages_fetched, 3);
    }

    #[tokio::test]
    async fn server_capped_pages_without_total() {
        let source = MemorySource {
            report_total: false,
            cap: Some(100),
            ..MemorySource::new(250)
        };
        let result = fetch_all(&source, &FilterState::default(), 1_000).await;
        assert!(result.is_complete());
        assert_eq!(result.records.len(), 250);
        assert_eq!(result.pages_fetched, 3);
        assert_eq!(*source.requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn empty_result() {
        let source = MemorySource::new(0);
        let result = fetch_all(&source, &FilterState::default(), 100).await;
        assert!(result.is_complete());
        assert!(result.records.is_empty());
        assert_eq!(result.pages_fetched, 1);
    }
}
