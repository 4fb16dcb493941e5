//! Demographic table: one server page, client-sorted where the server cannot.

use std::cmp::Ordering;

use nomina_core::filter::{
    FilterState, PageRequest, SortCapabilities, SortDirection, SortField, SortSpec, TableSort,
};
use nomina_core::record::RawRecord;
use nomina_sync::{Page, PageSource, SyncError};
use serde::Serialize;

use crate::presenter::Aggregate;

/// Most page buttons shown at once, ellipses included.
pub const MAX_PAGE_BUTTONS: u32 = 7;

const UNKNOWN_STATUS: &str = "Desconocido";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayRow {
    pub name: String,
    pub personal_id: String,
    pub tax_id: String,
    pub job_title: String,
    pub branch: String,
    /// `YYYY-MM`, or empty.
    pub period: String,
    pub salary: f64,
    pub commissions: f64,
    pub total_earnings: f64,
    pub status: String,
}

impl DisplayRow {
    pub fn from_record(record: &RawRecord) -> Self {
        Self {
            name: record.name.clone().unwrap_or_default(),
            personal_id: record.personal_id.clone().unwrap_or_default(),
            tax_id: record.tax_id.clone().unwrap_or_default(),
            job_title: record.job_title.clone().unwrap_or_default(),
            branch: record.branch.clone().unwrap_or_default(),
            period: record.period_label(),
            salary: record.salary.unwrap_or(0.0),
            commissions: record.commissions.unwrap_or(0.0),
            total_earnings: record.total_earnings.unwrap_or(0.0),
            status: record
                .status
                .as_ref()
                .map(|s| s.label().to_string())
                .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        }
    }

    fn text(&self, field: SortField) -> &str {
        match field {
            SortField::Name => &self.name,
            SortField::PersonalId => &self.personal_id,
            SortField::JobTitle => &self.job_title,
            SortField::Branch => &self.branch,
            SortField::Period => &self.period,
            SortField::Status => &self.status,
            SortField::Salary | SortField::Commissions | SortField::TotalEarnings => "",
        }
    }

    fn number(&self, field: SortField) -> f64 {
        match field {
            SortField::Salary => self.salary,
            SortField::Commissions => self.commissions,
            SortField::TotalEarnings => self.total_earnings,
            _ => 0.0,
        }
    }
}

/// Stable sort: numbers numerically, text case-insensitively.
pub fn sort_rows(rows: &mut [DisplayRow], spec: SortSpec) {
    rows.sort_by(|a, b| {
        let ord = if spec.field.is_numeric() {
            a.number(spec.field)
                .partial_cmp(&b.number(spec.field))
                .unwrap_or(Ordering::Equal)
        } else {
            a.text(spec.field)
                .to_lowercase()
                .cmp(&b.text(spec.field).to_lowercase())
        };
        match spec.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Page buttons around `page`, at most [`MAX_PAGE_BUTTONS`] entries.
pub fn page_window(page: u32, total_pages: u32) -> Vec<PageItem> {
    use PageItem::{Ellipsis, Page};

    if total_pages <= MAX_PAGE_BUTTONS {
        return (1..=total_pages).map(Page).collect();
    }
    let last = total_pages;
    if page <= 4 {
        vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(last)]
    } else if page >= last - 3 {
        let mut items = vec![Page(1), Ellipsis];
        items.extend((last - 4..=last).map(Page));
        items
    } else {
        vec![
            Page(1),
            Ellipsis,
            Page(page - 1),
            Page(page),
            Page(page + 1),
            Ellipsis,
            Page(last),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    pub rows: Vec<DisplayRow>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    /// The local ordering applied, if any.
    pub client_sort: Option<SortSpec>,
}

impl TablePage {
    pub fn from_page(
        page: Page,
        request: PageRequest,
        sort: &TableSort,
        caps: &SortCapabilities,
    ) -> Self {
        let mut rows: Vec<DisplayRow> = page.records.iter().map(DisplayRow::from_record).collect();
        let client_sort = sort.client_spec(caps);
        if let Some(spec) = client_sort {
            sort_rows(&mut rows, spec);
        }
        let total = page.total.unwrap_or(rows.len() as u64);
        let total_pages = total.div_ceil(u64::from(request.page_size.max(1))) as u32;
        Self {
            rows,
            page: request.page,
            page_size: request.page_size,
            total,
            total_pages,
            client_sort,
        }
    }

    pub fn window(&self) -> Vec<PageItem> {
        page_window(self.page, self.total_pages)
    }
}

impl Aggregate for TablePage {
    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fetch one page, ordering on the server only by server-capable fields.
pub async fn load_table_page<S>(
    source: &S,
    filters: &FilterState,
    request: PageRequest,
    sort: &TableSort,
    caps: &SortCapabilities,
) -> Result<TablePage, SyncError>
where
    S: PageSource + ?Sized,
{
    let page = source
        .fetch_page(filters, request, sort.server_spec(caps))
        .await?;
    Ok(TablePage::from_page(page, request, sort, caps))
}
