//! Facet selections, pagination and sorting, and their query-string form.
//!
//! The payroll API cannot order by every column: derived currency columns
//! are only sortable on the client, over the page already fetched. Which
//! side sorts which field is declared once in [`SortCapabilities`] and
//! consulted by both the query builder and the table presenter.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::EmploymentStatus;

/// Query pairs in the order they are sent.
pub type QueryPairs = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Sortable table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    PersonalId,
    JobTitle,
    Branch,
    Period,
    Salary,
    Commissions,
    TotalEarnings,
    Status,
}

impl SortField {
    pub const ALL: [SortField; 9] = [
        Self::Name,
        Self::PersonalId,
        Self::JobTitle,
        Self::Branch,
        Self::Period,
        Self::Salary,
        Self::Commissions,
        Self::TotalEarnings,
        Self::Status,
    ];

    /// Field name the API expects in `orderBy`.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Name => "nombre",
            Self::PersonalId => "curp",
            Self::JobTitle => "puesto",
            Self::Branch => "sucursal",
            Self::Period => "periodo",
            Self::Salary => "salario",
            Self::Commissions => "comisiones",
            Self::TotalEarnings => "percepcionestotales",
            Self::Status => "estado",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Salary | Self::Commissions | Self::TotalEarnings)
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.api_name() == lower)
            .or(match lower.as_str() {
                "name" => Some(Self::Name),
                "id" | "personal_id" => Some(Self::PersonalId),
                "job" | "job_title" | "position" => Some(Self::JobTitle),
                "branch" => Some(Self::Branch),
                "period" | "cveper" | "mes" => Some(Self::Period),
                "salary" | "sueldo" => Some(Self::Salary),
                "commissions" => Some(Self::Commissions),
                "total" | "total_earnings" => Some(Self::TotalEarnings),
                "status" => Some(Self::Status),
                _ => None,
            })
            .ok_or_else(|| format!("unknown sort field: {s}"))
    }
}

/// Where a field is sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortSide {
    Server,
    Client,
}

/// Per-field sort capability table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCapabilities {
    sides: BTreeMap<SortField, SortSide>,
}

impl Default for SortCapabilities {
    /// Text and date columns on the server, currency columns on the client.
    fn default() -> Self {
        let sides = SortField::ALL
            .into_iter()
            .map(|f| {
                let side = if f.is_numeric() {
                    SortSide::Client
                } else {
                    SortSide::Server
                };
                (f, side)
            })
            .collect();
        Self { sides }
    }
}

impl SortCapabilities {
    /// Every field sorted on the client.
    pub fn all_client() -> Self {
        Self {
            sides: SortField::ALL
                .into_iter()
                .map(|f| (f, SortSide::Client))
                .collect(),
        }
    }

    pub fn with(mut self, field: SortField, side: SortSide) -> Self {
        self.sides.insert(field, side);
        self
    }

    /// Fields absent from the table are sorted on the client.
    pub fn side(&self, field: SortField) -> SortSide {
        self.sides.get(&field).copied().unwrap_or(SortSide::Client)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

/// Active server-side and client-side orderings of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSort {
    pub server: Option<SortSpec>,
    pub client: Option<SortSpec>,
}

impl TableSort {
    /// Click on a column header.
    ///
    /// Repeating the active field flips its direction; a new field starts
    /// ascending. Selecting a server field drops any client ordering, since
    /// the next page arrives already ordered. Returns the side that changed.
    pub fn toggle(&mut self, field: SortField, caps: &SortCapabilities) -> SortSide {
        let side = caps.side(field);
        let slot = match side {
            SortSide::Server => {
                self.client = None;
                &mut self.server
            }
            SortSide::Client => &mut self.client,
        };
        let next = match *slot {
            Some(spec) if spec.field == field => SortSpec {
                field,
                direction: spec.direction.toggled(),
            },
            _ => SortSpec::asc(field),
        };
        *slot = Some(next);
        side
    }

    /// The ordering to send to the API, if it is server-sortable.
    pub fn server_spec(&self, caps: &SortCapabilities) -> Option<SortSpec> {
        self.server
            .filter(|s| caps.side(s.field) == SortSide::Server)
    }

    /// The ordering to apply locally. Never a field the server is sorting.
    pub fn client_spec(&self, caps: &SortCapabilities) -> Option<SortSpec> {
        self.client.filter(|s| {
            caps.side(s.field) == SortSide::Client
                && self.server.is_none_or(|server| server.field != s.field)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }
}

/// Active facet selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub branches: Vec<String>,
    pub job_titles: Vec<String>,
    pub job_categories: Vec<String>,
    /// Empty means active employees only.
    pub statuses: Vec<EmploymentStatus>,
    /// Reporting period, `YYYY-MM` or `YYYY-MM-DD`.
    pub period: Option<String>,
    /// Free-text search over name and personal ID.
    pub search: Option<String>,
}

impl FilterState {
    /// Facet query pairs, without pagination or sorting.
    pub fn query_pairs(&self) -> QueryPairs {
        let mut pairs = QueryPairs::new();
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            pairs.push(("search".into(), search.into()));
        }
        for branch in &self.branches {
            pairs.push(("sucursal".into(), branch.clone()));
        }
        for title in &self.job_titles {
            pairs.push(("puesto".into(), title.clone()));
        }
        for category in &self.job_categories {
            pairs.push(("puestoCategorizado".into(), category.clone()));
        }
        if self.statuses.is_empty() {
            pairs.push(("status".into(), EmploymentStatus::Active.code().into()));
        } else {
            for status in &self.statuses {
                pairs.push(("status".into(), status.code().into()));
            }
        }
        if let Some(period) = self.period.as_deref().map(str::trim)
            && !period.is_empty()
        {
            pairs.push(("cveper".into(), period.into()));
        }
        pairs
    }

    /// Whether the branch, job title, category or period selection differs,
    /// ignoring order within each list.
    pub fn differs_from(&self, other: &FilterState) -> bool {
        fn set(v: &[String]) -> BTreeSet<&str> {
            v.iter().map(String::as_str).collect()
        }
        set(&self.branches) != set(&other.branches)
            || set(&self.job_titles) != set(&other.job_titles)
            || set(&self.job_categories) != set(&other.job_categories)
            || self.period != other.period
    }
}

/// Full query for one page: facets, then pagination, then server ordering.
pub fn build_query(
    filters: &FilterState,
    page: Option<PageRequest>,
    sort: Option<SortSpec>,
) -> QueryPairs {
    let mut pairs = filters.query_pairs();
    if let Some(p) = page {
        pairs.push(("page".into(), p.page.to_string()));
        pairs.push(("pageSize".into(), p.page_size.to_string()));
    }
    if let Some(s) = sort {
        pairs.push(("orderBy".into(), s.field.api_name().into()));
        pairs.push(("orderDirection".into(), s.direction.as_str().into()));
    }
    pairs
}
