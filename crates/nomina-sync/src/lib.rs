//! Remote data access: paginated aggregation over a page source, and the
//! payroll HTTP client.

pub mod aggregate;
pub mod auth;
pub mod error;
pub mod options;

#[cfg(feature = "http")]
pub mod http;

pub use aggregate::{Aggregated, Page, PageSource, fetch_all};
pub use auth::{Anonymous, StaticToken, TokenProvider};
pub use error::{AuthError, SyncError};
pub use options::{FALLBACK_PERIOD, FilterOptions, OptionCount, PeriodOption};

#[cfg(feature = "http")]
pub use http::{ClientConfig, PayrollClient};
