//! Per-visualization presenters and the aggregates they render.

pub mod compare;
pub mod crossfilter;
pub mod positions;
pub mod presenter;
pub mod pyramid;
pub mod salary;
pub mod seniority;
pub mod table;

pub use compare::{COMPARE_LIMIT, CompareEntry, CompareSeries};
pub use crossfilter::CrossFilter;
pub use positions::{PositionRow, Positions};
pub use presenter::{Aggregate, Presenter, Render, Ticket, ViewParams, ViewState, refresh};
pub use pyramid::{Pyramid, PyramidStats, SexCounts};
pub use salary::{AgeBandRow, SalaryBandRow, SalaryBands};
pub use seniority::{BranchSeniority, SeniorityByBranch, SeniorityStats};
pub use table::{DisplayRow, PageItem, TablePage, load_table_page, page_window};
