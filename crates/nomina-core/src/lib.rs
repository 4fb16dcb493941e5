pub mod band;
pub mod category;
pub mod dedupe;
pub mod export;
pub mod filter;
pub mod identity;
pub mod loan;
pub mod record;
pub mod schema;
pub mod selection;

pub use band::{Band, BandError, BandSet};
pub use category::job_category;
pub use dedupe::{Snapshot, dedupe};
pub use export::{ExportError, export_csv, snapshots_to_csv};
pub use filter::{
    FilterState, PageRequest, SortCapabilities, SortDirection, SortField, SortSide, SortSpec,
    TableSort, build_query,
};
pub use identity::{IdentityConfig, ParsedIdentity, Sex, parse_identity, parse_identity_at};
pub use loan::{LoanError, LoanInput, LoanResult, PaymentFrequency, RateType, simulate};
pub use record::{EmploymentStatus, RawRecord};
pub use schema::payroll;
pub use selection::{Selection, SelectionBus, SelectionData, SelectionKind};
