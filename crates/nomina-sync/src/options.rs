//! Facet options offered by the filters endpoint.

use std::collections::BTreeMap;

use chrono::Datelike;
use nomina_core::category::category_counts;
use nomina_core::record::parse_period;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Period used when the API cannot tell us the latest one.
pub const FALLBACK_PERIOD: &str = "2024-10";

const MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionCount {
    pub value: String,
    #[serde(default)]
    pub count: u64,
}

/// Option lists as returned under `data` by `/api/payroll/filters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default, rename = "sucursales")]
    pub branches: Vec<OptionCount>,
    #[serde(default, rename = "puestos")]
    pub job_titles: Vec<OptionCount>,
    #[serde(default, rename = "estados")]
    pub statuses: Vec<OptionCount>,
    #[serde(default, rename = "puestosCategorias")]
    pub job_categories: Vec<OptionCount>,
    #[serde(default, rename = "periodos")]
    pub periods: Vec<OptionCount>,
}

impl FilterOptions {
    /// Fill `job_categories` from the job titles when the server sent none.
    pub fn with_categories(mut self) -> Self {
        if self.job_categories.is_empty() {
            self.job_categories = category_counts(
                self.job_titles
                    .iter()
                    .map(|o| (o.value.as_str(), o.count)),
            )
            .into_iter()
            .map(|(value, count)| OptionCount { value, count })
            .collect();
        }
        self
    }

    pub fn months(&self) -> Vec<PeriodOption> {
        group_periods_by_month(&self.periods)
    }
}

/// All reporting periods that fall in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodOption {
    /// `YYYY-MM`.
    pub value: String,
    /// e.g. `Octubre 24`.
    pub label: String,
    pub count: u64,
    /// Normalised `YYYY-MM-DD` periods in this month.
    pub periods: Vec<String>,
}

/// Group raw period options by month, newest first. Unparseable values are skipped.
pub fn group_periods_by_month(options: &[OptionCount]) -> Vec<PeriodOption> {
    let mut grouped: BTreeMap<String, PeriodOption> = BTreeMap::new();
    for option in options {
        let Some(date) = parse_period(&option.value) else {
            debug!(value = %option.value, "skipping unparseable period");
            continue;
        };
        let key = date.format("%Y-%m").to_string();
        let entry = grouped.entry(key.clone()).or_insert_with(|| PeriodOption {
            value: key,
            label: month_label(date.year(), date.month()),
            count: 0,
            periods: Vec::new(),
        });
        entry.count += option.count;
        entry.periods.push(date.to_string());
    }
    grouped.into_values().rev().collect()
}

/// Spanish month name plus two-digit year.
pub fn month_label(year: i32, month: u32) -> String {
    let name = MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    format!("{name} {:02}", year.rem_euclid(100))
}

/// The newest parseable period as `YYYY-MM`.
pub fn latest_month<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .filter_map(parse_period)
        .max()
        .map(|d| d.format("%Y-%m").to_string())
}
