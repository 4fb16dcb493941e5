//! Earnings per employee and month, for the comparison chart.

use std::collections::HashMap;

use nomina_core::filter::{SortDirection, SortField, SortSpec};
use nomina_core::record::RawRecord;
use serde::Serialize;

use crate::presenter::Aggregate;

/// Bars shown in the chart.
pub const COMPARE_LIMIT: usize = 40;

const NO_NAME: &str = "Sin nombre";
const NO_PERIOD: &str = "Sin periodo";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareEntry {
    pub name: String,
    pub period: String,
    pub salary: f64,
    pub commissions: f64,
    pub total: f64,
    /// Source rows merged into this entry.
    pub record_count: u32,
}

impl CompareEntry {
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.period)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompareSeries {
    pub entries: Vec<CompareEntry>,
}

impl CompareSeries {
    /// Sum rows sharing a name and period, in order of first appearance.
    ///
    /// A numeric client sort, if given, reorders the entries before they
    /// are cut to [`COMPARE_LIMIT`].
    pub fn build(records: &[RawRecord], client_sort: Option<SortSpec>) -> Self {
        let mut index: HashMap<(String, String), usize> = HashMap::new();
        let mut entries: Vec<CompareEntry> = Vec::new();

        for record in records {
            let name = record.name.clone().unwrap_or_else(|| NO_NAME.to_string());
            let period = record
                .period
                .map(|p| p.format("%Y-%m").to_string())
                .unwrap_or_else(|| NO_PERIOD.to_string());
            let salary = record.salary.unwrap_or(0.0);
            let commissions = record.commissions.unwrap_or(0.0);
            let total = record.total_earnings.unwrap_or(0.0);

            match index.get(&(name.clone(), period.clone())) {
                Some(&i) => {
                    let e = &mut entries[i];
                    e.salary += salary;
                    e.commissions += commissions;
                    e.total += total;
                    e.record_count += 1;
                }
                None => {
                    index.insert((name.clone(), period.clone()), entries.len());
                    entries.push(CompareEntry {
                        name,
                        period,
                        salary,
                        commissions,
                        total,
                        record_count: 1,
                    });
                }
            }
        }

        if let Some(spec) = client_sort.filter(|s| s.field.is_numeric()) {
            let value = |e: &CompareEntry| match spec.field {
                SortField::Salary => e.salary,
                SortField::Commissions => e.commissions,
                _ => e.total,
            };
            entries.sort_by(|a, b| {
                let ord = value(a).total_cmp(&value(b));
                match spec.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        entries.truncate(COMPARE_LIMIT);

        Self { entries }
    }
}

impl Aggregate for CompareSeries {
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
