//! Employees per seniority band, for each branch.

use std::collections::HashMap;

use chrono::NaiveDate;
use nomina_core::band::BandSet;
use nomina_core::dedupe::Snapshot;
use serde::Serialize;
use tracing::debug;

use crate::presenter::Aggregate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchSeniority {
    pub branch: String,
    pub total: u64,
    /// Counts aligned with the band table.
    pub bands: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeniorityStats {
    pub total_employees: u64,
    pub total_branches: u64,
    pub valid_seniority: u64,
    /// Employees with a branch but no usable hire date.
    pub invalid_seniority: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeniorityByBranch {
    pub bands: BandSet,
    /// Sorted by branch name, ignoring case.
    pub branches: Vec<BranchSeniority>,
    pub stats: SeniorityStats,
}

impl SeniorityByBranch {
    pub fn build(snapshots: &[Snapshot], today: NaiveDate, bands: BandSet) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut branches: Vec<BranchSeniority> = Vec::new();
        let mut stats = SeniorityStats {
            total_employees: snapshots.len() as u64,
            ..Default::default()
        };

        for snapshot in snapshots {
            let Some(branch) = snapshot.record.branch.as_deref() else {
                continue;
            };
            let Some(slot) = snapshot
                .record
                .seniority_years(today)
                .and_then(|years| bands.index_of(years))
            else {
                debug!(key = %snapshot.key, "no usable seniority");
                stats.invalid_seniority += 1;
                continue;
            };
            stats.valid_seniority += 1;

            let i = *index.entry(branch).or_insert_with(|| {
                branches.push(BranchSeniority {
                    branch: branch.to_string(),
                    total: 0,
                    bands: vec![0; bands.len()],
                });
                branches.len() - 1
            });
            branches[i].total += 1;
            branches[i].bands[slot] += 1;
        }

        branches.sort_by(|a, b| {
            a.branch
                .to_lowercase()
                .cmp(&b.branch.to_lowercase())
                .then_with(|| a.branch.cmp(&b.branch))
        });
        stats.total_branches = branches.len() as u64;

        Self {
            bands,
            branches,
            stats,
        }
    }
}

impl Aggregate for SeniorityByBranch {
    fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomina_core::record::RawRecord;

    fn snap(key: &str, branch: Option<&str>, hired: Option<(i32, u32, u32)>) -> Snapshot {
        Snapshot {
            key: key.into(),
            record: RawRecord {
                branch: branch.map(String::from),
                hire_date: hired.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
                ..Default::default()
            },
        }
    }

    #[test]
    fn groups_by_branch_and_band() {
        let today = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let snapshots = [
            snap("A", Some("norte"), Some((2024, 6, 1))),  // Nuevo
            snap("B", Some("Centro"), Some((2012, 1, 1))), // Veterano
            snap("C", Some("Centro"), Some((2022, 1, 1))), // Junior
            snap("D", Some("Centro"), None),               // invalid
            snap("E", None, Some((2020, 1, 1))),           // skipped
            snap("F", Some("Sur"), Some((2030, 1, 1))),    // future, invalid
        ];
        let view = SeniorityByBranch::build(&snapshots, today, BandSet::seniority());

        let names: Vec<&str> = view.branches.iter().map(|b| b.branch.as_str()).collect();
        assert_eq!(names, ["Centro", "norte"]);
        assert_eq!(view.branches[0].total, 2);
        assert_eq!(view.branches[0].bands, [0, 1, 0, 0, 1]);
        assert_eq!(view.branches[1].bands, [1, 0, 0, 0, 0]);
        assert_eq!(
            view.stats,
            SeniorityStats {
                total_employees: 6,
                total_branches: 2,
                valid_seniority: 3,
                invalid_seniority: 2,
            }
        );
    }

    #[test]
    fn empty_input() {
        let today = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let view = SeniorityByBranch::build(&[], today, BandSet::seniority());
        assert!(view.is_empty());
        assert_eq!(view.stats.total_branches, 0);
    }
}
