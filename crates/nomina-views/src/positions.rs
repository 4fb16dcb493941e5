//! Headcount and mean salary per job title, split by sex.

use std::collections::HashMap;

use nomina_core::category::job_category;
use nomina_core::dedupe::Snapshot;
use nomina_core::identity::Sex;
use serde::Serialize;

use crate::presenter::Aggregate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRow {
    pub job_title: String,
    pub category: &'static str,
    pub male: u64,
    pub female: u64,
    pub unknown: u64,
    pub average_salary: Option<f64>,
    #[serde(skip)]
    salary_sum: f64,
    #[serde(skip)]
    salary_n: u64,
}

impl PositionRow {
    fn new(job_title: &str) -> Self {
        Self {
            job_title: job_title.to_string(),
            category: job_category(job_title),
            male: 0,
            female: 0,
            unknown: 0,
            average_salary: None,
            salary_sum: 0.0,
            salary_n: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.male + self.female + self.unknown
    }
}

/// Rows sorted by headcount, largest first, then by title.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Positions {
    pub rows: Vec<PositionRow>,
    /// Employees without a job title.
    pub untitled: u64,
}

impl Positions {
    pub fn build(snapshots: &[Snapshot]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut rows: Vec<PositionRow> = Vec::new();
        let mut untitled = 0u64;

        for snapshot in snapshots {
            let Some(title) = snapshot.record.job_title.as_deref() else {
                untitled += 1;
                continue;
            };
            let i = *index.entry(title).or_insert_with(|| {
                rows.push(PositionRow::new(title));
                rows.len() - 1
            });
            let row = &mut rows[i];
            match snapshot.sex() {
                Sex::Male => row.male += 1,
                Sex::Female => row.female += 1,
                Sex::Unknown => row.unknown += 1,
            }
            if let Some(salary) = snapshot.record.salary {
                row.salary_sum += salary;
                row.salary_n += 1;
            }
        }

        for row in &mut rows {
            row.average_salary = (row.salary_n > 0).then(|| row.salary_sum / row.salary_n as f64);
        }
        rows.sort_by(|a, b| {
            b.total()
                .cmp(&a.total())
                .then_with(|| a.job_title.cmp(&b.job_title))
        });

        Self { rows, untitled }
    }

    /// Only rows whose title maps to `category`.
    pub fn in_category(&self, category: &str) -> impl Iterator<Item = &PositionRow> {
        self.rows.iter().filter(move |r| r.category == category)
    }
}

impl Aggregate for Positions {
    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
