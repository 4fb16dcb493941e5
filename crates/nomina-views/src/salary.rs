//! Salary bands split by sex, with an age-band breakdown.

use chrono::NaiveDate;
use nomina_core::band::{Band, BandSet};
use nomina_core::dedupe::Snapshot;
use nomina_core::identity::{IdentityConfig, Sex};
use serde::Serialize;

use crate::presenter::Aggregate;
use crate::pyramid::SexCounts;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryBandRow {
    pub band: Band,
    pub male: u64,
    pub female: u64,
    pub unknown: u64,
    /// Over employees in the band with a usable birth date.
    pub average_age: Option<f64>,
}

impl SalaryBandRow {
    pub fn total(&self) -> u64 {
        self.male + self.female + self.unknown
    }
}

/// Salary band counts per age band, for the salary/age pyramid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBandRow {
    pub age_band: Band,
    /// Aligned with the salary band table.
    pub salary_bands: Vec<SexCounts>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryBands {
    pub rows: Vec<SalaryBandRow>,
    pub by_age: Vec<AgeBandRow>,
    /// Employees skipped for lack of a salary.
    pub without_salary: u64,
}

impl SalaryBands {
    pub fn build(
        snapshots: &[Snapshot],
        today: NaiveDate,
        config: &IdentityConfig,
        salary_bands: &BandSet,
        age_bands: &BandSet,
    ) -> Self {
        let mut rows: Vec<SalaryBandRow> = salary_bands
            .bands()
            .iter()
            .map(|band| SalaryBandRow {
                band: band.clone(),
                male: 0,
                female: 0,
                unknown: 0,
                average_age: None,
            })
            .collect();
        let mut by_age: Vec<AgeBandRow> = age_bands
            .bands()
            .iter()
            .map(|band| AgeBandRow {
                age_band: band.clone(),
                salary_bands: vec![SexCounts::default(); salary_bands.len()],
            })
            .collect();
        let mut age_sums = vec![(0u64, 0u64); salary_bands.len()];
        let mut without_salary = 0u64;

        for snapshot in snapshots {
            let Some(slot) = snapshot.record.salary.and_then(|s| salary_bands.index_of(s)) else {
                without_salary += 1;
                continue;
            };
            let sex = snapshot.sex();
            let row = &mut rows[slot];
            match sex {
                Sex::Male => row.male += 1,
                Sex::Female => row.female += 1,
                Sex::Unknown => row.unknown += 1,
            }
            if let Some(identity) = snapshot.identity(today, config) {
                age_sums[slot].0 += u64::from(identity.age);
                age_sums[slot].1 += 1;
                if let Some(age_slot) = age_bands.index_of(f64::from(identity.age)) {
                    by_age[age_slot].salary_bands[slot].add(sex);
                }
            }
        }

        for (row, (sum, n)) in rows.iter_mut().zip(age_sums) {
            row.average_age = (n > 0).then(|| sum as f64 / n as f64);
        }

        Self {
            rows,
            by_age,
            without_salary,
        }
    }
}

impl Aggregate for SalaryBands {
    fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.total() == 0)
    }
}
