//! Population pyramid: employees per age and sex.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use nomina_core::dedupe::Snapshot;
use nomina_core::identity::{IdentityConfig, Sex};
use serde::Serialize;

use crate::presenter::Aggregate;

/// Age range shown when there is no data.
pub const DEFAULT_AGE_RANGE: (u32, u32) = (15, 80);

/// Axis ticks are multiples of this.
const AXIS_STEP: u64 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SexCounts {
    pub male: u64,
    pub female: u64,
}

impl SexCounts {
    pub fn add(&mut self, sex: Sex) {
        match sex {
            Sex::Male => self.male += 1,
            Sex::Female => self.female += 1,
            Sex::Unknown => {}
        }
    }

    pub fn total(&self) -> u64 {
        self.male + self.female
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PyramidStats {
    /// Male plus female.
    pub total_employees: u64,
    pub total_male: u64,
    pub total_female: u64,
    pub total_unknown: u64,
    /// Mean age over employees with a usable birth date.
    pub average_age: f64,
    /// Employees with a usable birth date.
    pub total_in_pyramid: u64,
    pub male_percentage: f64,
    pub female_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pyramid {
    pub ages: BTreeMap<u32, SexCounts>,
    pub stats: PyramidStats,
}

impl Pyramid {
    /// Sex tallies use the identifier's sex code even when its birth date is
    /// unusable; only employees with a birth date enter the age bars.
    pub fn build(snapshots: &[Snapshot], today: NaiveDate, config: &IdentityConfig) -> Self {
        let mut ages: BTreeMap<u32, SexCounts> = BTreeMap::new();
        let mut totals = SexCounts::default();
        let mut unknown = 0u64;
        let mut age_sum = 0u64;
        let mut with_age = 0u64;

        for snapshot in snapshots {
            let sex = snapshot.sex();
            match sex {
                Sex::Unknown => unknown += 1,
                _ => totals.add(sex),
            }
            if let Some(identity) = snapshot.identity(today, config) {
                ages.entry(identity.age).or_default().add(sex);
                age_sum += u64::from(identity.age);
                with_age += 1;
            }
        }

        let total = totals.total();
        let pct = |n: u64| {
            if total > 0 {
                n as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };
        let stats = PyramidStats {
            total_employees: total,
            total_male: totals.male,
            total_female: totals.female,
            total_unknown: unknown,
            average_age: if with_age > 0 {
                age_sum as f64 / with_age as f64
            } else {
                0.0
            },
            total_in_pyramid: with_age,
            male_percentage: pct(totals.male),
            female_percentage: pct(totals.female),
        };

        Self { ages, stats }
    }

    /// Shared scale for both sides: the largest bar rounded up to a multiple of 5.
    pub fn axis_limit(&self) -> u64 {
        let max = self
            .ages
            .values()
            .map(|c| c.male.max(c.female))
            .max()
            .unwrap_or(0);
        max.div_ceil(AXIS_STEP) * AXIS_STEP
    }

    /// Youngest and oldest age with at least one bar.
    pub fn age_range(&self) -> (u32, u32) {
        let mut with_data = self
            .ages
            .iter()
            .filter(|(_, c)| c.total() > 0)
            .map(|(age, _)| *age);
        match with_data.next() {
            Some(min) => (min, with_data.last().unwrap_or(min)),
            None => DEFAULT_AGE_RANGE,
        }
    }

    /// One row per age in [`Self::age_range`], oldest first, gaps filled with zeros.
    pub fn rows(&self) -> Vec<(u32, SexCounts)> {
        let (min, max) = self.age_range();
        (min..=max)
            .rev()
            .map(|age| (age, self.ages.get(&age).copied().unwrap_or_default()))
            .collect()
    }
}

impl Aggregate for Pyramid {
    fn is_empty(&self) -> bool {
        self.stats.total_employees == 0 && self.stats.total_unknown == 0
    }
}
