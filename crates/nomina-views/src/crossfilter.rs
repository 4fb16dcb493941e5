//! Narrow a snapshot set to what another chart has selected.

use chrono::NaiveDate;
use nomina_core::band::BandSet;
use nomina_core::category::job_category;
use nomina_core::dedupe::Snapshot;
use nomina_core::identity::IdentityConfig;
use nomina_core::selection::SelectionData;

pub struct CrossFilter<'a> {
    pub today: NaiveDate,
    pub identity: &'a IdentityConfig,
    pub salary_bands: &'a BandSet,
}

impl CrossFilter<'_> {
    pub fn matches(&self, selection: &SelectionData, snapshot: &Snapshot) -> bool {
        let record = &snapshot.record;
        match selection {
            SelectionData::PyramidAgeGender { age, gender } => {
                snapshot.sex() == *gender && self.age_of(snapshot) == Some(*age)
            }
            SelectionData::SalaryAgeGenderBand { age, gender, band } => {
                snapshot.sex() == *gender
                    && self.age_of(snapshot) == Some(*age)
                    && self
                        .salary_bands
                        .classify_opt(record.salary)
                        .is_some_and(|b| b.name == *band)
            }
            SelectionData::PositionGender {
                position, gender, ..
            } => snapshot.sex() == *gender && record.job_title.as_deref() == Some(position.as_str()),
            SelectionData::GeneralFilter { filter_type, value } => {
                let field = match filter_type.as_str() {
                    "sucursal" => record.branch.as_deref(),
                    "puesto" => record.job_title.as_deref(),
                    "puestoCategorizado" | "categoria" => {
                        return job_category(record.job_title.as_deref().unwrap_or_default())
                            == value.as_str();
                    }
                    "status" | "estado" => record.status.as_ref().map(|s| s.code()),
                    "cveper" | "periodo" => {
                        return record.period_label() == *value;
                    }
                    _ => return true,
                };
                field == Some(value.as_str())
            }
        }
    }

    /// Snapshots matching `selection`, or all of them when nothing is selected.
    pub fn apply<'s>(
        &self,
        selection: Option<&SelectionData>,
        snapshots: &'s [Snapshot],
    ) -> Vec<&'s Snapshot> {
        match selection {
            Some(sel) => snapshots.iter().filter(|s| self.matches(sel, s)).collect(),
            None => snapshots.iter().collect(),
        }
    }

    fn age_of(&self, snapshot: &Snapshot) -> Option<u32> {
        snapshot.identity(self.today, self.identity).map(|id| id.age)
    }
}
