//! Collapse per-period payroll rows into one snapshot per employee.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::identity::{self, IdentityConfig, ParsedIdentity, Sex};
use crate::record::RawRecord;

/// The most recent record for one normalised personal ID.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Trimmed, uppercased personal ID.
    pub key: String,
    pub record: RawRecord,
}

impl Snapshot {
    pub fn identity(&self, today: NaiveDate, config: &IdentityConfig) -> Option<ParsedIdentity> {
        identity::parse_identity_at(&self.key, today, config)
    }

    /// Sex from the identifier alone; available even when the birth date is not.
    pub fn sex(&self) -> Sex {
        identity::sex_code(&self.key)
    }
}

/// Keep one record per normalised personal ID.
///
/// Records without a usable ID are dropped. Among records sharing a key,
/// the one with the strictly later `period` wins; a record with a period
/// beats one without; otherwise the first-seen record is kept. Output is
/// in order of first occurrence of each key.
pub fn dedupe<I>(records: I) -> Vec<Snapshot>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Snapshot> = Vec::new();
    let mut dropped = 0usize;

    for record in records {
        let Some(key) = record.personal_id.as_deref().and_then(identity::normalize_id) else {
            dropped += 1;
            continue;
        };
        match index.get(&key) {
            Some(&i) => {
                if supersedes(record.period, out[i].record.period) {
                    out[i].record = record;
                }
            }
            None => {
                index.insert(key.clone(), out.len());
                out.push(Snapshot { key, record });
            }
        }
    }

    tracing::debug!(unique = out.len(), dropped, "deduplicated records");
    out
}

fn supersedes(candidate: Option<NaiveDate>, current: Option<NaiveDate>) -> bool {
    match (candidate, current) {
        (Some(c), Some(e)) => c > e,
        (Some(_), None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::BandSet;
    use crate::record::parse_period;

    fn rec(id: &str, period: Option<&str>, name: &str) -> RawRecord {
        RawRecord {
            personal_id: Some(id.into()),
            period: period.and_then(parse_period),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn keeps_latest_period() {
        let out = dedupe(vec![
            rec("X", Some("2024-01"), "jan"),
            rec("X", Some("2024-03"), "mar"),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record.period_label(), "2024-03");
    }

    #[test]
    fn earlier_period_does_not_replace() {
        let out = dedupe(vec![
            rec("X", Some("2024-03"), "mar"),
            rec("X", Some("2024-01"), "jan"),
        ]);
        assert_eq!(out[0].record.name.as_deref(), Some("mar"));
    }

    #[test]
    fn case_and_whitespace_variants_collapse() {
        let out = dedupe(vec![rec("x", None, "a"), rec("X ", None, "b")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "X");
    }

    #[test]
    fn missing_periods_keep_first_seen() {
        let out = dedupe(vec![rec("X", None, "first"), rec("X", Some("garbage"), "second")]);
        assert_eq!(out[0].record.name.as_deref(), Some("first"));
    }

    #[test]
    fn equal_periods_keep_first_seen() {
        let out = dedupe(vec![
            rec("X", Some("2024-03"), "first"),
            rec("X", Some("2024-03-01"), "second"),
        ]);
        assert_eq!(out[0].record.name.as_deref(), Some("first"));
    }

    #[test]
    fn dated_record_beats_undated() {
        let out = dedupe(vec![rec("X", None, "undated"), rec("X", Some("2020-01"), "dated")]);
        assert_eq!(out[0].record.name.as_deref(), Some("dated"));
    }

    #[test]
    fn records_without_id_dropped() {
        let mut no_id = rec("", None, "blank");
        no_id.personal_id = None;
        let out = dedupe(vec![no_id, rec("   ", None, "spaces"), rec("Y", None, "y")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "Y");
    }

    #[test]
    fn first_occurrence_order() {
        let out = dedupe(vec![
            rec("B", Some("2024-01"), ""),
            rec("A", Some("2024-01"), ""),
            rec("B", Some("2024-02"), ""),
            rec("C", None, ""),
        ]);
        let keys: Vec<&str> = out.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["B", "A", "C"]);
    }

    #[test]
    fn snapshot_sex_without_birth_date() {
        let out = dedupe(vec![rec("OOFAXX0410MDFCRL03", None, "")]);
        assert_eq!(out[0].sex(), Sex::Female);
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(out[0].identity(today, &IdentityConfig::default()).is_none());
    }

    #[test]
    fn surviving_snapshots_land_in_one_age_band() {
        let today = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let config = IdentityConfig::default();
        let ages = BandSet::age();
        let out = dedupe(vec![
            rec("oofa900410hdfcrl03 ", Some("2024-08"), "old"),
            rec("OOFA900410HDFCRL03", Some("2024-09"), "new"),
            rec("GAMA900101MDFRRR01", Some("2024-09"), ""),
            rec("LOPE000215HDFRRR09", None, ""),
            rec("PERE580505XDFRRR01", Some("2024-01"), ""),
            rec(" pere580505xdfrrr01", Some("2023-12"), ""),
        ]);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].record.name.as_deref(), Some("new"));

        let mut seen = Vec::new();
        for snapshot in &out {
            let age = snapshot.identity(today, &config).unwrap().age;
            let band = ages.classify(f64::from(age)).unwrap();
            let containing: Vec<_> = ages
                .bands()
                .iter()
                .filter(|b| b.contains(f64::from(age)))
                .collect();
            assert_eq!(containing, [band]);
            seen.push((age, band.name.as_str()));
        }
        assert_eq!(seen, [(34, "30-34"), (34, "30-34"), (24, "20-24"), (66, "65+")]);
    }
}
