//! Labelled half-open ranges for bucketing continuous values.
//!
//! A [`BandSet`] is validated once at construction: bands must start at
//! zero, be sorted and contiguous (`max` of one band equals `min` of the
//! next), and end with an unbounded band. Lookup over a valid set is total
//! for every non-negative value and never fails.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BandError {
    #[error("band table is empty")]
    Empty,

    #[error("first band must start at 0, starts at {0}")]
    NotAnchored(f64),

    #[error("band {index} ({label}) has a non-finite or inverted range")]
    InvalidRange { index: usize, label: String },

    #[error("band {index} ({label}) ends at {max} but the next band starts at {next_min}")]
    NotContiguous {
        index: usize,
        label: String,
        max: f64,
        next_min: f64,
    },

    #[error("band {index} ({label}) is unbounded but is not the last band")]
    UnboundedNotLast { index: usize, label: String },

    #[error("last band ({0}) must be unbounded")]
    BoundedTerminal(String),
}

/// `[min, max)`, or `[min, ∞)` when `max` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    pub name: String,
    pub label: String,
    pub min: f64,
    pub max: Option<f64>,
}

impl Band {
    pub fn bounded(name: &str, label: &str, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            min,
            max: Some(max),
        }
    }

    pub fn unbounded(name: &str, label: &str, min: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            min,
            max: None,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.is_none_or(|max| value < max)
    }
}

/// An ordered, contiguous set of bands covering `[0, ∞)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandSet {
    bands: Vec<Band>,
}

impl BandSet {
    pub fn new(bands: Vec<Band>) -> Result<Self, BandError> {
        let first = bands.first().ok_or(BandError::Empty)?;
        if first.min != 0.0 {
            return Err(BandError::NotAnchored(first.min));
        }

        let last = bands.len() - 1;
        for (index, band) in bands.iter().enumerate() {
            let label = || band.label.clone();
            if !band.min.is_finite() {
                return Err(BandError::InvalidRange { index, label: label() });
            }
            match band.max {
                None if index != last => {
                    return Err(BandError::UnboundedNotLast { index, label: label() });
                }
                None => {}
                Some(_) if index == last => return Err(BandError::BoundedTerminal(label())),
                Some(max) => {
                    if !max.is_finite() || max <= band.min {
                        return Err(BandError::InvalidRange { index, label: label() });
                    }
                    let next_min = bands[index + 1].min;
                    if max != next_min {
                        return Err(BandError::NotContiguous {
                            index,
                            label: label(),
                            max,
                            next_min,
                        });
                    }
                }
            }
        }

        Ok(Self { bands })
    }

    /// The band containing `value`, or `None` for negative or NaN input.
    pub fn classify(&self, value: f64) -> Option<&Band> {
        self.index_of(value).map(|i| &self.bands[i])
    }

    pub fn classify_opt(&self, value: Option<f64>) -> Option<&Band> {
        value.and_then(|v| self.classify(v))
    }

    pub fn index_of(&self, value: f64) -> Option<usize> {
        if value.is_nan() || value < 0.0 {
            return None;
        }
        self.bands.iter().position(|b| b.contains(value))
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    // ── Built-in tables ──

    /// Years of service.
    pub fn seniority() -> Self {
        Self {
            bands: vec![
                Band::bounded("Nuevo", "< 1 año", 0.0, 1.0),
                Band::bounded("Junior", "1-3 años", 1.0, 3.0),
                Band::bounded("Intermedio", "3-5 años", 3.0, 5.0),
                Band::bounded("Senior", "5-10 años", 5.0, 10.0),
                Band::unbounded("Veterano", "10+ años", 10.0),
            ],
        }
    }

    /// Monthly salary in MXN.
    pub fn salary() -> Self {
        Self {
            bands: vec![
                Band::bounded("Bajo", "< $10K", 0.0, 10_000.0),
                Band::bounded("Medio-Bajo", "$10K - $20K", 10_000.0, 20_000.0),
                Band::bounded("Medio", "$20K - $35K", 20_000.0, 35_000.0),
                Band::bounded("Medio-Alto", "$35K - $50K", 35_000.0, 50_000.0),
                Band::unbounded("Alto", "> $50K", 50_000.0),
            ],
        }
    }

    /// Age in years: under 20, five-year groups to 64, then 65+.
    pub fn age() -> Self {
        let mut bands = vec![Band::bounded("<20", "< 20", 0.0, 20.0)];
        for start in (20..65).step_by(5) {
            let label = format!("{}-{}", start, start + 4);
            bands.push(Band::bounded(&label, &label, start as f64, (start + 5) as f64));
        }
        bands.push(Band::unbounded("65+", "65+", 65.0));
        Self { bands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_are_valid() {
        for set in [BandSet::seniority(), BandSet::salary(), BandSet::age()] {
            assert_eq!(BandSet::new(set.bands().to_vec()), Ok(set));
        }
    }

    #[test]
    fn age_table_shape() {
        let ages = BandSet::age();
        assert_eq!(ages.len(), 11);
        assert_eq!(ages.classify(19.9).unwrap().name, "<20");
        assert_eq!(ages.classify(20.0).unwrap().name, "20-24");
        assert_eq!(ages.classify(64.0).unwrap().name, "60-64");
        assert_eq!(ages.classify(65.0).unwrap().name, "65+");
    }

    #[test]
    fn half_open_boundaries() {
        let s = BandSet::seniority();
        assert_eq!(s.classify(0.0).unwrap().name, "Nuevo");
        assert_eq!(s.classify(0.99).unwrap().name, "Nuevo");
        assert_eq!(s.classify(1.0).unwrap().name, "Junior");
        assert_eq!(s.classify(9.999).unwrap().name, "Senior");
        assert_eq!(s.classify(10.0).unwrap().name, "Veterano");
        assert_eq!(s.classify(f64::INFINITY).unwrap().name, "Veterano");
    }

    #[test]
    fn negative_nan_and_missing() {
        let s = BandSet::salary();
        assert!(s.classify(-1.0).is_none());
        assert!(s.classify(f64::NAN).is_none());
        assert!(s.classify_opt(None).is_none());
    }

    #[test]
    fn exactly_one_band_matches() {
        for set in [BandSet::seniority(), BandSet::salary(), BandSet::age()] {
            let mut v = 0.0;
            while v < 80_000.0 {
                let hits = set.bands().iter().filter(|b| b.contains(v)).count();
                assert_eq!(hits, 1, "value {v}");
                v += 0.5 + v * 0.1;
            }
        }
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(BandSet::new(vec![]), Err(BandError::Empty));
    }

    #[test]
    fn rejects_unanchored() {
        let err = BandSet::new(vec![Band::unbounded("a", "a", 1.0)]).unwrap_err();
        assert_eq!(err, BandError::NotAnchored(1.0));
    }

    #[test]
    fn rejects_gap() {
        let err = BandSet::new(vec![
            Band::bounded("a", "a", 0.0, 1.0),
            Band::unbounded("b", "b", 2.0),
        ])
        .unwrap_err();
        assert!(matches!(err, BandError::NotContiguous { index: 0, .. }));
    }

    #[test]
    fn rejects_overlap() {
        let err = BandSet::new(vec![
            Band::bounded("a", "a", 0.0, 5.0),
            Band::unbounded("b", "b", 3.0),
        ])
        .unwrap_err();
        assert!(matches!(err, BandError::NotContiguous { .. }));
    }

    #[test]
    fn rejects_inverted() {
        let err = BandSet::new(vec![
            Band::bounded("a", "a", 0.0, 0.0),
            Band::unbounded("b", "b", 0.0),
        ])
        .unwrap_err();
        assert!(matches!(err, BandError::InvalidRange { index: 0, .. }));
    }

    #[test]
    fn rejects_bounded_terminal() {
        let err = BandSet::new(vec![Band::bounded("a", "a", 0.0, 10.0)]).unwrap_err();
        assert_eq!(err, BandError::BoundedTerminal("a".into()));
    }

    #[test]
    fn rejects_early_unbounded() {
        let err = BandSet::new(vec![
            Band::unbounded("a", "a", 0.0),
            Band::unbounded("b", "b", 10.0),
        ])
        .unwrap_err();
        assert!(matches!(err, BandError::UnboundedNotLast { index: 0, .. }));
    }
}
