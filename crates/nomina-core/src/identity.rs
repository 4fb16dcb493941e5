//! Birth date and sex extraction from CURP-like personal identifiers.
//!
//! A CURP is an 18-character fixed-format string. Only the leading
//! positions carry demographic data:
//!
//! - `[0..4)`  initials from the full name
//! - `[4..6)`  two-digit birth year
//! - `[6..8)`  birth month
//! - `[8..10)` birth day
//! - `[10]`    sex code: `H` (hombre) or `M` (mujer)
//! - `[11..]`  state of birth, consonants, homoclave
//!
//! Example: `OOFA900410HDFCRL03` is a man born on 10 April 1990.
//!
//! The birth date and the sex code are extracted independently: an
//! identifier with a garbled date can still report a usable sex code.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Identifiers shorter than this are rejected outright.
pub const MIN_IDENTITY_LEN: usize = 12;

/// Two-digit years up to and including this value belong to the 2000s.
pub const DEFAULT_YEAR_PIVOT: u32 = 24;

const YEAR_OFFSET: usize = 4;
const MONTH_OFFSET: usize = 6;
const DAY_OFFSET: usize = 8;
const SEX_OFFSET: usize = 10;

/// Sex as encoded in the identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    /// `H` → male, `M` → female, anything else → unknown.
    pub fn from_code(code: char) -> Self {
        match code.to_ascii_uppercase() {
            'H' => Self::Male,
            'M' => Self::Female,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        }
    }
}

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Two-digit years `<= year_pivot` map to `20yy`, the rest to `19yy`.
    ///
    /// This is a sliding heuristic, not calendar data. It has to move
    /// forward as the workforce's birth years do.
    pub year_pivot: u32,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            year_pivot: DEFAULT_YEAR_PIVOT,
        }
    }
}

impl IdentityConfig {
    pub fn with_year_pivot(year_pivot: u32) -> Self {
        Self { year_pivot }
    }

    /// Expand a two-digit year to four digits.
    pub fn full_year(&self, two_digit: u32) -> i32 {
        if two_digit <= self.year_pivot {
            2000 + two_digit as i32
        } else {
            1900 + two_digit as i32
        }
    }
}

/// Demographic data derived from a personal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParsedIdentity {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Completed years as of the reference date.
    pub age: u32,
    pub sex: Sex,
}

/// Trim and uppercase an identifier. Returns `None` for blank input.
pub fn normalize_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Parse an identifier against today's local date with the default pivot.
pub fn parse_identity(id: &str) -> Option<ParsedIdentity> {
    parse_identity_at(id, Local::now().date_naive(), &IdentityConfig::default())
}

/// Parse an identifier as of `today`.
///
/// Returns `None` when the identifier is shorter than
/// [`MIN_IDENTITY_LEN`], when a date fragment is not two ASCII digits,
/// when month/day fall outside `1..=12` / `1..=31`, or when the birth
/// date lies after `today`. Month lengths and leap years are not checked.
pub fn parse_identity_at(
    id: &str,
    today: NaiveDate,
    config: &IdentityConfig,
) -> Option<ParsedIdentity> {
    let chars: Vec<char> = normalize_id(id)?.chars().collect();
    if chars.len() < MIN_IDENTITY_LEN {
        return None;
    }

    let yy = two_digits(&chars, YEAR_OFFSET)?;
    let month = two_digits(&chars, MONTH_OFFSET)?;
    let day = two_digits(&chars, DAY_OFFSET)?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        tracing::debug!(id, month, day, "identifier with implausible birth date");
        return None;
    }

    let year = config.full_year(yy);
    let mut age = today.year() - year;
    if (today.month(), today.day()) < (month, day) {
        age -= 1;
    }
    let age = u32::try_from(age).ok()?;

    Some(ParsedIdentity {
        year,
        month,
        day,
        age,
        sex: Sex::from_code(chars[SEX_OFFSET]),
    })
}

/// Extract only the sex code, ignoring the date fragments.
pub fn sex_code(id: &str) -> Sex {
    normalize_id(id)
        .and_then(|id| id.chars().nth(SEX_OFFSET))
        .map(Sex::from_code)
        .unwrap_or_default()
}

fn two_digits(chars: &[char], offset: usize) -> Option<u32> {
    let hi = chars.get(offset)?.to_digit(10)?;
    let lo = chars.get(offset + 1)?.to_digit(10)?;
    Some(hi * 10 + lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parse(id: &str, today: NaiveDate) -> Option<ParsedIdentity> {
        parse_identity_at(id, today, &IdentityConfig::default())
    }

    #[test]
    fn reference_identifier() {
        let p = parse("OOFA900410HDFCRL03", date(2024, 10, 1)).unwrap();
        assert_eq!((p.year, p.month, p.day), (1990, 4, 10));
        assert_eq!(p.age, 34);
        assert_eq!(p.sex, Sex::Male);
    }

    #[test]
    fn age_drops_one_before_birthday() {
        let id = "OOFA900410HDFCRL03";
        assert_eq!(parse(id, date(2024, 4, 9)).unwrap().age, 33);
        assert_eq!(parse(id, date(2024, 4, 10)).unwrap().age, 34);
        assert_eq!(parse(id, date(2024, 3, 30)).unwrap().age, 33);
    }

    #[test]
    fn reference_identifier_against_clock() {
        let p = parse_identity("OOFA900410HDFCRL03").unwrap();
        let today = Local::now().date_naive();
        let mut expected = today.year() - 1990;
        if (today.month(), today.day()) < (4, 10) {
            expected -= 1;
        }
        assert_eq!(p.age as i32, expected);
        assert_eq!(p.sex, Sex::Male);
    }

    #[test]
    fn female_code() {
        let p = parse("GALM850101MDFRPR09", date(2024, 6, 1)).unwrap();
        assert_eq!(p.sex, Sex::Female);
        assert_eq!(p.year, 1985);
    }

    #[test]
    fn unknown_sex_code() {
        let p = parse("GALM850101XDFRPR09", date(2024, 6, 1)).unwrap();
        assert_eq!(p.sex, Sex::Unknown);
    }

    #[test]
    fn year_window_boundary() {
        let today = date(2030, 1, 1);
        assert_eq!(parse("AAAA240101HDFXXX01", today).unwrap().year, 2024);
        assert_eq!(parse("AAAA250101HDFXXX01", today).unwrap().year, 1925);
        assert_eq!(parse("AAAA000101HDFXXX01", today).unwrap().year, 2000);
    }

    #[test]
    fn configurable_pivot() {
        let config = IdentityConfig::with_year_pivot(10);
        let p = parse_identity_at("AAAA150101HDFXXX01", date(2024, 1, 1), &config).unwrap();
        assert_eq!(p.year, 1915);
        assert_eq!(p.age, 109);
    }

    #[test]
    fn too_short() {
        assert!(parse("AB", date(2024, 1, 1)).is_none());
        assert!(parse("OOFA900410H", date(2024, 1, 1)).is_none());
        assert!(parse("", date(2024, 1, 1)).is_none());
    }

    #[test]
    fn lowercase_and_whitespace_normalised() {
        let today = date(2024, 10, 1);
        assert_eq!(
            parse("  oofa900410hdfcrl03 ", today),
            parse("OOFA900410HDFCRL03", today)
        );
    }

    #[test]
    fn non_numeric_fragments_rejected() {
        let today = date(2024, 1, 1);
        assert!(parse("OOFAX00410HDFCRL03", today).is_none());
        assert!(parse("OOFA90A410HDFCRL03", today).is_none());
        assert!(parse("OOFA9004X0HDFCRL03", today).is_none());
    }

    #[test]
    fn implausible_month_or_day_rejected() {
        let today = date(2024, 1, 1);
        assert!(parse("OOFA901310HDFCRL03", today).is_none());
        assert!(parse("OOFA900010HDFCRL03", today).is_none());
        assert!(parse("OOFA900432HDFCRL03", today).is_none());
        assert!(parse("OOFA900400HDFCRL03", today).is_none());
    }

    #[test]
    fn no_month_length_validation() {
        // 31 February passes the plausibility check.
        assert!(parse("OOFA900231HDFCRL03", date(2024, 6, 1)).is_some());
    }

    #[test]
    fn birth_after_today_rejected() {
        assert!(parse("AAAA241201HDFXXX01", date(2024, 6, 1)).is_none());
    }

    #[test]
    fn sex_survives_bad_date() {
        assert_eq!(sex_code("OOFAXX0410HDFCRL03"), Sex::Male);
        assert_eq!(sex_code("OOFAXX0410MDFCRL03"), Sex::Female);
        assert_eq!(sex_code("SHORT"), Sex::Unknown);
    }

    #[test]
    fn well_formed_ids_have_bounded_output() {
        let today = date(2025, 3, 15);
        for yy in 0..100u32 {
            for (mm, dd) in [(1, 1), (3, 15), (12, 31)] {
                for code in ['H', 'M', 'X'] {
                    let id = format!("ABCD{yy:02}{mm:02}{dd:02}{code}DFXXX01");
                    if let Some(p) = parse(&id, today) {
                        assert!(p.age < 130);
                        assert!(matches!(p.sex, Sex::Male | Sex::Female | Sex::Unknown));
                    }
                }
            }
        }
    }
}
