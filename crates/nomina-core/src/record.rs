//! Canonical payroll record and the adapter that builds it from raw API JSON.
//!
//! The payroll API is inconsistent about field names (`curp`, `CURP`,
//! `Curp`, ...). [`RawRecord::from_json`] resolves every known alias once,
//! at the boundary; nothing downstream looks at raw field names.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Field aliases, in lookup order ──

pub const PERSONAL_ID_FIELDS: &[&str] = &["curp", "CURP", "Curp"];
pub const TAX_ID_FIELDS: &[&str] = &["rfc", "RFC"];
pub const NAME_FIELDS: &[&str] = &["nombre", "Nombre completo", "name"];
pub const BRANCH_FIELDS: &[&str] = &["sucursal", "Sucursal", "Compañía", "compania", "branch"];
pub const JOB_TITLE_FIELDS: &[&str] = &["puesto", "Puesto", "position"];
pub const PERIOD_FIELDS: &[&str] = &["cveper", "periodo", "fecha_periodo", "mes"];
pub const SALARY_FIELDS: &[&str] = &["sueldo", "salario", "salary", " SUELDO CLIENTE "];
pub const COMMISSION_FIELDS: &[&str] = &["comisiones", "commissions"];
pub const TOTAL_FIELDS: &[&str] = &[
    " TOTAL DE PERCEPCIONES ",
    "totalPercepciones",
    "percepcionesTotales",
    "total",
];
pub const STATUS_FIELDS: &[&str] = &["status", "Status", "estado"];
pub const HIRE_DATE_FIELDS: &[&str] = &[
    "Fecha antigüedad",
    "fecha_antiguedad",
    "fechaAntiguedad",
    "start_date",
    "hire_date",
];

const DAYS_PER_YEAR: f64 = 365.25;

/// Employment status as reported by the payroll system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentStatus {
    /// `A`
    Active,
    /// `B` (baja)
    Terminated,
    /// `F` (finiquitado)
    Settled,
    Other(String),
}

impl EmploymentStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        match code.to_ascii_uppercase().as_str() {
            "" => None,
            "A" | "ACTIVO" => Some(Self::Active),
            "B" | "BAJA" => Some(Self::Terminated),
            "F" | "FINIQUITADO" => Some(Self::Settled),
            _ => Some(Self::Other(code.to_string())),
        }
    }

    /// Code sent in the `status` query parameter.
    pub fn code(&self) -> &str {
        match self {
            Self::Active => "A",
            Self::Terminated => "B",
            Self::Settled => "F",
            Self::Other(code) => code,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Active => "Activo",
            Self::Terminated => "Baja",
            Self::Settled => "Finiquitado",
            Self::Other(code) => code,
        }
    }
}

/// One payroll row for one employee in one reporting period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// CURP as received (not normalised).
    pub personal_id: Option<String>,
    /// RFC tax identifier.
    pub tax_id: Option<String>,
    pub name: Option<String>,
    pub branch: Option<String>,
    pub job_title: Option<String>,
    /// Reporting period (`cveper`).
    pub period: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub commissions: Option<f64>,
    pub total_earnings: Option<f64>,
    pub status: Option<EmploymentStatus>,
    pub hire_date: Option<NaiveDate>,
}

impl RawRecord {
    /// Build a record from one element of the API's `data` array.
    ///
    /// Non-object values produce an empty record.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            personal_id: first_string(obj, PERSONAL_ID_FIELDS),
            tax_id: first_string(obj, TAX_ID_FIELDS),
            name: first_string(obj, NAME_FIELDS),
            branch: first_string(obj, BRANCH_FIELDS),
            job_title: first_string(obj, JOB_TITLE_FIELDS),
            period: first_date(obj, PERIOD_FIELDS),
            salary: first_number(obj, SALARY_FIELDS),
            commissions: first_number(obj, COMMISSION_FIELDS),
            total_earnings: first_number(obj, TOTAL_FIELDS),
            status: first_string(obj, STATUS_FIELDS)
                .and_then(|s| EmploymentStatus::from_code(&s)),
            hire_date: first_date(obj, HIRE_DATE_FIELDS),
        }
    }

    /// Fractional years between hire date and `today`.
    ///
    /// `None` when the hire date is missing or in the future.
    pub fn seniority_years(&self, today: NaiveDate) -> Option<f64> {
        let hired = self.hire_date?;
        if hired > today {
            return None;
        }
        Some((today - hired).num_days() as f64 / DAYS_PER_YEAR)
    }

    /// Period formatted for display (`YYYY-MM`), or empty.
    pub fn period_label(&self) -> String {
        self.period
            .map(|p| p.format("%Y-%m").to_string())
            .unwrap_or_default()
    }
}

/// Parse a period or date value.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD` (optionally followed by a
/// time part), and `YYYY-MM` (taken as the first of the month).
pub fn parse_period(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.date_naive());
    }
    if let Some(head) = s.get(..10)
        && let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d")
    {
        return Some(d);
    }
    if s.len() == 7 {
        return NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok();
    }
    None
}

// ── Alias lookup helpers ──

fn first_string(obj: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().filter_map(|f| obj.get(*f)).find_map(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_number(obj: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    fields.iter().filter_map(|f| obj.get(*f)).find_map(as_number)
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | ' '))
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

/// Like the other lookups, blank or unparseable aliases fall through.
fn first_date(obj: &Map<String, Value>, fields: &[&str]) -> Option<NaiveDate> {
    fields.iter().filter_map(|f| obj.get(*f)).find_map(as_date)
}

fn as_date(v: &Value) -> Option<NaiveDate> {
    match v {
        Value::String(s) => parse_period(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|ts| ts.date_naive()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn canonical_field_names() {
        let rec = RawRecord::from_json(&json!({
            "curp": "OOFA900410HDFCRL03",
            "rfc": "OOFA900410AB1",
            "nombre": "Alberto Ochoa Frías",
            "sucursal": "Centro",
            "puesto": "ASESOR DE VENTAS",
            "cveper": "2024-10-01T00:00:00.000Z",
            "sueldo": 18500.5,
            "comisiones": "1200",
            " TOTAL DE PERCEPCIONES ": 19700.5,
            "status": "A",
            "fecha_antiguedad": "2019-02-15"
        }));
        assert_eq!(rec.personal_id.as_deref(), Some("OOFA900410HDFCRL03"));
        assert_eq!(rec.tax_id.as_deref(), Some("OOFA900410AB1"));
        assert_eq!(rec.branch.as_deref(), Some("Centro"));
        assert_eq!(rec.period, Some(date(2024, 10, 1)));
        assert_eq!(rec.salary, Some(18500.5));
        assert_eq!(rec.commissions, Some(1200.0));
        assert_eq!(rec.total_earnings, Some(19700.5));
        assert_eq!(rec.status, Some(EmploymentStatus::Active));
        assert_eq!(rec.hire_date, Some(date(2019, 2, 15)));
    }

    #[test]
    fn alias_field_names() {
        let rec = RawRecord::from_json(&json!({
            "CURP": "GALM850101MDFRPR09",
            "Nombre completo": "Laura García",
            "Compañía": "Norte",
            "Puesto": "CAJERO",
            "periodo": "2024-03",
            " SUELDO CLIENTE ": "$12,300.00",
            "Status": "F",
            "Fecha antigüedad": "2010-06-01"
        }));
        assert_eq!(rec.personal_id.as_deref(), Some("GALM850101MDFRPR09"));
        assert_eq!(rec.name.as_deref(), Some("Laura García"));
        assert_eq!(rec.branch.as_deref(), Some("Norte"));
        assert_eq!(rec.job_title.as_deref(), Some("CAJERO"));
        assert_eq!(rec.period, Some(date(2024, 3, 1)));
        assert_eq!(rec.salary, Some(12300.0));
        assert_eq!(rec.status, Some(EmploymentStatus::Settled));
    }

    #[test]
    fn blank_alias_falls_through_to_next() {
        let rec = RawRecord::from_json(&json!({ "curp": "  ", "CURP": "X" }));
        assert_eq!(rec.personal_id.as_deref(), Some("X"));
    }

    #[test]
    fn blank_date_alias_falls_through_to_next() {
        let rec = RawRecord::from_json(&json!({
            "cveper": "",
            "periodo": "2024-09-15",
            "Fecha antigüedad": "  ",
            "fecha_antiguedad": "2019-03-01",
        }));
        assert_eq!(rec.period, Some(date(2024, 9, 15)));
        assert_eq!(rec.hire_date, Some(date(2019, 3, 1)));
    }

    #[test]
    fn non_object_is_empty() {
        assert_eq!(RawRecord::from_json(&json!([1, 2])), RawRecord::default());
        assert_eq!(RawRecord::from_json(&Value::Null), RawRecord::default());
    }

    #[test]
    fn numeric_hire_date_is_epoch_millis() {
        let rec = RawRecord::from_json(&json!({ "hire_date": 1_577_836_800_000_i64 }));
        assert_eq!(rec.hire_date, Some(date(2020, 1, 1)));
    }

    #[test]
    fn period_formats() {
        assert_eq!(parse_period("2024-01"), Some(date(2024, 1, 1)));
        assert_eq!(parse_period("2024-01-31"), Some(date(2024, 1, 31)));
        assert_eq!(parse_period("2024-01-31 00:00:00"), Some(date(2024, 1, 31)));
        assert_eq!(parse_period("2024-02-01T06:00:00Z"), Some(date(2024, 2, 1)));
        assert_eq!(parse_period(""), None);
        assert_eq!(parse_period("octubre"), None);
        assert_eq!(parse_period("2024-13"), None);
    }

    #[test]
    fn status_codes() {
        assert_eq!(EmploymentStatus::from_code("b"), Some(EmploymentStatus::Terminated));
        assert_eq!(EmploymentStatus::from_code(""), None);
        let other = EmploymentStatus::from_code("X").unwrap();
        assert_eq!(other.code(), "X");
        assert_eq!(EmploymentStatus::Settled.label(), "Finiquitado");
    }

    #[test]
    fn seniority_in_years() {
        let rec = RawRecord {
            hire_date: Some(date(2020, 1, 1)),
            ..Default::default()
        };
        let years = rec.seniority_years(date(2024, 1, 1)).unwrap();
        assert!((years - 4.0).abs() < 0.01);
        assert!(rec.seniority_years(date(2019, 1, 1)).is_none());
        assert!(RawRecord::default().seniority_years(date(2024, 1, 1)).is_none());
    }
}
