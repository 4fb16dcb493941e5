//! CSV export of employee rows.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use crate::dedupe::Snapshot;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer error: {0}")]
    Buffer(String),

    #[error("row {row} has {got} fields, expected {expected}")]
    RowWidth {
        row: usize,
        got: usize,
        expected: usize,
    },
}

pub const SNAPSHOT_HEADERS: &[&str] = &[
    "CURP",
    "RFC",
    "Nombre",
    "Sucursal",
    "Puesto",
    "Periodo",
    "Sueldo",
    "Comisiones",
    "Total Percepciones",
    "Estado",
    "Fecha Antigüedad",
];

/// Write a header line and rows. Every field is double-quoted.
pub fn export_csv<R, F>(headers: &[&str], rows: R) -> Result<String, ExportError>
where
    R: IntoIterator<Item = Vec<F>>,
    F: AsRef<str>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != headers.len() {
            return Err(ExportError::RowWidth {
                row: i,
                got: row.len(),
                expected: headers.len(),
            });
        }
        writer.write_record(row.iter().map(|f| f.as_ref()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

/// One row per snapshot with the [`SNAPSHOT_HEADERS`] columns.
pub fn snapshots_to_csv(snapshots: &[Snapshot]) -> Result<String, ExportError> {
    let rows = snapshots.iter().map(|s| {
        let r = &s.record;
        vec![
            s.key.clone(),
            r.tax_id.clone().unwrap_or_default(),
            r.name.clone().unwrap_or_default(),
            r.branch.clone().unwrap_or_default(),
            r.job_title.clone().unwrap_or_default(),
            r.period_label(),
            money(r.salary),
            money(r.commissions),
            money(r.total_earnings),
            r.status.as_ref().map(|s| s.label().to_string()).unwrap_or_default(),
            r.hire_date.map(|d| d.to_string()).unwrap_or_default(),
        ]
    });
    export_csv(SNAPSHOT_HEADERS, rows)
}

fn money(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{EmploymentStatus, RawRecord};
    use chrono::NaiveDate;

    #[test]
    fn quotes_every_field_and_escapes_quotes() {
        let out = export_csv(&["a", "b"], vec![vec!["x", "say \"hi\", ok"]]).unwrap();
        assert_eq!(out, "\"a\",\"b\"\n\"x\",\"say \"\"hi\"\", ok\"\n");
    }

    #[test]
    fn header_only_when_no_rows() {
        let out = export_csv(&["a"], Vec::<Vec<String>>::new()).unwrap();
        assert_eq!(out, "\"a\"\n");
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = export_csv(&["a", "b"], vec![vec!["only one"]]).unwrap_err();
        assert!(matches!(err, ExportError::RowWidth { row: 0, got: 1, expected: 2 }));
    }

    #[test]
    fn snapshot_rows() {
        let snap = Snapshot {
            key: "OOFA900410HDFCRL03".into(),
            record: RawRecord {
                name: Some("Alberto \"Beto\" Ochoa".into()),
                branch: Some("Centro".into()),
                period: NaiveDate::from_ymd_opt(2024, 10, 1),
                salary: Some(18500.5),
                status: Some(EmploymentStatus::Active),
                ..Default::default()
            },
        };
        let out = snapshots_to_csv(&[snap]).unwrap();
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("\"CURP\",\"RFC\",\"Nombre\""));
        let row = lines.next().unwrap();
        assert!(row.contains("\"Alberto \"\"Beto\"\" Ochoa\""));
        assert!(row.contains("\"2024-10\""));
        assert!(row.contains("\"18500.50\""));
        assert!(row.contains("\"Activo\""));
    }
}
