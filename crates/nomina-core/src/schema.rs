/// Arrow schema definitions for payroll snapshots.
pub mod payroll {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray, UInt32Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::error::ArrowError;
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;

    use crate::category::job_category;
    use crate::dedupe::Snapshot;
    use crate::identity::IdentityConfig;

    /// Schema for one deduplicated employee snapshot per row.
    pub fn snapshot_schema() -> Schema {
        Schema::new(vec![
            Field::new("curp", DataType::Utf8, false),
            Field::new("rfc", DataType::Utf8, true),
            Field::new("nombre", DataType::Utf8, true),
            Field::new("sucursal", DataType::Utf8, true),
            Field::new("puesto", DataType::Utf8, true),
            Field::new("categoria", DataType::Utf8, false),
            Field::new("periodo", DataType::Date32, true),
            Field::new("salario", DataType::Float64, true),
            Field::new("comisiones", DataType::Float64, true),
            Field::new("percepciones_totales", DataType::Float64, true),
            Field::new("estado", DataType::Utf8, true),
            Field::new("fecha_antiguedad", DataType::Date32, true),
            Field::new("edad", DataType::UInt32, true),
            Field::new("sexo", DataType::Utf8, false),
        ])
    }

    /// Convert snapshots to a batch matching [`snapshot_schema`].
    ///
    /// Age is computed as of `today`; unparseable identifiers leave it null.
    pub fn snapshots_to_batch(
        snapshots: &[Snapshot],
        today: NaiveDate,
        config: &IdentityConfig,
    ) -> Result<RecordBatch, ArrowError> {
        let text = |f: fn(&Snapshot) -> Option<&str>| -> ArrayRef {
            Arc::new(StringArray::from(snapshots.iter().map(f).collect::<Vec<_>>()))
        };
        let money = |f: fn(&Snapshot) -> Option<f64>| -> ArrayRef {
            Arc::new(Float64Array::from(snapshots.iter().map(f).collect::<Vec<_>>()))
        };
        let date = |f: fn(&Snapshot) -> Option<NaiveDate>| -> ArrayRef {
            Arc::new(Date32Array::from(
                snapshots
                    .iter()
                    .map(|s| f(s).map(days_since_epoch))
                    .collect::<Vec<_>>(),
            ))
        };

        let curp: ArrayRef = Arc::new(StringArray::from(
            snapshots.iter().map(|s| s.key.as_str()).collect::<Vec<_>>(),
        ));
        let category: ArrayRef = Arc::new(StringArray::from(
            snapshots
                .iter()
                .map(|s| job_category(s.record.job_title.as_deref().unwrap_or_default()))
                .collect::<Vec<_>>(),
        ));
        let status: ArrayRef = Arc::new(StringArray::from(
            snapshots
                .iter()
                .map(|s| s.record.status.as_ref().map(|st| st.label().to_string()))
                .collect::<Vec<_>>(),
        ));
        let age: ArrayRef = Arc::new(UInt32Array::from(
            snapshots
                .iter()
                .map(|s| s.identity(today, config).map(|id| id.age))
                .collect::<Vec<_>>(),
        ));
        let sex: ArrayRef = Arc::new(StringArray::from(
            snapshots.iter().map(|s| s.sex().as_str()).collect::<Vec<_>>(),
        ));

        RecordBatch::try_new(
            Arc::new(snapshot_schema()),
            vec![
                curp,
                text(|s| s.record.tax_id.as_deref()),
                text(|s| s.record.name.as_deref()),
                text(|s| s.record.branch.as_deref()),
                text(|s| s.record.job_title.as_deref()),
                category,
                date(|s| s.record.period),
                money(|s| s.record.salary),
                money(|s| s.record.commissions),
                money(|s| s.record.total_earnings),
                status,
                date(|s| s.record.hire_date),
                age,
                sex,
            ],
        )
    }

    fn days_since_epoch(date: NaiveDate) -> i32 {
        // chrono's default date is 1970-01-01.
        let epoch = NaiveDate::default();
        date.signed_duration_since(epoch).num_days() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::payroll;
    use crate::dedupe::Snapshot;
    use crate::identity::IdentityConfig;
    use crate::record::{EmploymentStatus, RawRecord};
    use arrow::array::{Array, Date32Array, StringArray, UInt32Array};
    use chrono::NaiveDate;

    #[test]
    fn snapshot_schema_has_expected_fields() {
        let schema = payroll::snapshot_schema();
        assert_eq!(schema.fields().len(), 14);
        assert!(schema.field_with_name("curp").is_ok());
        assert!(!schema.field_with_name("sexo").unwrap().is_nullable());
    }

    #[test]
    fn batch_from_snapshots() {
        let snapshots = vec![
            Snapshot {
                key: "OOFA900410HDFCRL03".into(),
                record: RawRecord {
                    job_title: Some("VENDEDOR".into()),
                    period: NaiveDate::from_ymd_opt(1970, 1, 2),
                    status: Some(EmploymentStatus::Active),
                    ..Default::default()
                },
            },
            Snapshot {
                key: "XXXX".into(),
                record: RawRecord::default(),
            },
        ];
        let today = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let batch =
            payroll::snapshots_to_batch(&snapshots, today, &IdentityConfig::default()).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let category = batch
            .column_by_name("categoria")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(category.value(0), "Ventas");
        assert_eq!(category.value(1), "Sin Categorizar");

        let age = batch
            .column_by_name("edad")
            .unwrap()
            .as_any()
            .downcast_ref::<UInt32Array>()
            .unwrap();
        assert_eq!(age.value(0), 34);
        assert!(age.is_null(1));

        let period = batch
            .column_by_name("periodo")
            .unwrap()
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(period.value(0), 1);
        assert!(period.is_null(1));
    }
}
