use std::io::Read;

use csv::{ReaderBuilder, Trim};

use super::{BatchError, CONFIDENCE_COLUMN, PREDICTED_CLASS_COLUMN};
use crate::domain::features::{validate_value, FeatureVector, FieldInput};
use crate::domain::schema::Schema;

/// Uploaded spreadsheet: header row plus data rows, kept as text so the
/// export can reproduce the original cells
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl BatchTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read CSV with a header row. Byte-order marks and surrounding
    /// whitespace are stripped; short rows are padded with empty cells.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, BatchError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;

            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }

            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len().max(row.len()), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BatchError> {
        Self::from_reader(bytes)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every column a finished run can export: the original ones plus the outputs
    pub fn export_columns(&self) -> Vec<String> {
        let mut columns = self.headers.clone();
        columns.push(PREDICTED_CLASS_COLUMN.to_string());
        columns.push(CONFIDENCE_COLUMN.to_string());
        columns
    }

    /// Reject export selections naming columns the output will not have
    pub fn check_export_columns(&self, requested: &[String]) -> Result<(), BatchError> {
        let available = self.export_columns();
        let unknown: Vec<String> = requested
            .iter()
            .filter(|c| !available.contains(c))
            .cloned()
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(BatchError::UnknownExportColumns { columns: unknown })
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Required columns of `schema` absent from the header row, in schema order
    pub fn missing_columns(&self, schema: Schema) -> Vec<String> {
        schema
            .field_names()
            .into_iter()
            .filter(|name| self.column_index(name).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Check shape and turn every row into a feature vector. Nothing is sent
    /// anywhere until this succeeds.
    pub fn prepare(&self, schema: Schema) -> Result<Vec<FeatureVector>, BatchError> {
        if self.headers.iter().all(|h| h.is_empty()) || self.rows.is_empty() {
            return Err(BatchError::EmptyFile);
        }

        let missing = self.missing_columns(schema);
        if !missing.is_empty() {
            return Err(BatchError::MissingColumns { columns: missing });
        }

        let indices: Vec<(usize, &str)> = schema
            .fields()
            .iter()
            .filter_map(|f| self.column_index(f.name).map(|idx| (idx, f.name)))
            .collect();

        self.rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                let mut values = Vec::with_capacity(indices.len());

                for (col_idx, column) in &indices {
                    let cell = row.get(*col_idx).map(String::as_str).unwrap_or("");

                    let value = validate_value(Some(&FieldInput::from(cell))).map_err(|_| {
                        BatchError::InvalidValue {
                            row: row_idx,
                            column: column.to_string(),
                            value: cell.to_string(),
                        }
                    })?;
                    values.push(value);
                }

                FeatureVector::new(schema, values).map_err(|e| BatchError::Malformed(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// CSV with every TESS column and `rows` valid data rows plus an `id` column
    pub(crate) fn tess_csv(rows: usize) -> String {
        let mut csv = String::from("id,");
        csv.push_str(&Schema::Tess.field_names().join(","));
        csv.push('\n');

        for row in 0..rows {
            let values: Vec<String> = (1..=11).map(|v| format!("{}.5", v + row)).collect();
            csv.push_str(&format!("TOI-{},{}\n", row, values.join(",")));
        }

        csv
    }

    #[test]
    fn test_reads_headers_and_rows() {
        let table = BatchTable::from_bytes(tess_csv(3).as_bytes()).unwrap();
        assert_eq!(table.headers().len(), 12);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[1][0], "TOI-1");
    }

    #[test]
    fn test_strips_bom_and_blank_lines() {
        let csv = format!("\u{feff}{}\n\n", tess_csv(1).trim_end());
        let table = BatchTable::from_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.headers()[0], "id");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_prepare_empty_file() {
        let table = BatchTable::from_bytes(b"").unwrap();
        assert_eq!(table.prepare(Schema::Tess), Err(BatchError::EmptyFile));

        let header_only = BatchTable::from_bytes(tess_csv(0).as_bytes()).unwrap();
        assert_eq!(header_only.prepare(Schema::Tess), Err(BatchError::EmptyFile));
    }

    #[test]
    fn test_prepare_missing_columns() {
        let table = BatchTable::from_bytes(tess_csv(2).as_bytes()).unwrap();

        match table.prepare(Schema::Kepler) {
            Err(BatchError::MissingColumns { columns }) => {
                assert_eq!(columns.len(), 13);
                assert_eq!(columns[0], "koi_period");
            }
            other => panic!("expected missing columns, got {:?}", other),
        }
    }

    #[test]
    fn test_prepare_invalid_value_names_row_and_column() {
        let csv = tess_csv(3).replacen("TOI-2,3.5", "TOI-2,n/a", 1);
        let table = BatchTable::from_bytes(csv.as_bytes()).unwrap();

        assert_eq!(
            table.prepare(Schema::Tess),
            Err(BatchError::InvalidValue {
                row: 2,
                column: "pl_orbper".to_string(),
                value: "n/a".to_string(),
            })
        );
    }

    #[test]
    fn test_prepare_reorders_columns_to_schema_order() {
        let mut names = Schema::Tess.field_names();
        names.reverse();
        let values: Vec<String> = (1..=11).rev().map(|v| v.to_string()).collect();
        let csv = format!("{}\n{}\n", names.join(","), values.join(","));

        let vectors = BatchTable::from_bytes(csv.as_bytes())
            .unwrap()
            .prepare(Schema::Tess)
            .unwrap();

        assert_eq!(vectors[0].values()[0], 1.0);
        assert_eq!(vectors[0].get("st_rad"), Some(11.0));
    }

    #[test]
    fn test_export_columns_checked_against_headers_and_outputs() {
        let table = BatchTable::from_bytes(tess_csv(1).as_bytes()).unwrap();

        let ok = vec!["id".to_string(), "confidence".to_string(), "predicted_class".to_string()];
        assert_eq!(table.check_export_columns(&ok), Ok(()));

        let typo = vec!["id".to_string(), "predicted_clas".to_string()];
        assert_eq!(
            table.check_export_columns(&typo),
            Err(BatchError::UnknownExportColumns {
                columns: vec!["predicted_clas".to_string()]
            })
        );
    }
}
