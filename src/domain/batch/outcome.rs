use csv::WriterBuilder;

use super::{BatchError, BatchTable};
use crate::domain::prediction::PredictionResult;

pub const PREDICTED_CLASS_COLUMN: &str = "predicted_class";
pub const CONFIDENCE_COLUMN: &str = "confidence";

/// Original rows augmented with the predicted class and confidence
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    table: BatchTable,
    predictions: Vec<PredictionResult>,
}

impl BatchOutcome {
    pub fn new(table: BatchTable, predictions: Vec<PredictionResult>) -> Self {
        Self { table, predictions }
    }

    pub fn predictions(&self) -> &[PredictionResult] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Every column available for export: the original ones plus the outputs
    pub fn columns(&self) -> Vec<String> {
        self.table.export_columns()
    }

    /// Number of rows per predicted class, most frequent first
    pub fn class_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();

        for p in &self.predictions {
            match counts.iter_mut().find(|(label, _)| *label == p.prediction) {
                Some((_, n)) => *n += 1,
                None => counts.push((p.prediction.clone(), 1)),
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// Export as CSV. `None` exports every column; otherwise only the named
    /// columns, in the order given.
    pub fn to_csv(&self, columns: Option<&[String]>) -> Result<Vec<u8>, BatchError> {
        let all = self.columns();

        let selected: Vec<String> = match columns {
            None => all.clone(),
            Some(requested) => {
                self.table.check_export_columns(requested)?;
                requested.to_vec()
            }
        };

        let indices: Vec<usize> = selected
            .iter()
            .filter_map(|c| all.iter().position(|a| a == c))
            .collect();

        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(&selected)?;

        for (row, prediction) in self.table.rows().iter().zip(&self.predictions) {
            let mut full: Vec<String> = row.clone();
            full.resize(self.table.headers().len(), String::new());
            full.push(prediction.prediction.clone());
            full.push(format!("{:.4}", prediction.confidence));

            writer.write_record(indices.iter().map(|&i| full[i].as_str()))?;
        }

        writer
            .into_inner()
            .map_err(|e| BatchError::Malformed(e.to_string()))
    }
}
