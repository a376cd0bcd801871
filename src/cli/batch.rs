//! Batch command - classify every row of a CSV file

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{BatchOutcome, BatchProgress, BatchTable, Schema};

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Measurement schema of the file's columns
    #[arg(long, default_value = "kepler")]
    pub schema: Schema,

    /// CSV file with a header row
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Where to write the augmented CSV; stdout when omitted
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Export only these columns, in this order
    #[arg(long, value_delimiter = ',', value_name = "COLUMNS")]
    pub columns: Option<Vec<String>>,

    /// Route predictions to a tuned model
    #[arg(long, value_name = "MODEL_ID")]
    pub tuned_model: Option<String>,

    /// Rows predicted concurrently per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

pub async fn run(args: BatchArgs, config: AppConfig) -> anyhow::Result<()> {
    let state = crate::create_app_state_with_config(&config).await?;

    let bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Could not read {}", args.input.display()))?;
    let table = load_table(&bytes, args.columns.as_deref())?;

    let target = state
        .prediction_service
        .resolve_target(args.schema, args.tuned_model.as_deref())
        .await?;

    info!(
        rows = table.len(),
        chunk_size = state.batch_service.chunk_size(),
        %target,
        "Running batch"
    );

    let outcome = state
        .batch_service
        .run(args.schema, &target, table, report_progress)
        .await?;
    eprintln!();

    let csv = outcome.to_csv(args.columns.as_deref())?;

    match args.output {
        Some(ref path) => {
            tokio::fs::write(path, &csv)
                .await
                .with_context(|| format!("Could not write {}", path.display()))?;
            eprintln!("Wrote {} rows to {}", outcome.len(), path.display());
        }
        None => std::io::stdout().write_all(&csv)?,
    }

    eprint!("{}", summary(&outcome));
    Ok(())
}

/// Parse the input and check the export selection before any row is sent
fn load_table(bytes: &[u8], columns: Option<&[String]>) -> anyhow::Result<BatchTable> {
    let table = BatchTable::from_bytes(bytes)?;
    if let Some(columns) = columns {
        table.check_export_columns(columns)?;
    }
    Ok(table)
}

fn report_progress(progress: BatchProgress) {
    eprint!(
        "\rProcessed {}/{} rows ({}%)",
        progress.processed_rows,
        progress.total_rows,
        progress.percent()
    );
    let _ = std::io::stderr().flush();
}

fn summary(outcome: &BatchOutcome) -> String {
    outcome
        .class_counts()
        .into_iter()
        .map(|(label, count)| format!("  {:<16} {}\n", label, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BatchError, PredictionResult};

    #[test]
    fn test_load_table_rejects_unknown_export_columns() {
        let csv = b"kepid,koi_period\n1,9.5\n";

        let columns = vec!["kepid".to_string(), "predicted_class".to_string()];
        assert_eq!(load_table(csv, Some(&columns)).unwrap().len(), 1);

        let columns = vec!["kepid".to_string(), "confidance".to_string()];
        let err = load_table(csv, Some(&columns)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BatchError>(),
            Some(&BatchError::UnknownExportColumns {
                columns: vec!["confidance".to_string()]
            })
        );
    }

    #[test]
    fn test_summary_counts_classes() {
        let table = BatchTable::new(
            vec!["kepid".to_string()],
            vec![vec!["1".to_string()], vec!["2".to_string()], vec!["3".to_string()]],
        );
        let outcome = BatchOutcome::new(
            table,
            vec![
                PredictionResult::new("CONFIRMED", 0.9),
                PredictionResult::new("FALSE POSITIVE", 0.8),
                PredictionResult::new("CONFIRMED", 0.7),
            ],
        );

        let text = summary(&outcome);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("CONFIRMED") && lines[0].ends_with('2'));
    }
}
