//! Tune command - submit a grid search and follow it to completion

use clap::Args;

use crate::config::AppConfig;
use crate::domain::{HyperparameterGrid, Schema, TuneResponse, TuningResult, TuningStatus};

#[derive(Args, Debug)]
pub struct TuneArgs {
    /// Base schema to tune
    #[arg(long, default_value = "kepler")]
    pub schema: Schema,

    /// Grid entry; repeat per parameter
    #[arg(long = "param", value_name = "NAME=V1,V2", required = true)]
    pub params: Vec<String>,

    /// Print the task id and return instead of polling
    #[arg(long)]
    pub no_wait: bool,

    /// Seconds between status polls
    #[arg(long)]
    pub poll_interval: Option<u64>,
}

pub fn build_grid(params: &[String]) -> anyhow::Result<HyperparameterGrid> {
    let mut grid = HyperparameterGrid::new();
    for spec in params {
        grid.add_spec(spec)?;
    }
    grid.validate()?;
    Ok(grid)
}

pub async fn run(args: TuneArgs, config: AppConfig) -> anyhow::Result<()> {
    let state = crate::create_app_state_with_config(&config).await?;
    let grid = build_grid(&args.params)?;

    eprintln!(
        "Submitting {} combination(s) for {}",
        grid.combinations(),
        args.schema.display_name()
    );

    let task_id = match state.tuning_service.submit(args.schema, grid).await? {
        TuneResponse::Completed(result) => {
            print!("{}", render_result(&result));
            return Ok(());
        }
        TuneResponse::Queued { task_id } => task_id,
    };

    if args.no_wait {
        println!("{}", task_id);
        return Ok(());
    }

    eprintln!(
        "Task {} queued; polling every {}s (Ctrl+C stops polling, not the task)",
        task_id,
        state.tuning_service.poll_interval().as_secs()
    );

    let mut handle = state.tuning_service.poll(task_id.clone());

    loop {
        tokio::select! {
            update = handle.changed() => match update {
                Some(task) if task.is_terminal() => break,
                Some(task) => eprintln!("  status: {}", task.status),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                eprintln!("Stopped polling; task {} keeps running on the server", task_id);
                return Ok(());
            }
        }
    }

    let task = handle.wait().await?;

    match task.status {
        TuningStatus::Success => {
            state.tuned_model_service.record_tuning_success().await;
            match task.result {
                Some(ref result) => print!("{}", render_result(result)),
                None => println!("Task {} succeeded", task.task_id),
            }
            Ok(())
        }
        _ => anyhow::bail!(
            "Tuning task {} failed: {}",
            task.task_id,
            task.error.unwrap_or_else(|| "no error message".to_string())
        ),
    }
}

fn render_result(result: &TuningResult) -> String {
    let mut out = format!(
        "Tuned {} model {} (accuracy {:.2}%)\n",
        result.model_name,
        result.model_id,
        result.accuracy * 100.0
    );

    for (name, value) in &result.best_params {
        out.push_str(&format!("  {} = {}\n", name, value));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_grid_keeps_every_param() {
        let grid = build_grid(&[
            "classifier__rf__n_estimators=100,200".to_string(),
            "classifier__rf__max_depth=10,20,30".to_string(),
        ])
        .unwrap();

        assert_eq!(grid.params().len(), 2);
        assert_eq!(grid.combinations(), 6);
    }

    #[test]
    fn test_build_grid_rejects_empty_values() {
        assert!(build_grid(&["classifier__rf__n_estimators=".to_string()]).is_err());
        assert!(build_grid(&["classifier__rf__n_estimators=ten".to_string()]).is_err());
    }

    #[test]
    fn test_render_result() {
        let result: TuningResult = serde_json::from_value(serde_json::json!({
            "model_name": "kepler",
            "best_params": {"classifier__rf__n_estimators": 200},
            "accuracy": 0.9134,
            "model_id": "64f1a2b3c4d5e6f708192a3b"
        }))
        .unwrap();

        let text = render_result(&result);
        assert!(text.starts_with("Tuned kepler model 64f1a2b3c4d5e6f708192a3b (accuracy 91.34%)"));
        assert!(text.contains("classifier__rf__n_estimators = 200"));
    }
}
