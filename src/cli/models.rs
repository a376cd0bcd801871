//! Models command - list tuned models

use clap::Args;

use crate::config::AppConfig;
use crate::domain::{Schema, TunedModel};
use crate::infrastructure::services::TunedModelSource;

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Only models tuned from this schema
    #[arg(long)]
    pub schema: Option<Schema>,

    /// Read the local mirror instead of the backend
    #[arg(long)]
    pub cached: bool,

    /// Print the models as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ModelsArgs, config: AppConfig) -> anyhow::Result<()> {
    let state = crate::create_app_state_with_config(&config).await?;
    let source = if args.cached {
        TunedModelSource::Cached
    } else {
        TunedModelSource::Backend
    };

    let models = match args.schema {
        Some(schema) => {
            state
                .tuned_model_service
                .list_for_schema(schema, source)
                .await?
        }
        None => state.tuned_model_service.list(source).await?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else if models.is_empty() {
        eprintln!("No tuned models yet");
    } else {
        print!("{}", render_table(&models));
    }

    Ok(())
}

fn render_table(models: &[TunedModel]) -> String {
    let mut out = format!(
        "{:<24}  {:<8}  {:>8}  {:<20}  {}\n",
        "ID", "MODEL", "ACCURACY", "CREATED", "HYPERPARAMETERS"
    );

    for model in models {
        let params = model
            .hyperparameters
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(" ");

        out.push_str(&format!(
            "{:<24}  {:<8}  {:>7.2}%  {:<20}  {}\n",
            model.id,
            model.model_name,
            model.accuracy * 100.0,
            model.created_at.format("%Y-%m-%d %H:%M:%S"),
            params
        ));
    }

    out
}
