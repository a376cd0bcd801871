use clap::Parser;
use exo_classifier::cli::Cli;
use exo_classifier::config::AppConfig;
use exo_classifier::infrastructure::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    cli.apply_overrides(&mut config);
    logging::init_logging(&config.logging);

    cli.run(config).await
}
