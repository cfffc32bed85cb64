use anyhow::Context;
use shared::config::Settings;
use shared::training;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = Settings::new().context("failed to load settings")?;
    info!(
        data = %settings.data_path,
        sample_size = settings.sample_size,
        n_estimators = settings.n_estimators,
        "starting training run"
    );

    let report = training::train(&settings)
        .with_context(|| format!("training on {} failed", settings.data_path))?;

    info!(
        rows = report.rows_used,
        dropped = report.rows_dropped,
        vocabulary = report.vocabulary_size,
        train_accuracy = report.train_accuracy,
        test_accuracy = ?report.test_accuracy,
        model = %settings.model_path,
        vectorizer = %settings.vectorizer_path,
        "training finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
