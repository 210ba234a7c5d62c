use anyhow::{Context, Result};
use imageserver_rs::{read_points, ImageServerClient, SamplerConfig};

// Configuration comes from IMAGESERVER_* environment variables (or a .env file).
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SamplerConfig::from_env()?;
    log::debug!("{:?}", config);

    let points = read_points(&config.points_path)
        .with_context(|| format!("reading points from {}", config.points_path.display()))?;

    let mut client = ImageServerClient::new(&config.service_url, config.timeout)?;
    client.set_length_mismatch(config.on_mismatch);

    match client.service_info().await {
        Ok(info) => log::info!(
            "Sampling '{}' ({} points)",
            info.name.as_deref().unwrap_or(&client.service_url),
            points.len()
        ),
        Err(e) => log::warn!("Could not read service info: {}", e),
    }

    let summary = client.sampler(&config).run(&points).await?;

    for (name, error) in &summary.failed {
        eprintln!("failed: {} ({})", name, error);
    }
    println!(
        "{} written, {} skipped, {} empty, {} failed, {} rows in {}",
        summary.written.len(),
        summary.skipped.len(),
        summary.empty.len(),
        summary.failed.len(),
        summary.rows,
        config.output_dir.display()
    );

    if summary.failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} of {} points failed", summary.failed.len(), points.len())
    }
}
