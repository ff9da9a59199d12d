//! CLI subcommand handlers.

use crate::ConfigAction;
use crate::RunArgs;
use orderport_core::config::WORKSPACE_CONFIG_FILE;
use orderport_core::{
    CsvFileSource, ImportConfig, ImportPipeline, OrderAggregate, RecordSource, build_order_request,
    build_sources, build_transport, collect_orders,
};
use std::path::Path;

fn load(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<ImportConfig> {
    orderport_core::load_config(Some(workspace), config_file)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
}

/// Apply `run` flags on top of the loaded configuration.
fn apply_overrides(config: &mut ImportConfig, args: &RunArgs) {
    if let Some(csv) = &args.csv {
        config.sources.csv_path = csv.clone();
        config.sources.csv_enabled = true;
    }
    if let Some(url) = &args.api_url {
        config.sources.api_url = url.clone();
        config.sources.api_enabled = true;
    }
    if args.skip_csv {
        config.sources.csv_enabled = false;
    }
    if args.skip_api {
        config.sources.api_enabled = false;
    }
}

pub async fn handle_run(
    args: RunArgs,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    let mut config = load(workspace, config_file)?;
    apply_overrides(&mut config, &args);

    let transport = build_transport(&config)?;
    let sources = build_sources(&config.sources, transport.clone());
    if sources.is_empty() {
        println!("No sources enabled. Nothing to import.");
        return Ok(());
    }

    if args.dry_run {
        return print_payloads(&config, &sources).await;
    }

    // Fails before any network activity when credentials are unusable.
    let pipeline = ImportPipeline::from_config(&config, transport)?;
    tracing::info!(
        endpoint = %pipeline.driver().endpoint(),
        sources = sources.len(),
        "Starting order import"
    );

    let runs = pipeline.run_all(&sources).await;
    for run in &runs {
        match &run.result {
            Ok(summary) => println!(
                "{}: {} records, {} orders, {} uploaded, {} failed",
                run.origin,
                summary.records,
                summary.orders,
                summary.upload.succeeded(),
                summary.upload.failed()
            ),
            Err(e) => println!("{}: {}", run.origin, e),
        }
    }
    Ok(())
}

async fn print_payloads(
    config: &ImportConfig,
    sources: &[Box<dyn RecordSource>],
) -> anyhow::Result<()> {
    for source in sources {
        match collect_orders(source.as_ref(), &config.orders).await {
            Ok((_, orders)) => {
                for order in &orders {
                    let request = build_order_request(order, &config.orders);
                    println!("{}", serde_json::to_string_pretty(&request)?);
                }
            }
            Err(e) => tracing::error!(
                source = %source.describe(),
                error = %e,
                "Error during order processing"
            ),
        }
    }
    Ok(())
}

pub async fn handle_preview(
    csv: &Path,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load(workspace, config_file)?;
    let source = CsvFileSource::new(csv);
    let (records, orders) = collect_orders(&source, &config.orders).await?;
    println!("{} records, {} orders", records, orders.len());
    for order in &orders {
        println!("{}", preview_line(order));
    }
    Ok(())
}

fn preview_line(order: &OrderAggregate) -> String {
    let mut line = format!(
        "  {} ({}): {} line items",
        order.order_name,
        order.email,
        order.line_items.len()
    );
    if order.has_invalid_quantity() {
        line.push_str(" [invalid quantity]");
    }
    line
}

pub fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace.join(WORKSPACE_CONFIG_FILE);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&ImportConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace, config_file)?;
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            Ok(())
        }
    }
}
