use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use workcell_bus::InProcessBus;
use workcell_config::AdapterConfig;
use workcell_core::{AdapterSettings, WorkcellAdapter};
use workcell_driver::RobotDriver;

mod confirmation;

use confirmation::DriverConfirmation;

/// Workcelld - a workcell device adapter for the fleet bus
#[derive(Parser)]
#[command(name = "workcelld")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the configuration file
  #[arg(short = 'c', long = "config")]
  config_file: PathBuf,
}

fn main() -> Result<()> {
  init_tracing();

  let cli = Cli::parse();
  let config = AdapterConfig::load(&cli.config_file).with_context(|| {
    format!(
      "failed to load config file: {}",
      cli.config_file.display()
    )
  })?;

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(run(config))
}

fn init_tracing() {
  use tracing_subscriber::EnvFilter;
  use tracing_subscriber::layer::SubscriberExt as _;
  use tracing_subscriber::util::SubscriberInitExt as _;

  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::registry()
    .with(env_filter)
    .with(tracing_subscriber::fmt::layer())
    .init();
}

async fn run(config: AdapterConfig) -> Result<()> {
  info!(
    name = %config.workcell.name,
    guid = %config.workcell.guid,
    kind = ?config.workcell.kind,
    "starting workcell adapter"
  );

  let cancel = CancellationToken::new();
  let shutdown = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!("shutdown requested");
      shutdown.cancel();
    }
  });

  let driver = RobotDriver::new(&config.driver.prefix, config.driver.robot_name.clone())
    .context("failed to build robot driver client")?;

  if config.driver.wait_until_reachable && !driver.wait_until_reachable(&cancel).await {
    // Cancelled while waiting for the driver; nothing was started.
    return Ok(());
  }

  let bus = Arc::new(InProcessBus::new());
  let confirmation = Arc::new(DriverConfirmation::new(driver));
  let settings = AdapterSettings {
    publish_interval: Duration::from_secs_f64(config.timing.publish_interval_secs),
    confirmation_poll_interval: Duration::from_secs_f64(
      config.timing.confirmation_poll_interval_secs,
    ),
    confirmation_timeout: Duration::from_secs_f64(config.timing.confirmation_timeout_secs),
  };

  let adapter = WorkcellAdapter::new(
    bus,
    config.workcell.kind,
    config.workcell.guid.clone(),
    confirmation,
    settings,
  );

  adapter
    .run(cancel)
    .await
    .context("workcell adapter exited with an error")?;

  info!(guid = %config.workcell.guid, "workcell adapter shut down");
  Ok(())
}
