mod alerts;
mod config;
mod helpers;
mod monitoring;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use alerts::{Notifier, SmsNotifier, TracingNotifier};
use config::Config;
use monitoring::{Prober, Worker};
use store::{LogStore, RecordStore};

#[derive(Parser)]
#[command(name = "vigil-service", version, about = "Background uptime-monitoring worker")]
struct Args {
    /// Path to the TOML config file (default:
    /// $XDG_CONFIG_HOME/vigil/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init_tracing();

    let args = Args::parse();
    let config = Config::from_config(args.config.as_ref())?;

    if args.show_config {
        print!("{config}");
        return Ok(());
    }

    let records = Arc::new(RecordStore::new(config.storage.data_dir.clone()));
    let logs = Arc::new(LogStore::new(config.storage.logs_dir.clone()));
    let prober = Arc::new(Prober::new()?);

    let notifier: Arc<dyn Notifier> = match &config.alerts.twilio {
        Some(twilio) => {
            info!("alerting via twilio sms");
            Arc::new(SmsNotifier::new(twilio.clone())?)
        }
        None => {
            info!("no sms credentials configured, alerts go to the process log");
            Arc::new(TracingNotifier)
        }
    };

    let worker = Worker::new(records, logs, prober, notifier, config.worker_settings());
    worker.run().await
}
