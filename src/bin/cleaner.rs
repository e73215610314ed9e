use anyhow::Context;
use circ_collector::{
    config::read_config_file,
    ledger::{CsvLedger, LedgerBackend},
    util::get_config_path,
};
use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short, long, default_value_t = get_config_path())]
    file: String,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("circ_collector", LevelFilter::DEBUG),
        ("circ_cleaner", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;
    let ledger = CsvLedger::new(&config.files.ledger);

    if !ledger.path().exists() {
        warn!("no ledger at {}, nothing to clean", ledger.path().display());
        return Ok(());
    }

    ledger
        .backup(&config.files.backup)
        .await
        .inspect_err(|e| error!("backup failed: {e}"))
        .context("refusing to clean without a backup")?;

    let summary = ledger
        .clean()
        .await
        .inspect_err(|e| error!("cleaning failed: {e}"))
        .context("ledger was left unchanged")?;

    info!(
        "{} rows kept, {} rows dropped, columns dropped: {:?}",
        summary.kept, summary.dropped_rows, summary.dropped_columns
    );

    Ok(())
}
