use std::io::Write;

use anyhow::Context;
use circ_collector::{
    Collector, ReconcileDate,
    config::read_config_file,
    invocation::{Invocation, ManualEntry},
    util::get_config_path,
};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short, long, default_value_t = get_config_path())]
    file: String,

    /// Leave blank to collect yesterday, or `manual` to enter dates
    mode: Option<String>,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_target("circ_collector", LevelFilter::DEBUG);
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

    let invocation = match Invocation::parse(args.mode.as_deref()) {
        Ok(invocation) => invocation,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            std::process::exit(-1);
        }
    };

    let config = read_config_file(&args.file)?;
    let collector = Collector::from_config(&config)?;

    match invocation {
        Invocation::Auto => {
            if let Err(e) = collector.run(ReconcileDate::Yesterday).await {
                error!("failed to write record: {e}");
                return Err(e).context("collection for yesterday was not persisted");
            }
        }
        Invocation::Manual => manual(&collector).await?,
    }

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("Enter a date (YYYYMMDD), or q to quit: ");
    std::io::stdout().flush()
}

async fn manual(collector: &Collector) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let date = match ManualEntry::parse(&line) {
            Ok(ManualEntry::Quit) => return Ok(()),
            Ok(ManualEntry::Date(date)) => date,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match collector.run(ReconcileDate::On(date)).await {
            Ok(record) => info!("collected {}", record.date),
            Err(e) => error!("failed to write record for {date}: {e}"),
        }
    }
}
