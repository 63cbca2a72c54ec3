use std::path::PathBuf;
use std::process;

use anyhow::Result;
use batch_fleet_common::{logging, Batch, Script};
use batch_collector::{collect, login};
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::Parser;
use tracing::{error, info_span, Instrument};
use twscrape::TwscrapeCli;

/// Collect tweets, user profiles or timelines for one batch of ids
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Collection script to run
    #[arg(value_parser = PossibleValuesParser::new(Script::NAMES).try_map(|s| s.parse::<Script>()))]
    script: Script,

    /// Batch number, e.g. 7 or 007
    batch: Batch,

    /// Working directory holding the batch files and outputs
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Account database shared by every twscrape invocation
    #[arg(long, default_value = "accounts.db")]
    db: PathBuf,

    /// twscrape executable
    #[arg(long, default_value = "twscrape")]
    twscrape: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let guard = match logging::init(
        args.dir.join("logs"),
        &args.script.log_file(args.batch),
        "debug",
    ) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    let span = info_span!("collect", script = %args.script, batch = %args.batch);
    let code = match run(args).instrument(span).await {
        Ok(_) => 0,
        Err(err) => {
            error!("{:#}", err);
            1
        }
    };

    drop(guard);
    process::exit(code);
}

async fn run(args: Args) -> Result<()> {
    let client = TwscrapeCli::new(args.dir.join(&args.db)).with_program(&args.twscrape);

    match args.script.data_type() {
        Some(data_type) => {
            collect(&client, data_type, args.batch, &args.dir).await?;
        }
        None => {
            login(&client, args.batch, &args.dir).await?;
        }
    }

    Ok(())
}
