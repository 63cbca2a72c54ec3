use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use batch_fleet::config::Config;
use batch_fleet::distribute::Category;
use batch_fleet::machines::read_machines;
use batch_fleet::remote::SshRemote;
use batch_fleet::{accounts, decommission, distribute, gather, launch, provision};
use batch_fleet_common::{logging, DataType, Script};
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{Parser, Subcommand};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use hetzner::HetznerClient;
use tracing::{error, info, info_span, Instrument};

/// Provision a scraping fleet on Hetzner Cloud, feed it, run it and collect its output
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file location
    #[arg(short, long, default_value = "config/config.json")]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the account spreadsheet and split it into per-batch credential files
    SplitAccounts {
        /// Number of accounts to take from the top of the spreadsheet
        num_accounts: usize,
        /// Number of credential files to write
        num_files: usize,
    },
    /// Create servers `<prefix>-001` .. `<prefix>-<num_servers>`
    CreateServers { num_servers: u32, prefix: String },
    /// Delete every server whose name starts with the prefix
    DeleteServers { prefix: String },
    /// Copy files to every machine in the machine table
    Transfer {
        #[arg(long, value_enum, num_args = 1.., required = true)]
        batch: Vec<Category>,
    },
    /// Start a collection script on every machine in a detached screen session
    RunRemote {
        #[arg(long, value_parser = PossibleValuesParser::new(Script::NAMES).try_map(|s| s.parse::<Script>()))]
        script: Script,
    },
    /// Pull collected data and logs from every machine
    Gather {
        #[arg(long, value_parser = PossibleValuesParser::new(DataType::NAMES).try_map(|s| s.parse::<DataType>()))]
        data: DataType,

        /// Short descriptor appended to the local folder name
        #[arg(long)]
        desc: String,
    },
}

impl Command {
    fn log_file(&self) -> &'static str {
        match self {
            Command::SplitAccounts { .. } => "twitter_accounts_processing_logs.log",
            Command::CreateServers { .. } => "hetzner_server_logs.log",
            Command::DeleteServers { .. } => "hetzner_server_delete_logs.log",
            Command::Transfer { .. } => "transfer_files.log",
            Command::RunRemote { .. } => "run_remote_script.log",
            Command::Gather { .. } => "gather_data.log",
        }
    }

    fn component(&self) -> &'static str {
        match self {
            Command::SplitAccounts { .. } => "split_accounts",
            Command::CreateServers { .. } => "create_servers",
            Command::DeleteServers { .. } => "delete_servers",
            Command::Transfer { .. } => "transfer",
            Command::RunRemote { .. } => "run_remote",
            Command::Gather { .. } => "gather",
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let guard = match logging::init("logs", args.command.log_file(), "info") {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    let span = info_span!("fleet", component = args.command.component());
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
    let conf = Config::read(&args.config)?;

    match args.command {
        Command::SplitAccounts {
            num_accounts,
            num_files,
        } => {
            accounts::split(&conf, num_accounts, num_files).await?;
        }
        Command::CreateServers {
            num_servers,
            prefix,
        } => {
            let client = HetznerClient::new(conf.api_token()?)?;
            let template = conf.server_template()?;
            provision::provision(&client, &template, num_servers, &prefix, &conf.machine_table)
                .await?;
        }
        Command::DeleteServers { prefix } => {
            let client = HetznerClient::new(conf.api_token()?)?;
            let summary = decommission::delete_servers(&client, &prefix, |servers| {
                println!("\nThe following servers will be deleted:");
                for server in servers {
                    println!(" - {} (ID: {})", server.name, server.id);
                }
                let answer: String = Input::with_theme(&ColorfulTheme::default())
                    .with_prompt("Are you sure you want to delete these servers? (yes/no)")
                    .allow_empty(true)
                    .interact_text()?;
                Ok(decommission::is_confirmed(&answer))
            })
            .await?;
            info!(
                deleted = summary.deleted,
                failed = summary.failed,
                "server deletion finished"
            );
        }
        Command::Transfer { batch } => {
            let machines = read_machines(&conf.machine_table)?;
            let remote = ssh_remote(&conf)?;
            distribute::transfer_files(
                &remote,
                &machines,
                &batch,
                &conf.source_path,
                conf.destination_path()?,
            )
            .await?;
        }
        Command::RunRemote { script } => {
            let machines = read_machines(&conf.machine_table)?;
            let remote = ssh_remote(&conf)?;
            let summary = launch::launch(
                &remote,
                &machines,
                script,
                conf.destination_path()?,
                &conf.remote_command,
            )
            .await;
            info!(
                started = summary.started,
                failed = summary.failed,
                skipped = summary.skipped,
                "launch finished"
            );
        }
        Command::Gather { data, desc } => {
            let machines = read_machines(&conf.machine_table)?;
            let remote = ssh_remote(&conf)?;
            let destination = conf.destination_path()?;

            let today = chrono::Local::now().date_naive();
            let folder = gather::gather_folder(Path::new("."), today, &desc);
            gather::create_gather_folder(&folder)?;
            let summary = gather::gather(&remote, &machines, data, destination, &folder).await?;
            info!(
                synced = summary.synced,
                failed = summary.failed,
                "files stored in {}",
                folder.display()
            );
        }
    }

    Ok(())
}

fn ssh_remote(conf: &Config) -> Result<SshRemote> {
    Ok(SshRemote::new(conf.ssh_path()?, &conf.ssh_user)?)
}
