use clap::Parser;
use findash::args::{Args, Command};
use findash::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().findash_home().path();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.trans_db_path())
            .await?
            .print(),

        Command::Insert(insert_args) => {
            let config = Config::load(home).await?;
            commands::insert_transaction(config, insert_args.clone())
                .await?
                .print()
        }

        Command::Import(import_args) => {
            let config = Config::load(home).await?;
            commands::import_transactions(config, import_args.clone())
                .await?
                .print()
        }

        Command::Get(get_args) => {
            let config = Config::load(home).await?;
            commands::get_transactions(config, get_args.clone())
                .await?
                .print()
        }

        Command::Find(find_args) => {
            let config = Config::load(home).await?;
            commands::find_transactions(config, find_args.clone())
                .await?
                .print()
        }

        Command::Update(update_args) => {
            let config = Config::load(home).await?;
            commands::update_transactions(config, update_args.clone())
                .await?
                .print()
        }

        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            commands::delete_transactions(config, delete_args.clone())
                .await?
                .print()
        }

        Command::Save(save_args) => {
            let config = Config::load(home).await?;
            commands::save(config, save_args.clone()).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
