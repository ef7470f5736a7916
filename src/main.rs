use anyhow::{Error, Result};
use clap::Parser;
use gsod_sync::cli::{command, setup_logging, Cli, Commands};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    setup_logging(&cli.global);

    let mut config = cli.global.load_config()?;
    let show_progress = !cli.global.quiet;

    // Ctrl+C stops the current download; its partial file is removed
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nReceived CTRL+C, shutting down gracefully...");
            signal_token.cancel();
        }
    });

    match cli.command {
        Commands::Sync { years, parquet } => {
            if !years.is_empty() {
                config.years = years;
            }
            config.write_parquet |= parquet;

            let summary = command::sync(config, cancel, show_progress).await?;
            for line in command::sync::describe(&summary) {
                println!("{}", line);
            }
            if !summary.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Status {} => {
            let tasks = command::status(config, show_progress).await?;
            if tasks.is_empty() {
                println!("Local archives are up to date");
            }
            for task in tasks {
                println!("{} -> {}", task.source_url, task.destination_path().display());
            }
        }
        Commands::Merge {
            archive,
            force,
            parquet,
        } => {
            config.write_parquet |= parquet;
            match command::merge(config, &archive, force).await {
                Ok(Some(rows)) => println!("Merged {} rows from `{}`", rows, archive.display()),
                Ok(None) => println!(
                    "`{}` is already processed, use --force to merge it again",
                    archive.display()
                ),
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
