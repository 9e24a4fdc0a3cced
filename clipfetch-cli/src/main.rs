mod cli;
mod commands;
mod config;
mod error;
mod output;

use crate::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    config::AppConfig,
    error::{CliError, Result},
};
use clap::Parser;
use clipfetch::Pipeline;
#[cfg(feature = "colored-output")]
use colored::*;
use std::{io::IsTerminal, process};
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let output_format = args.command.output_format();

    if let Err(e) = run(args).await {
        match output_format {
            Some(format) if format.is_json() => {
                let error_json = serde_json::json!({
                    "status": "error",
                    "kind": error_kind(&e),
                    "message": e.to_string(),
                });
                println!("{error_json}");
            }
            _ => {
                error!("Application error: {}", e);
                #[cfg(feature = "colored-output")]
                {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                }
                #[cfg(not(feature = "colored-output"))]
                {
                    eprintln!("Error: {}", e);
                }
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    match args.command {
        Commands::Config { show, reset } => {
            if reset {
                let path = AppConfig::reset(args.config.as_deref())?;
                println!("✓ Configuration reset to defaults ({})", path.display());
            } else if show {
                let config = AppConfig::load(args.config.as_deref())?;
                println!("{}", config.show()?);
            } else {
                println!(
                    "Use --show to display current configuration or --reset to reset to defaults"
                );
            }
            return Ok(());
        }
        Commands::Id { input } => {
            let id = clipfetch::ContentId::parse(&input)?;
            println!("{id}");
            return Ok(());
        }
        _ => {}
    }

    let config = AppConfig::load(args.config.as_deref())?;
    let pipeline = Pipeline::new(config.fetch)?;
    let colored = std::io::stdout().is_terminal();
    let executor = CommandExecutor::new(pipeline, config.batch_concurrency, colored);

    match args.command {
        Commands::Fetch {
            url,
            token,
            cookies,
            output,
            save,
        } => {
            executor
                .fetch(&url, token, cookies, save.as_deref(), output)
                .await?;
        }
        Commands::Batch {
            input,
            output_dir,
            max_concurrent,
            output,
        } => {
            executor
                .batch(&input, &output_dir, max_concurrent, output)
                .await?;
        }
        Commands::Id { .. } | Commands::Config { .. } => {}
    }

    Ok(())
}

fn error_kind(error: &CliError) -> &'static str {
    match error {
        CliError::Fetch(e) => e.kind(),
        CliError::Io(_) => "io",
        CliError::Json(_) => "json",
        CliError::Config(_) => "config",
        CliError::BatchFailed { .. } => "batch_failed",
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
