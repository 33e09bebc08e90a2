use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use litfetch::cli::{Cli, Commands};
use litfetch::config::Config;
use litfetch::{rows, target, Downloader};

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "litfetch=info");
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "litfetch.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match &cli.command {
        Commands::Download {
            input,
            output,
            errors,
        } => {
            input.apply(&mut config);
            if let Some(output) = output {
                config.output_dir = output.clone();
            }
            if let Some(errors) = errors {
                config.errors_path = errors.clone();
            }
            config.validate()?;

            let format = input.input_format(&config.input_path)?;
            info!(
                "Running litfetch on {} ({})...",
                config.input_path.display(),
                format.as_str()
            );

            let rows = rows::open(&config.input_path, format)
                .with_context(|| format!("Failed to open input file: {}", config.input_path.display()))?;

            let downloader = Downloader::new(&config)?;
            let summary = downloader.run(rows).await;

            info!(
                "Processed {} rows: {} saved, {} failed, {} not written",
                summary.rows, summary.saved, summary.failed, summary.persist_failures
            );
            if summary.unreadable_rows > 0 {
                error!("{} rows could not be read from the input", summary.unreadable_rows);
            }
            info!("Closing");
        }

        Commands::Plan { input } => {
            input.apply(&mut config);
            let format = input.input_format(&config.input_path)?;

            let rows = rows::open(&config.input_path, format)
                .with_context(|| format!("Failed to open input file: {}", config.input_path.display()))?;

            for row in rows {
                match row {
                    Ok(row) => {
                        let target = target::build(&row, &config.base_uri);
                        println!(
                            "{} -> {}",
                            target.uri,
                            config.output_dir.join(format!("{}.txt", target.local_name)).display()
                        );
                    }
                    Err(e) => error!("Skipping unreadable row: {}", e),
                }
            }
        }
    }

    Ok(())
}
