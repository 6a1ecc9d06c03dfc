mod config;
mod error;
mod oui;
mod pipeline;
mod scheduler;

#[cfg(test)]
mod test_utils;

use std::env;
use std::process;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::{error, info};

use config::{BIN_NAME, Cli, Config, LogLevel, VERSION};
use scheduler::Scheduler;

fn init_logging(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(level))
        .with_writer(std::io::stdout)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.kind() == ErrorKind::DisplayHelp { 0 } else { 1 };
            process::exit(code);
        }
    };

    if cli.version {
        println!("{}", config::version_line());
        return;
    }

    init_logging(cli.log_level);

    info!(
        version = VERSION,
        build_context = %format!("platform={}/{}", env::consts::OS, env::consts::ARCH),
        "Starting {}",
        BIN_NAME
    );

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(
                error = %e,
                interval = %cli.refresh_interval,
                metric_name = %cli.metric_name,
                "Error parsing configuration"
            );
            process::exit(1);
        }
    };

    info!(
        refresh_interval = ?config.refresh_interval,
        output_file = %config.output_file.display(),
        url = %config.registry_url,
        "Configuration loaded"
    );

    Scheduler::new(config).run().await;
}
