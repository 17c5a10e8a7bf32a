// hinst/src/main.rs
use std::io::IsTerminal;
use std::process;

use clap::Parser;
use colored::Colorize;
use hinst_common::config::Config;
use hinst_core::Installer;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::CliArgs;

fn init_logging(verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("HINST_LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .without_time()
        .try_init();
}

async fn run(cli_args: &CliArgs) -> i32 {
    let config = match Config::load().and_then(|mut base| {
        base.show_progress = std::io::stderr().is_terminal();
        cli_args.apply_to(base)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return 1;
        }
    };
    let bin_name = config.bin_name.clone();

    let installer = match Installer::new(config) {
        Ok(installer) => installer,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return 1;
        }
    };

    match installer.run().await {
        Ok(report) => {
            cli::summary::print_report(&report, &bin_name);
            debug!("Install completed in state {:?}", report.final_state);
            0
        }
        Err(e) => {
            error!("Install failed at {:?}", e.step);
            eprintln!("{}: {}", "Error".red().bold(), e);
            1
        }
    }
}

fn main() {
    let cli_args = CliArgs::parse();
    init_logging(cli_args.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}: failed to start async runtime: {}", "Error".red().bold(), e);
            process::exit(1);
        }
    };
    let code = runtime.block_on(run(&cli_args));
    process::exit(code);
}
