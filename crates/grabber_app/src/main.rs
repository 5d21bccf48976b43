//! Command-line front end: collects the run inputs, prints status, maps failures to exit codes.
mod app;
mod cli;
mod logging;
mod status;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    logging::initialize(cli.log_destination(), cli.log_level);

    match app::run(&cli) {
        Ok(report) => {
            status::print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            status::print_failure(&err);
            ExitCode::FAILURE
        }
    }
}
