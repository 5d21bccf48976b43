use anyhow::Context;
use grabber_core::RunReport;
use grabber_engine::{ensure_output_dir, run_blocking};
use grabber_logging::grab_info;

use crate::cli::Cli;
use crate::status::ConsoleStatus;

/// Creates the output directory and runs the pipeline once.
pub fn run(cli: &Cli) -> anyhow::Result<RunReport> {
    let config = cli.run_config();
    ensure_output_dir(&config.output_dir)
        .with_context(|| format!("preparing output directory {:?}", config.output_dir))?;

    grab_info!(
        "scraping {} with selector {:?} into {:?} (naming: {}, max side: {})",
        config.source_url,
        config.css_selector,
        config.output_dir,
        config.naming,
        config.max_side
    );

    let report = run_blocking(&config, cli.fetch_settings(), &ConsoleStatus)?;
    grab_info!(
        "wrote {} thumbnail(s), rasterized {} svg(s)",
        report.thumbnails.len(),
        report.rasterized_svgs
    );
    Ok(report)
}
