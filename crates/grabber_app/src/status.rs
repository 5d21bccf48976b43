use std::io::{self, Write};

use grabber_core::{Fallback, RunReport};
use grabber_engine::{PipelineError, PipelineEvent, ProgressSink};
use grabber_logging::grab_debug;

const NO_IMAGES: &str = "No images found. Try downloading manually.";
const BLOCKED: &str = "It seems like the website you're trying to download images from is \
actively blocking programs like this from working. Try downloading the image manually.";
const NO_ALT: &str = "No Alt text available. Using original filename instead.";

/// Prints pipeline progress as plain status lines on stdout.
pub struct ConsoleStatus;

impl ProgressSink for ConsoleStatus {
    fn emit(&self, event: PipelineEvent) {
        match status_line(&event) {
            Some(line) => say(&line),
            None => grab_debug!("{:?}", event),
        }
    }
}

/// Text shown to the user for `event`, if any.
pub fn status_line(event: &PipelineEvent) -> Option<String> {
    match event {
        PipelineEvent::Stage(stage) => Some(stage.status_line().to_string()),
        PipelineEvent::Fallback(Fallback::MissingAlt { .. }) => Some(NO_ALT.to_string()),
        PipelineEvent::Fallback(Fallback::EmptyName { image_url }) => Some(format!(
            "Nothing left of the name for {image_url} after cleanup. Saving it as \"image\" instead."
        )),
        PipelineEvent::Fallback(Fallback::MissingBase { .. }) | PipelineEvent::Saved { .. } => None,
    }
}

/// Lists the fallbacks a run relied on, after "Finished!".
pub fn print_summary(report: &RunReport) {
    let notable: Vec<&Fallback> = report.notable_fallbacks().collect();
    if notable.is_empty() {
        return;
    }
    say(&format!("{} image(s) needed a fallback:", notable.len()));
    for fallback in notable {
        say(&format!("  - {fallback}"));
    }
}

/// Explains why the run stopped. Expected failures get the friendly text on
/// stdout; anything else goes to stderr with its cause chain.
pub fn print_failure(err: &anyhow::Error) {
    match err.downcast_ref::<PipelineError>().and_then(failure_message) {
        Some(message) => say(message),
        None => eprintln!("error: {err:#}"),
    }
}

fn failure_message(err: &PipelineError) -> Option<&'static str> {
    if !err.is_expected() {
        return None;
    }
    match err {
        PipelineError::NoImagesFound => Some(NO_IMAGES),
        _ => Some(BLOCKED),
    }
}

fn say(line: &str) {
    let mut out = io::stdout().lock();
    // stdout may already be closed; status output is best effort.
    let _ = writeln!(out, "{line}\n");
    let _ = out.flush();
}
