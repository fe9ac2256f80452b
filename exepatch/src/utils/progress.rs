//! Progress bar utilities

use indicatif::{ProgressBar, ProgressStyle};

/// Create the 0-100 bar driven by engine progress events
pub fn create_run_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}")
            .expect("invalid progress bar template")
            .progress_chars("##-"),
    );
    pb
}
