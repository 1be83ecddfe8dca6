//! Per-file byte progress for the download phase.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{bar:25.cyan/dim}] {bytes:>10}/{total_bytes:<10} {wide_msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {bytes:>10} {wide_msg}";

#[derive(Clone)]
pub struct TransferProgress {
    multi: MultiProgress,
}

impl TransferProgress {
    /// Draws to stderr.
    pub fn stderr() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
        }
    }

    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        }
    }

    /// Adds a bar for one file. Without a known size the bar is a byte
    /// counting spinner.
    pub fn file_bar(&self, label: &str, total_bytes: Option<u64>) -> ProgressBar {
        let bar = match total_bytes {
            Some(total) => ProgressBar::new(total).with_style(bar_style()),
            None => ProgressBar::new_spinner().with_style(spinner_style()),
        };
        bar.set_message(label.to_string());
        self.multi.add(bar)
    }

    /// Runs `f` with every bar cleared, redrawing them afterwards.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.multi.suspend(f)
    }
}

impl Default for TransferProgress {
    fn default() -> Self {
        Self::hidden()
    }
}

/// Switches a bar to byte-bar rendering once the real size is known.
pub fn set_total(bar: &ProgressBar, total_bytes: u64) {
    bar.set_length(total_bytes);
    bar.set_style(bar_style());
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
