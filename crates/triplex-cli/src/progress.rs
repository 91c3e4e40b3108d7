//! Progress bars for `tpx run`

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::time::Duration;
use triplex_pipeline::{RunObserver, RunPhase};

/// Renders run phases as a spinner and each domain's batches as a bar
pub struct ProgressObserver {
    current: Mutex<Option<ProgressBar>>,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    fn replace(&self, bar: ProgressBar) {
        if let Some(previous) = self.current.lock().replace(bar) {
            previous.finish();
        }
    }

    /// Finish whatever bar is showing
    pub fn finish(&self) {
        if let Some(bar) = self.current.lock().take() {
            bar.finish();
        }
    }

    fn spinner(message: String) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    fn batch_bar(domain: &str, batches: usize) -> ProgressBar {
        let bar = ProgressBar::new(batches as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(domain.to_string());
        bar
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for ProgressObserver {
    fn on_phase(&self, phase: &RunPhase) {
        match phase {
            RunPhase::Writing { domain, batches } => {
                self.replace(Self::batch_bar(domain, *batches))
            }
            other => self.replace(Self::spinner(other.to_string())),
        }
    }

    fn on_batch_written(&self, domain: &str, _batch_index: usize, _total: usize, rows: usize) {
        if let Some(bar) = self.current.lock().as_ref() {
            bar.inc(1);
            bar.set_message(format!("{} (+{} rows)", domain, rows));
        }
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        self.finish();
    }
}
