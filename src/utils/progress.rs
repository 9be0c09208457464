use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress display that can be silenced for tests and piped output.
///
/// Starts as a spinner; [`ProgressReporter::set_length`] turns it into a
/// counting bar once the amount of work is known.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

impl ProgressReporter {
    pub fn new_spinner(message: &str, silent: bool) -> Self {
        if silent {
            return Self::silent();
        }

        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(100));
        let reporter = Self::from_bar(pb);
        reporter.set_message(message);
        reporter
    }

    pub fn silent() -> Self {
        Self { progress_bar: None }
    }

    pub(crate) fn from_bar(pb: ProgressBar) -> Self {
        pb.set_style(spinner_style());
        Self {
            progress_bar: Some(pb),
        }
    }

    /// Show `{pos}/{len}` against `total` from here on, starting at zero.
    pub fn set_length(&self, total: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_style(bar_style());
            pb.set_length(total);
            pb.set_position(0);
        }
    }

    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_reporter_is_inert() {
        let progress = ProgressReporter::new_spinner("Matching cities...", true);
        assert!(progress.progress_bar.is_none());

        progress.set_length(20);
        progress.increment(1);
        progress.set_message("still silent");
        progress.finish_with_message("done");
    }

    #[test]
    fn test_spinner_becomes_counting_bar() {
        let pb = ProgressBar::hidden();
        let progress = ProgressReporter::from_bar(pb.clone());
        progress.increment(3);

        progress.set_length(5);
        assert_eq!(pb.length(), Some(5));
        assert_eq!(pb.position(), 0);

        for _ in 0..5 {
            progress.increment(1);
        }
        assert_eq!(pb.position(), 5);

        progress.finish_with_message("done");
        assert!(pb.is_finished());
    }
}
