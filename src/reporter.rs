//! 터미널 진행 표시

use indicatif::{ProgressBar, ProgressStyle};

use copyapp_updater_lib::ProgressReporter;

/// indicatif 진행 막대로 세 신호를 보여주는 리포터
///
/// - operation → prefix
/// - info → message (여러 줄이면 막대 위에 출력)
/// - progress → position (0–100)
pub struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {pos:>3}% {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleReporter {
    fn info(&self, message: &str) {
        if message.contains('\n') {
            self.bar.println(message.trim_end());
        } else {
            self.bar.set_message(message.to_string());
        }
    }

    fn operation(&self, label: &str) {
        self.bar.set_prefix(label.to_string());
        self.bar.set_position(0);
    }

    fn progress(&self, percent: u8) {
        self.bar.set_position(u64::from(percent.min(100)));
    }
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish();
        }
    }
}
