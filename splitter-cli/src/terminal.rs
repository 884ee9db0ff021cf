// ============================================================================
// splitter-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: console rendering of core progress
//
// TerminalReporter receives section headers, status lines and frame counts
// from splitter-core and renders them with console styling and an indicatif
// progress bar. Messages printed while the bar is visible are routed through
// ProgressBar::suspend so the bar is redrawn below them.
//
// AI-ASSISTANT-INFO: Terminal reporter and result printing

use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use splitter_core::AnalysisResult;
use splitter_core::progress_reporting::{OutputLevel, ProgressReporter};

const BAR_TEMPLATE: &str = "Analyzing [{bar:40}] {percent:>3}% | {pos}/{len} frames | {msg}";
const SPINNER_TEMPLATE: &str = "{spinner} Analyzing | {pos} frames";

/// Renders core progress on the terminal.
pub struct TerminalReporter {
    progress_bar: Mutex<Option<ProgressBar>>,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            progress_bar: Mutex::new(None),
        }
    }

    fn print(&self, line: String) {
        match self.progress_bar.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(bar) => bar.suspend(|| println!("{line}")),
                None => println!("{line}"),
            },
            Err(_) => println!("{line}"),
        }
    }

    fn new_bar(total: u64) -> ProgressBar {
        if total == 0 {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            return bar;
        }

        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for TerminalReporter {
    fn output(&self, level: OutputLevel, text: &str) {
        let line = match level {
            OutputLevel::Section => format!("\n{}", style(text.to_uppercase()).bold().cyan()),
            OutputLevel::Processing => format!("{} {}", style("»").magenta().bold(), text),
            OutputLevel::Success => format!("  {} {}", style("✓").green().bold(), text),
            OutputLevel::Warning => format!("  {} {}", style("!").yellow().bold(), style(text).yellow()),
            OutputLevel::Info => format!("  {text}"),
        };
        self.print(line);
    }

    fn output_status(&self, label: &str, value: &str, highlight: bool) {
        let value = if highlight {
            style(value).green().bold().to_string()
        } else {
            value.to_string()
        };
        self.print(format!("  {:<12} {}", style(format!("{label}:")).bold(), value));
    }

    fn frame_progress(&self, processed: u64, total: u64) {
        let Ok(mut guard) = self.progress_bar.lock() else {
            return;
        };
        let bar = guard.get_or_insert_with(|| {
            let bar = Self::new_bar(total);
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        bar.set_position(processed);
        if total > 0 {
            bar.set_message(format!("{:.1}%", processed as f64 * 100.0 / total as f64));
        }
    }

    fn clear_progress_bar(&self) {
        if let Ok(mut guard) = self.progress_bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

/// Prints the analysis summary with the headline lines emphasized.
pub fn print_summary(result: &AnalysisResult) {
    println!("\n{}", style("SUMMARY").bold().cyan());
    for line in result.summary_lines() {
        if line.starts_with("  ") {
            println!("{line}");
        } else {
            match line.split_once(": ") {
                Some((label, value)) => {
                    println!("  {:<12} {}", style(format!("{label}:")).bold(), value)
                }
                None => println!("  {line}"),
            }
        }
    }
}

/// Prints a fatal error on stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}

/// Prints a follow-up line under an error.
pub fn print_hint(message: &str) {
    eprintln!("  {} {}", style("Hint:").yellow(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_is_created_and_cleared() {
        let reporter = TerminalReporter::new();
        reporter.frame_progress(10, 100);
        assert_eq!(
            reporter.progress_bar.lock().unwrap().as_ref().map(|b| b.position()),
            Some(10)
        );

        reporter.frame_progress(20, 100);
        assert_eq!(
            reporter.progress_bar.lock().unwrap().as_ref().map(|b| b.length()),
            Some(Some(100))
        );

        reporter.clear_progress_bar();
        assert!(reporter.progress_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_unknown_total_uses_spinner() {
        let reporter = TerminalReporter::new();
        reporter.frame_progress(5, 0);
        assert_eq!(
            reporter.progress_bar.lock().unwrap().as_ref().map(|b| b.length()),
            Some(None)
        );
        reporter.clear_progress_bar();
    }
}
