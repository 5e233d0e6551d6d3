//! Status lines and download progress

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use nova_deps::{DownloadProgress, ProgressSink};
use std::fmt::Display;

const ISSUES_URL: &str = "https://github.com/kadir014/nova-physics/issues";

/// Prints `INFO` / `DONE` / `FAIL` lines
#[derive(Debug, Clone, Copy)]
pub struct Output {
    quiet: bool,
    verbose: bool,
}

impl Output {
    pub fn new(color: bool, quiet: bool, verbose: bool) -> Self {
        if !color {
            colored::control::set_override(false);
        }
        Self { quiet, verbose }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn info(&self, message: impl Display) {
        if !self.quiet {
            println!("{} {}", " INFO ".on_blue().white().bold(), message);
        }
    }

    pub fn done(&self, message: impl Display) {
        if !self.quiet {
            println!("{} {}", " DONE ".on_green().black().bold(), message);
        }
    }

    /// Shown only with `--verbose`
    pub fn detail(&self, message: impl Display) {
        if self.verbose {
            println!("       {}", message.to_string().dimmed());
        }
    }

    /// Always printed, to stderr
    pub fn fail(&self, message: impl Display) {
        eprintln!("{} {}", " FAIL ".on_red().white().bold(), message);
    }

    /// Crash diagnostic for a program that died with a known crash code
    pub fn crash(&self, what: &str, code: i64) {
        self.fail(format!(
            "Segmentation fault occurred in the {what}. Exit code: {code}"
        ));
        eprintln!("       Please report this at {}", ISSUES_URL.cyan());
    }
}

/// Print an error and its causes
pub fn print_failure(error: &anyhow::Error) {
    eprintln!("{} {}", " FAIL ".on_red().white().bold(), error);
    for cause in error.chain().skip(1) {
        eprintln!("       {} {}", "caused by:".dimmed(), cause);
    }
}

/// Renders dependency downloads as progress bars
pub struct DownloadBar {
    output: Output,
    bar: Option<ProgressBar>,
}

impl DownloadBar {
    pub fn new(output: Output) -> Self {
        Self { output, bar: None }
    }

    fn style(total_known: bool) -> ProgressStyle {
        let template = if total_known {
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg} (eta {eta})"
        } else {
            "{spinner:.green} [{elapsed_precise}] {bytes} {msg}"
        };
        ProgressStyle::with_template(template)
            .map(|style| style.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl ProgressSink for DownloadBar {
    fn downloading(&mut self, dependency: &str, url: &str) {
        self.output.info(format!("Downloading {}", dependency.bold()));
        self.output.detail(url);
    }

    fn started(&mut self, total: Option<u64>) {
        let bar = if self.output.is_quiet() {
            ProgressBar::hidden()
        } else {
            match total {
                Some(total) => ProgressBar::new(total),
                None => ProgressBar::new_spinner(),
            }
        };
        bar.set_style(Self::style(total.is_some()));
        self.bar = Some(bar);
    }

    fn progress(&mut self, progress: &DownloadProgress) {
        if let Some(bar) = &self.bar {
            bar.set_position(progress.downloaded);
            bar.set_message(format!("{:.2} Mbps", progress.mbps()));
        }
    }

    fn finished(&mut self, progress: &DownloadProgress) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        self.output.done(format!(
            "Downloaded {:.2} MB in {:.2}s ({:.2} Mbps)",
            progress.downloaded as f64 / (1024.0 * 1024.0),
            progress.elapsed.as_secs_f64(),
            progress.mbps()
        ));
    }

    fn extracting(&mut self, dependency: &str, archive_path: &str) {
        self.output
            .detail(format!("Extracting {archive_path} from {dependency}"));
    }
}
