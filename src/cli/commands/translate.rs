//! The default command: translate a file or stdin and stream the result.

use anyhow::Result;
use std::io::{self, Write};
use std::sync::Arc;

use crate::config::{ConfigManager, ResolveOptions, resolve_config};
use crate::error::TranslateError;
use crate::input::InputReader;
use crate::translation::{Outcome, TranslationSink, Translator};
use crate::ui::Spinner;

pub struct TranslateOptions {
    pub file: Option<String>,
    pub overrides: ResolveOptions,
    /// Suppresses the spinner so it does not interleave with debug logs.
    pub quiet_progress: bool,
}

/// How a translate command ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateStatus {
    Completed,
    Cancelled,
}

/// Prints partial results to stdout as they arrive.
struct StdoutSink<'a> {
    spinner: &'a Spinner,
    wrote_any: bool,
    outcome: Outcome,
}

impl<'a> StdoutSink<'a> {
    const fn new(spinner: &'a Spinner) -> Self {
        Self {
            spinner,
            wrote_any: false,
            outcome: Outcome::Pending,
        }
    }
}

impl TranslationSink for StdoutSink<'_> {
    fn on_result(&mut self, text: &str) {
        if !self.wrote_any {
            self.spinner.stop();
            self.wrote_any = true;
        }
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn on_error(&mut self, error: TranslateError) {
        self.outcome = Outcome::Failed(error);
    }

    fn on_complete(&mut self) {
        self.outcome = Outcome::Completed;
    }
}

pub async fn run_translate(options: TranslateOptions) -> Result<TranslateStatus> {
    let manager = ConfigManager::new()?;
    let file_config = manager.load_or_default()?;
    let resolved = resolve_config(&options.overrides, &file_config)?;

    let source_text = InputReader::read(options.file.as_deref())?;

    let translator = Arc::new(Translator::builder().build());

    let canceller = Arc::clone(&translator);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let spinner = if options.quiet_progress {
        Spinner::hidden()
    } else {
        Spinner::new(&format!("Translating ({})...", resolved.method))
    };
    let mut sink = StdoutSink::new(&spinner);

    translator
        .translate(&source_text, resolved.method, &resolved.config, &mut sink)
        .await;

    ctrl_c.abort();
    spinner.stop();

    if sink.wrote_any {
        println!();
    }

    match sink.outcome {
        Outcome::Completed => Ok(TranslateStatus::Completed),
        Outcome::Failed(e) => Err(e.into()),
        Outcome::Pending => Ok(TranslateStatus::Cancelled),
    }
}
