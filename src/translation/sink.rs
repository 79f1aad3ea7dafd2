//! Delivery of partial results and the terminal outcome to the caller.

use crate::error::TranslateError;

/// Receives the events of one `translate` call.
///
/// `on_result` fires zero or more times, in input order. Afterwards at most
/// one of `on_error` or `on_complete` fires; a cancelled call fires neither.
pub trait TranslationSink: Send {
    fn on_result(&mut self, text: &str);

    fn on_error(&mut self, error: TranslateError);

    fn on_complete(&mut self);
}

/// Adapts three closures to [`TranslationSink`].
pub struct Callbacks<R, E, C> {
    on_result: R,
    on_error: E,
    on_complete: C,
}

impl<R, E, C> Callbacks<R, E, C>
where
    R: FnMut(&str) + Send,
    E: FnMut(TranslateError) + Send,
    C: FnMut() + Send,
{
    pub const fn new(on_result: R, on_error: E, on_complete: C) -> Self {
        Self {
            on_result,
            on_error,
            on_complete,
        }
    }
}

impl<R, E, C> TranslationSink for Callbacks<R, E, C>
where
    R: FnMut(&str) + Send,
    E: FnMut(TranslateError) + Send,
    C: FnMut() + Send,
{
    fn on_result(&mut self, text: &str) {
        (self.on_result)(text);
    }

    fn on_error(&mut self, error: TranslateError) {
        (self.on_error)(error);
    }

    fn on_complete(&mut self) {
        (self.on_complete)();
    }
}

/// How a call ended, as seen by a [`Collector`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Neither terminal callback fired (cancelled, or still running).
    #[default]
    Pending,
    Completed,
    Failed(TranslateError),
}

/// A sink that accumulates everything it receives.
#[derive(Debug, Default)]
pub struct Collector {
    pub partials: Vec<String>,
    pub outcome: Outcome,
}

impl Collector {
    pub fn text(&self) -> String {
        self.partials.concat()
    }
}

impl TranslationSink for Collector {
    fn on_result(&mut self, text: &str) {
        self.partials.push(text.to_string());
    }

    fn on_error(&mut self, error: TranslateError) {
        self.outcome = Outcome::Failed(error);
    }

    fn on_complete(&mut self) {
        self.outcome = Outcome::Completed;
    }
}
