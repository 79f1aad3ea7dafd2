mod backend;
mod cancel;
pub mod on_device;
mod orchestrator;
mod prompt;
mod remote;
mod segment;
mod sink;
mod sse_parser;

pub use backend::{Backend, BackendKind, PartialFn};
pub use cancel::CancelFlag;
pub use orchestrator::{Translator, TranslatorBuilder};
pub use prompt::{DEFAULT_SYSTEM_PROMPT, build_on_device_query};
pub use remote::RemoteBackend;
pub use segment::{CLAUSE_BOUNDARIES, SENTENCE_BOUNDARIES, chunks, split};
pub use sink::{Callbacks, Collector, Outcome, TranslationSink};
pub use sse_parser::{SseLine, parse_sse_line, sse_lines};
