//! Source text acquisition for the translate command.

mod reader;

pub use reader::{InputReader, MAX_INPUT_SIZE};
