use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{self, Read};

/// Largest input accepted in one invocation (4 MiB).
pub const MAX_INPUT_SIZE: u64 = 4 * 1024 * 1024;

/// Reads the text to translate from a file or stdin.
pub struct InputReader;

impl InputReader {
    /// Reads `file_path`, or stdin when `None`, and rejects blank input.
    pub fn read(file_path: Option<&str>) -> Result<String> {
        let text = match file_path {
            Some(path) => {
                let file =
                    File::open(path).with_context(|| format!("Failed to open file: {path}"))?;
                Self::read_limited(file, path)?
            }
            None => Self::read_limited(io::stdin().lock(), "stdin")?,
        };

        if text.trim().is_empty() {
            bail!("Error: Input is empty");
        }
        Ok(text)
    }

    fn read_limited(source: impl Read, origin: &str) -> Result<String> {
        let mut buffer = Vec::new();
        source
            .take(MAX_INPUT_SIZE + 1)
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read from {origin}"))?;

        if buffer.len() as u64 > MAX_INPUT_SIZE {
            bail!(
                "Error: Input from {origin} exceeds the maximum allowed size ({} MiB).",
                MAX_INPUT_SIZE / 1024 / 1024
            );
        }

        String::from_utf8(buffer).with_context(|| format!("Input from {origin} is not valid UTF-8"))
    }
}
