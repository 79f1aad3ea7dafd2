//! # tlstream - Chunked Streaming Translation
//!
//! `tlstream` translates long text by cutting it into chunks at sentence
//! boundaries and streaming each chunk through one of two backends:
//!
//! - **on-device**: a local inference engine loaded from a model file
//! - **remote**: an OpenAI-compatible `/v1/chat/completions` server on the
//!   local network, read as server-sent events
//!
//! Partial results are delivered in order as they arrive, and a running
//! call can be cancelled from another task at any point.
//!
//! ## Quick Start
//!
//! ```bash
//! # Translate a file with the saved settings
//! tlstream ./notes.txt
//!
//! # Translate stdin through a server on the LAN
//! cat report.txt | tlstream --method remote --address 192.168.1.20:8080
//!
//! # Save a default address
//! tlstream config set address 192.168.1.20:8080
//! ```
//!
//! ## Configuration
//!
//! Settings are stored in `~/.config/tlstream/config.toml`:
//!
//! ```toml
//! [translate]
//! method = "remote"
//! split_threshold = 1500
//! temperature = 0.1
//! address = "192.168.1.20:8080"
//! model = "gemma-3-12b"
//! ```

/// Command-line interface definitions and handlers.
pub mod cli;

/// Settings file management and per-call configuration.
pub mod config;

/// Failure taxonomy of a translation call.
pub mod error;

/// Atomic file writes.
pub mod fs;

/// Input reading from files and stdin.
pub mod input;

/// Diagnostic logging setup.
pub mod logging;

/// XDG-style locations for settings and cached models.
pub mod paths;

/// Chunking, backends and the translation orchestrator.
pub mod translation;

/// Terminal UI components (spinner, colors).
pub mod ui;

pub use error::TranslateError;
