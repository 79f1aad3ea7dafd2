use clap::{Parser, Subcommand};

use crate::translation::BackendKind;

#[derive(Parser, Debug)]
#[command(name = "tlstream")]
#[command(about = "Chunked streaming translation with on-device and remote LLM backends")]
#[command(version)]
pub struct Args {
    /// File to translate (reads from stdin if not provided)
    pub file: Option<String>,

    /// Translation method: on-device or remote
    #[arg(short = 'm', long, value_parser = parse_method)]
    pub method: Option<BackendKind>,

    /// LLM server address as <ip>:<port>
    #[arg(short = 'a', long)]
    pub address: Option<String>,

    /// Remote model name
    #[arg(long)]
    pub model: Option<String>,

    /// On-device model file
    #[arg(long)]
    pub model_path: Option<String>,

    /// Maximum characters per request
    #[arg(short = 's', long)]
    pub threshold: Option<usize>,

    /// Sampling temperature
    #[arg(short = 't', long)]
    pub temperature: Option<f32>,

    /// System prompt
    #[arg(short = 'p', long)]
    pub prompt: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show or edit saved settings
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current settings
    Show,
    /// Set a value (method, threshold, temperature, prompt, address, model, model-path)
    Set {
        /// Setting name
        key: String,
        /// New value (omit to clear)
        value: Option<String>,
    },
}

fn parse_method(s: &str) -> Result<BackendKind, String> {
    s.parse()
}
