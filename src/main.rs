use std::process::ExitCode;

use clap::Parser;

use tlstream::TranslateError;
use tlstream::cli::commands::{config, translate};
use tlstream::cli::{Args, Command, ConfigCommand};
use tlstream::config::ResolveOptions;
use tlstream::logging;
use tlstream::ui::Style;

/// Conventional status for termination by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = logging::init(args.verbose) {
        eprintln!("{}", Style::warning(format!("{e:#}")));
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", Style::error(format!("{e:#}")));
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    match args.command {
        Some(Command::Config { command }) => {
            match command {
                None | Some(ConfigCommand::Show) => config::show_config()?,
                Some(ConfigCommand::Set { key, value }) => {
                    config::set_value(&key, value.as_deref())?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let options = translate::TranslateOptions {
                file: args.file,
                overrides: ResolveOptions {
                    method: args.method,
                    split_threshold: args.threshold,
                    temperature: args.temperature,
                    prompt: args.prompt,
                    address: args.address,
                    model: args.model,
                    model_path: args.model_path,
                },
                quiet_progress: args.verbose,
            };
            match translate::run_translate(options).await? {
                translate::TranslateStatus::Completed => Ok(ExitCode::SUCCESS),
                translate::TranslateStatus::Cancelled => Ok(ExitCode::from(EXIT_INTERRUPTED)),
            }
        }
    }
}

fn exit_code_for(error: &anyhow::Error) -> u8 {
    let code = match error.downcast_ref::<TranslateError>() {
        Some(e) if e.is_configuration() => exitcode::CONFIG,
        Some(TranslateError::Network(_) | TranslateError::Api { .. }) => exitcode::UNAVAILABLE,
        Some(TranslateError::ResourceUnavailable(_)) => exitcode::NOINPUT,
        Some(_) => exitcode::SOFTWARE,
        None => exitcode::USAGE,
    };
    u8::try_from(code).unwrap_or(1)
}
