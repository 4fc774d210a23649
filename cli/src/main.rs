//! Ferry CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use ferry_cli::cli::Cli;
use ferry_cli::domain::error::{error_code, passthrough};
use ferry_cli::output::json::format_error;

/// Exit status for a failed command: the remote tool's own code when one
/// exists, otherwise 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    passthrough(err)
        .and_then(|(code, _)| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

fn report(err: &anyhow::Error, json: bool) -> ExitCode {
    let code = exit_code(err);
    if json {
        let stderr = passthrough(err).map(|(_, stderr)| stderr);
        match format_error(&format!("{err:#}"), error_code(err), i32::from(code), stderr) {
            Ok(obj) => println!("{obj}"),
            Err(_) => eprintln!("Error: {err:#}"),
        }
        return ExitCode::from(code);
    }
    if let Some((_, stderr)) = passthrough(err)
        && !stderr.is_empty()
    {
        eprint!("{stderr}");
        if !stderr.ends_with('\n') {
            eprintln!();
        }
    }
    eprintln!("Error: {err:#}");
    ExitCode::from(code)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    ferry_cli::logging::init(cli.verbose, ferry_cli::logging::use_ansi(cli.no_color));
    let json = cli.json;
    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, json),
    }
}
