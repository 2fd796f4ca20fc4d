use std::process::ExitCode;

use clap::Parser;
use quote_app::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match quote_app::platform::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
