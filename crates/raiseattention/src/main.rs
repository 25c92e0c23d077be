//! The `raiseattention` command-line binary.

mod cache_cmd;
mod check;
mod cli;
mod report;

use std::io::Write as _;
use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, matches!(&cli.command, Command::Check(args) if args.debug));

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Check(args) => check::run(args),
        Command::Lsp => {
            raiseattention_server::run_lsp()?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Cache { action } => cache_cmd::run(action),
    }
}

/// `-v`/`-vv` set the general verbosity; `check --debug` is sugar for the
/// highest level plus the extra per-file timings `check` itself logs.
fn init_logging(verbose: u8, debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args()))
        .init();
}
