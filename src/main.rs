use anyhow::Result;
use clap::Parser;

use mailseal::cli;

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else if args.quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .init();

    match args.command {
        cli::Command::Identity(identity_args) => {
            cli::identity::run(identity_args, args.config.as_deref())
        }
        cli::Command::Send(send_args) => cli::send::run(send_args, args.config.as_deref()),
    }
}
