pub mod display;
pub mod identity;
pub mod send;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mailseal", about = "S/MIME signing and encryption for outbound mail")]
#[command(version, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Show debug output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Minimal output (for scripting)
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Path to mailseal.toml
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage stored identities (certificates and signing keys)
    Identity(identity::IdentityArgs),

    /// Send a message through the configured SMTP transport
    Send(send::SendArgs),
}
