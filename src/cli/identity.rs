use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::cli::display;
use crate::config::Config;
use crate::identity::store::DirIdentityStore;
use crate::identity::Identity;
use crate::message::address::is_valid_address;

#[derive(Parser)]
pub struct IdentityArgs {
    #[command(subcommand)]
    pub command: IdentityCommand,
}

#[derive(Subcommand)]
pub enum IdentityCommand {
    /// List stored identities with their certificate fingerprints
    List,

    /// Store an identity from a PEM certificate (and optional signing key)
    Add {
        /// Path to a PEM-encoded X.509 certificate
        #[arg(long)]
        cert: String,

        /// Path to a PEM-encoded private key, if mail from this identity
        /// should be signed
        #[arg(long)]
        key: Option<String>,

        /// Explicit address; defaults to the certificate subject's email
        #[arg(long)]
        address: Option<String>,
    },

    /// Remove every identity stored at an address
    Remove {
        /// Address to remove
        address: String,
    },

    /// Show the identities stored at an address
    Show {
        /// Address to look up
        address: String,
    },
}

pub fn run(args: IdentityArgs, config_path: Option<&str>) -> Result<()> {
    let config = Config::load(config_path)?;
    let mut store = DirIdentityStore::open(config.store.resolve()?)?;

    match args.command {
        IdentityCommand::List => cmd_list(&store),
        IdentityCommand::Add { cert, key, address } => {
            cmd_add(&mut store, &cert, key.as_deref(), address)
        }
        IdentityCommand::Remove { address } => cmd_remove(&mut store, &address),
        IdentityCommand::Show { address } => cmd_show(&store, &address),
    }
}

fn cmd_list(store: &DirIdentityStore) -> Result<()> {
    if store.identities().is_empty() {
        println!("no identities stored in {}", store.base_dir().display());
        return Ok(());
    }

    for identity in store.identities() {
        let signing = if identity.can_sign() { " (signing)" } else { "" };
        println!("{}  {}{}", identity.address(), identity.fingerprint()?, signing);
    }
    Ok(())
}

fn cmd_add(
    store: &mut DirIdentityStore,
    cert_path: &str,
    key_path: Option<&str>,
    address: Option<String>,
) -> Result<()> {
    if let Some(address) = &address {
        if !is_valid_address(address) {
            bail!("'{}' does not look like an email address", address);
        }
    }

    let certificate = std::fs::read_to_string(cert_path)
        .with_context(|| format!("failed to read certificate '{}'", cert_path))?;
    let key = match key_path {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read key '{}'", path))?,
        ),
        None => None,
    };

    let identity = Identity::new(certificate, key, address)?;
    store.add(&identity)?;

    display::ok("identity stored");
    display::field("address:", identity.address());
    display::field("fingerprint:", &identity.fingerprint()?);
    display::field(
        "signing:",
        if identity.can_sign() { "yes" } else { "no" },
    );
    Ok(())
}

fn cmd_remove(store: &mut DirIdentityStore, address: &str) -> Result<()> {
    let removed = store.remove(address)?;
    if removed == 0 {
        display::warning(&format!("no identities stored at '{}'", address));
    } else {
        display::ok(&format!("removed {} identity(ies) at '{}'", removed, address));
    }
    Ok(())
}

fn cmd_show(store: &DirIdentityStore, address: &str) -> Result<()> {
    use crate::identity::store::IdentityLookup;

    let identities = store.find_by_address(address);
    if identities.is_empty() {
        bail!("no identities stored at '{}'", address);
    }

    for identity in identities {
        display::field("address:", identity.address());
        display::field("fingerprint:", &identity.fingerprint()?);
        display::field(
            "signing:",
            if identity.can_sign() { "yes" } else { "no" },
        );
        println!();
    }
    Ok(())
}
