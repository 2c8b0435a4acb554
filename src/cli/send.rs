use anyhow::Result;
use clap::Parser;

use crate::cli::display;
use crate::config::Config;
use crate::delivery::Mailer;
use crate::identity::store::DirIdentityStore;
use crate::message::Message;
use crate::transport::smtp::SmtpTransport;

#[derive(Parser)]
pub struct SendArgs {
    /// Sender address
    #[arg(long)]
    pub from: String,

    /// Recipient address (repeatable)
    #[arg(long, required = true)]
    pub to: Vec<String>,

    /// Cc address (repeatable)
    #[arg(long)]
    pub cc: Vec<String>,

    /// Bcc address (repeatable)
    #[arg(long)]
    pub bcc: Vec<String>,

    /// Message subject
    #[arg(long, default_value = "")]
    pub subject: String,

    /// Message body; reads stdin when omitted
    #[arg(long)]
    pub body: Option<String>,
}

pub fn run(args: SendArgs, config_path: Option<&str>) -> Result<()> {
    let config = Config::load(config_path)?;

    let body = match args.body {
        Some(body) => body,
        None => {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let store = DirIdentityStore::open(config.store.resolve()?)?;
    let transport = SmtpTransport::new(config.smtp);
    let mailer = Mailer::new(store, transport, config.delivery);

    let message = Message::new(args.subject, body, args.from, args.to)
        .with_cc(args.cc)
        .with_bcc(args.bcc);

    let legs = mailer.send(&message)?;
    display::ok(&format!("message sent ({} delivery leg(s))", legs));
    Ok(())
}
