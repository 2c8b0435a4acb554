//! SMTP delivery via lettre.

use std::collections::BTreeSet;

use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, SmtpTransport as LettreSmtp, Transport as _};
use serde::Deserialize;
use tracing::{debug, info};

use super::{Transport, TransportError};

/// SMTP connection settings, the `[smtp]` section of `mailseal.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub starttls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25,
            starttls: false,
            username: None,
            password: None,
        }
    }
}

/// Network transport with a lazily-opened connection handle. The handle is
/// created by `open` (or on first delivery) and dropped by `close`.
pub struct SmtpTransport {
    config: SmtpConfig,
    connection: Option<LettreSmtp>,
}

impl SmtpTransport {
    pub fn new(config: SmtpConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    fn connect(&self) -> Result<LettreSmtp, TransportError> {
        let builder = if self.config.starttls {
            LettreSmtp::starttls_relay(&self.config.host)
                .map_err(|e| TransportError::with_source("STARTTLS setup failed", e))?
        } else {
            LettreSmtp::builder_dangerous(&self.config.host)
        };

        let mut builder = builder.port(self.config.port);
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(builder.build())
    }
}

impl Transport for SmtpTransport {
    fn open(&mut self) -> Result<bool, TransportError> {
        if self.connection.is_some() {
            return Ok(false);
        }

        let connection = self.connect()?;
        let reachable = connection
            .test_connection()
            .map_err(|e| TransportError::with_source("SMTP connection failed", e))?;
        if !reachable {
            return Err(TransportError::new(format!(
                "cannot open SMTP connection to {}:{}",
                self.config.host, self.config.port
            )));
        }

        debug!(host = %self.config.host, port = self.config.port, "opened SMTP connection");
        self.connection = Some(connection);
        Ok(true)
    }

    fn deliver(
        &mut self,
        sender: &str,
        recipients: &BTreeSet<String>,
        message: &str,
    ) -> Result<(), TransportError> {
        if self.connection.is_none() {
            self.open()?;
        }
        let connection = match self.connection.as_ref() {
            Some(connection) => connection,
            None => return Err(TransportError::new("no open SMTP connection")),
        };

        let from = sender
            .parse::<Address>()
            .map_err(|e| TransportError::with_source(format!("invalid sender {}", sender), e))?;
        let to = recipients
            .iter()
            .map(|recipient| {
                recipient.parse::<Address>().map_err(|e| {
                    TransportError::with_source(format!("invalid recipient {}", recipient), e)
                })
            })
            .collect::<Result<Vec<Address>, TransportError>>()?;
        let envelope = Envelope::new(Some(from), to)
            .map_err(|e| TransportError::with_source("invalid envelope", e))?;

        connection
            .send_raw(&envelope, message.as_bytes())
            .map_err(|e| TransportError::with_source("SMTP delivery failed", e))?;

        info!(sender = %sender, recipients = recipients.len(), "delivered message");
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.connection.take().is_some() {
            debug!(host = %self.config.host, "closed SMTP connection");
        }
        Ok(())
    }
}
