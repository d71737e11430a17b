//! SMTP server session.
//!
//! One [`Session`] serves one connection: it reads commands line by line,
//! tracks the HELO and mail transaction state, enforces the configured
//! limits and hands each completed message to the [`MessageHandler`].

use crate::command::Command;
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::handler::{MessageHandler, ReceivedMessage};
use crate::types::{Address, BodyType, Extension, Reply, ReplyCode};
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Maximum command line length, CRLF included.
const MAX_COMMAND_LINE: usize = 4096;

/// What the session does after a command.
enum Flow {
    Continue,
    Close,
}

/// Envelope collected between MAIL and DATA.
#[derive(Debug)]
struct Transaction {
    from: Option<Address>,
    body: BodyType,
    recipients: Vec<Address>,
}

/// State of one SMTP connection.
#[derive(Debug)]
pub struct Session<H> {
    config: Arc<ServerConfig>,
    handler: Arc<H>,
    client_hostname: Option<String>,
    transaction: Option<Transaction>,
}

impl<H: MessageHandler> Session<H> {
    /// Creates a session sharing the server configuration and handler.
    #[must_use]
    pub const fn new(config: Arc<ServerConfig>, handler: Arc<H>) -> Self {
        Self {
            config,
            handler,
            client_hostname: None,
            transaction: None,
        }
    }

    /// Runs the session until QUIT, EOF, idle timeout or an I/O error.
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O failures; protocol errors are answered
    /// with a reply and the session continues.
    pub async fn run<S>(mut self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);

        let greeting = format!("{} ESMTP Service Ready", self.config.domain);
        write_reply(&mut writer, &Reply::single(ReplyCode::SERVICE_READY, greeting)).await?;

        loop {
            let Some(raw) = self
                .next_line(&mut reader, &mut writer, MAX_COMMAND_LINE)
                .await?
            else {
                return Ok(());
            };

            if raw.len() >= MAX_COMMAND_LINE && !raw.ends_with(b"\n") {
                if let Some(reply) = Error::LineTooLong.to_reply() {
                    write_reply(&mut writer, &reply).await?;
                }
                return Ok(());
            }

            let line = String::from_utf8_lossy(&raw);
            let result = match Command::parse(&line) {
                Ok(command) => {
                    debug!(verb = command.verb(), "Received command");
                    self.dispatch(command, &mut reader, &mut writer).await
                }
                Err(error) => Err(error),
            };

            match result {
                Ok(Flow::Continue) => {}
                Ok(Flow::Close) => return Ok(()),
                Err(error) => match error.to_reply() {
                    Some(reply) => {
                        debug!(%error, "Command rejected");
                        write_reply(&mut writer, &reply).await?;
                    }
                    None => return Err(error),
                },
            }
        }
    }

    async fn dispatch<R, W>(&mut self, command: Command, reader: &mut R, writer: &mut W) -> Result<Flow>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let domain = &self.config.domain;

        let reply = match command {
            Command::Helo { hostname } => {
                let reply = Reply::single(ReplyCode::OK, format!("{domain} Hello {hostname}"));
                self.transaction = None;
                self.client_hostname = Some(hostname);
                reply
            }
            Command::Ehlo { hostname } => {
                let lines = [
                    format!("{domain} Hello {hostname}"),
                    Extension::Pipelining.to_string(),
                    Extension::EightBitMime.to_string(),
                    Extension::Size(self.config.max_message_bytes).to_string(),
                ];
                self.transaction = None;
                self.client_hostname = Some(hostname);
                Reply::new(ReplyCode::OK, lines.to_vec())
            }
            Command::StartTls | Command::Auth { .. } => {
                return Err(Error::NotImplemented(command.verb().to_string()));
            }
            Command::MailFrom { from, body, size } => {
                if self.client_hostname.is_none() {
                    return Err(Error::BadSequence("Send HELO/EHLO first"));
                }
                if self.transaction.is_some() {
                    return Err(Error::BadSequence("Nested MAIL command"));
                }
                if size.is_some_and(|size| size > self.config.max_message_bytes) {
                    return Err(Error::MessageTooLarge(self.config.max_message_bytes));
                }
                self.transaction = Some(Transaction {
                    from,
                    body: body.unwrap_or_default(),
                    recipients: Vec::new(),
                });
                Reply::single(ReplyCode::OK, "OK")
            }
            Command::RcptTo { to } => {
                let max = self.config.max_recipients;
                let transaction = self
                    .transaction
                    .as_mut()
                    .ok_or(Error::BadSequence("Send MAIL first"))?;
                if transaction.recipients.len() >= max {
                    return Err(Error::TooManyRecipients(max));
                }
                transaction.recipients.push(to);
                Reply::single(ReplyCode::OK, "OK")
            }
            Command::Data => return self.receive_data(reader, writer).await,
            Command::Rset => {
                self.transaction = None;
                Reply::single(ReplyCode::OK, "OK")
            }
            Command::Vrfy { .. } => Reply::single(
                ReplyCode::CANNOT_VERIFY,
                "Cannot VRFY user, but will accept message",
            ),
            Command::Noop => Reply::single(ReplyCode::OK, "OK"),
            Command::Quit => {
                let reply = Reply::single(
                    ReplyCode::CLOSING,
                    format!("{domain} Service closing transmission channel"),
                );
                write_reply(writer, &reply).await?;
                return Ok(Flow::Close);
            }
        };

        write_reply(writer, &reply).await?;
        Ok(Flow::Continue)
    }

    async fn receive_data<R, W>(&mut self, reader: &mut R, writer: &mut W) -> Result<Flow>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let transaction = match self.transaction.take() {
            None => return Err(Error::BadSequence("Send MAIL first")),
            Some(transaction) if transaction.recipients.is_empty() => {
                self.transaction = Some(transaction);
                return Err(Error::BadSequence("Send RCPT first"));
            }
            Some(transaction) => transaction,
        };

        write_reply(
            writer,
            &Reply::single(ReplyCode::START_DATA, "Start mail input; end with <CRLF>.<CRLF>"),
        )
        .await?;

        let max = self.config.max_message_bytes;
        let line_limit = max.saturating_add(MAX_COMMAND_LINE);
        let mut data = Vec::new();
        let mut too_large = false;

        loop {
            let Some(line) = self.next_line(reader, writer, line_limit).await? else {
                return Ok(Flow::Close);
            };

            if line == b".\r\n" || line == b".\n" {
                break;
            }
            if too_large {
                continue;
            }

            let line = line.strip_prefix(b".").unwrap_or(&line);
            if data.len() + line.len() > max {
                too_large = true;
                data = Vec::new();
                continue;
            }
            data.extend_from_slice(line);
        }

        if too_large {
            return Err(Error::MessageTooLarge(max));
        }

        let message = ReceivedMessage {
            client_hostname: self.client_hostname.clone().unwrap_or_default(),
            from: transaction.from,
            body: transaction.body,
            recipients: transaction.recipients,
            data,
        };
        info!(
            from = message.from.as_ref().map_or("<>", Address::as_str),
            body = ?message.body,
            recipients = message.recipients.len(),
            bytes = message.data.len(),
            "Message received"
        );

        let reply = match self.handler.handle(message).await {
            Ok(()) => Reply::single(ReplyCode::OK, "OK: message accepted"),
            Err(error) => {
                warn!(%error, "Message handler failed");
                Reply::single(ReplyCode::TRANSACTION_FAILED, format!("Error: {error}"))
            }
        };
        write_reply(writer, &reply).await?;

        Ok(Flow::Continue)
    }

    /// Reads one line of at most `limit` bytes.
    ///
    /// Returns `None` on EOF, and on idle timeout after answering 421.
    async fn next_line<R, W>(&self, reader: &mut R, writer: &mut W, limit: usize) -> Result<Option<Vec<u8>>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = Vec::new();
        let mut limited = (&mut *reader).take(limit as u64);

        match timeout(self.config.max_idle, limited.read_until(b'\n', &mut line)).await {
            Err(_) => {
                info!("Idle timeout, closing connection");
                let reply = Reply::single(
                    ReplyCode::SERVICE_UNAVAILABLE,
                    format!("{} Idle timeout, closing connection", self.config.domain),
                );
                write_reply(writer, &reply).await?;
                Ok(None)
            }
            Ok(Ok(0)) => Ok(None),
            Ok(Ok(_)) => Ok(Some(line)),
            Ok(Err(error)) => Err(error.into()),
        }
    }
}

async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &Reply) -> Result<()> {
    writer.write_all(&reply.serialize()).await?;
    writer.flush().await?;
    Ok(())
}
