//! # mailrelay-smtp
//!
//! A minimal inbound SMTP server implementing the RFC 5321 receiver side.
//!
//! ## Features
//!
//! - **Session state machine**: HELO/EHLO, MAIL FROM, RCPT TO, DATA, RSET,
//!   VRFY, NOOP and QUIT with 503 on out-of-order commands
//! - **Limits**: idle timeout, maximum message size and recipient count
//! - **Extensions**: 8BITMIME, SIZE, PIPELINING
//! - **No authentication**: AUTH and STARTTLS are answered with 502
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailrelay_smtp::{MessageHandler, ReceivedMessage, Server, ServerConfig};
//!
//! struct Print;
//!
//! impl MessageHandler for Print {
//!     type Error = std::convert::Infallible;
//!
//!     async fn handle(&self, message: ReceivedMessage) -> Result<(), Self::Error> {
//!         println!("{} bytes for {:?}", message.data.len(), message.recipients);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> mailrelay_smtp::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1:2525", "relay.example.com");
//!     Server::new(config, Print).listen_and_serve().await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command parser
//! - [`types`]: Core SMTP types (addresses, extensions, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
mod config;
mod error;
mod handler;
mod server;
mod session;
pub mod types;

pub use command::Command;
pub use config::ServerConfig;
pub use error::{Error, Result};
pub use handler::{MessageHandler, ReceivedMessage};
pub use server::Server;
pub use session::Session;
pub use types::{Address, BodyType, Extension, Reply, ReplyCode};
