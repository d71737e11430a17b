//! # mailrelay-core
//!
//! Relay logic between the inbound SMTP server and a delivery API.
//!
//! This crate provides:
//! - Envelope mapping from `From`, `To`, `Cc`, `Bcc`, `Reply-To`, `Subject`, `Date`
//! - Delivery document assembly from the envelope and the walked MIME body
//! - The [`DeliveryClient`] seam and its `SendGrid` v3 implementation
//! - The [`Relay`] service, usable as the SMTP server's message handler
//! - Environment-based configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod delivery;
pub mod document;
pub mod envelope;
mod error;
mod relay;

pub use config::RelayConfig;
pub use delivery::{DeliveryClient, DeliveryError, DeliveryResponse, SendGridClient};
pub use document::{DeliveryDocument, DocumentBuilder, Personalization};
pub use envelope::{AddressError, EmailAddress, Envelope, EnvelopeMapper, parse_address_list};
pub use error::{Error, Result};
pub use relay::Relay;
