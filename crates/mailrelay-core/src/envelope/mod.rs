//! Envelope extraction from message headers.

mod address;
mod mapper;

pub use address::{AddressError, EmailAddress, parse_address_list};
pub use mapper::{AddressField, Envelope, EnvelopeMapper, RejectedField};
