//! Core SMTP types.

mod address;
mod extension;
mod reply;

pub use address::{Address, parse_path};
pub use extension::{BodyType, Extension};
pub use reply::{Reply, ReplyCode};
