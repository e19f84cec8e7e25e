//! Data models for the Leaf bot.
//!
//! Stored records plus the inbound event shapes exchanged with the gateway bridge.

mod infraction;
mod interaction;
mod tag;

pub use infraction::*;
pub use interaction::*;
pub use tag::*;
