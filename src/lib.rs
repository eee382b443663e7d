//! Sonora tag reader.
//!
//! A small worker process that answers metadata requests for media files on
//! behalf of a host application. The host sends one request per line; the
//! worker routes it to a general-purpose provider (Symphonia + ID3) and, per
//! a fixed policy, to a specialized one for console chiptune rips, then
//! sends back exactly one reply.
//!
//! - `core`: metadata record, the `TagProvider` trait, both providers
//! - `worker`: protocol, channel, dispatcher, lifecycle
//! - `config`: command line / environment settings

pub mod config;
pub mod core;
pub mod error;
pub mod worker;
