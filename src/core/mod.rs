//! core/mod.rs
//!
//! Everything that touches media files:
//! - `TrackMetadata`: the record requests and replies carry
//! - `TagProvider`: the capability set a backend offers
//! - two backends: a general-purpose one (Symphonia + ID3) and a
//!   specialized one for console chiptune rips (SPC/VGM)
//!
//! Nothing in here knows about requests, replies or the channel.
//! That stays in `worker`.

pub mod chiptune;
pub mod provider;
pub mod tags;
pub mod types;

pub use chiptune::ChiptuneTagProvider;
pub use provider::TagProvider;
pub use tags::GeneralTagProvider;
pub use types::TrackMetadata;
