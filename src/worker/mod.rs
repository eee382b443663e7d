//! worker/mod.rs
//!
//! Everything that knows about the host on the other end:
//! - `protocol`: request/response types and the line codec
//! - `channel`: where lines come from and go to
//! - `dispatch`: request -> providers -> response
//! - `lifecycle`: the receive/dispatch/send loop and its states

pub mod channel;
pub mod dispatch;
pub mod lifecycle;
pub mod protocol;

pub use channel::{Channel, LineChannel};
pub use dispatch::{FallbackPolicy, dispatch};
pub use lifecycle::{Worker, WorkerState};
pub use protocol::{Request, RequestEnvelope, Response, ResponseEnvelope};
