//! Worker lifecycle.
//!
//! ```text
//!   Awaiting --request--> Dispatching --reply sent--> Awaiting
//!      |                       |
//!      +--- channel closed ----+----> Terminated   (no way back)
//! ```
//!
//! Requests are handled strictly one at a time, in arrival order, each run
//! to completion (provider calls included) before the next is read.

use crate::core::provider::TagProvider;

use super::channel::Channel;
use super::dispatch::{dispatch, request_path};
use super::protocol::ResponseEnvelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Idle, blocked on the channel.
    Awaiting,
    /// A request is being handled.
    Dispatching,
    /// The channel is gone. Terminal.
    Terminated,
}

/// Owns the channel and this process's pair of providers.
pub struct Worker<C, P, F> {
    channel: C,
    primary: P,
    fallback: F,
    state: WorkerState,
    handled: u64,
}

impl<C: Channel, P: TagProvider, F: TagProvider> Worker<C, P, F> {
    pub fn new(channel: C, primary: P, fallback: F) -> Self {
        Self {
            channel,
            primary,
            fallback,
            state: WorkerState::Awaiting,
            handled: 0,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Number of requests answered so far.
    pub fn handled(&self) -> u64 {
        self.handled
    }

    /// Wait for one request, answer it, and report the resulting state.
    ///
    /// Once `Terminated`, further calls do nothing.
    pub fn step(&mut self) -> WorkerState {
        if self.state == WorkerState::Terminated {
            return self.state;
        }

        let envelope = match self.channel.receive() {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                tracing::info!(handled = self.handled, "channel closed");
                return self.terminate();
            }
            Err(e) => {
                tracing::warn!(error = %e, "channel read failed");
                return self.terminate();
            }
        };

        self.state = WorkerState::Dispatching;

        let request = envelope.request.as_ref();
        tracing::debug!(
            id = envelope.id,
            kind = ?request.and_then(|r| r.kind()),
            path = ?request.and_then(request_path),
            "dispatching"
        );

        let reply = ResponseEnvelope {
            id: envelope.id,
            response: dispatch(request, &self.primary, &self.fallback),
        };

        if let Err(e) = self.channel.send(&reply) {
            // Nobody left to answer to.
            tracing::warn!(id = reply.id, error = %e, "failed to send reply");
            return self.terminate();
        }

        self.handled += 1;
        self.state = WorkerState::Awaiting;
        self.state
    }

    /// Serve requests until the channel closes. Returns how many were answered.
    pub fn run(mut self) -> u64 {
        tracing::info!(
            primary = self.primary.name(),
            fallback = self.fallback.name(),
            "worker ready"
        );
        while self.step() != WorkerState::Terminated {}
        self.handled
    }

    fn terminate(&mut self) -> WorkerState {
        self.state = WorkerState::Terminated;
        self.state
    }
}
