//! Glue for a running tangelo instance: configuration, persistence, shared
//! state, and the inbound invocation handler.
//!
//! The chat layer is an external collaborator. It constructs an
//! [`AppState`], turns each inbound message into an [`Invocation`], and
//! delivers the [`Reply`] it gets back. Nothing in this crate talks to a
//! chat SDK or opens a socket.

pub mod config;
pub mod handler;
pub mod persist;
pub mod state;

pub use config::Config;
pub use handler::{Invocation, Reply, handle};
pub use state::AppState;
