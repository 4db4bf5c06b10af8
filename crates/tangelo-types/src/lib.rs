//! Foundation types for tangelo.
//!
//! This crate contains the types shared by all tangelo crates: the error
//! enum, the chat-platform context structs handed in by the host, and a few
//! shared constants.

pub mod context;
pub mod error;

pub use context::{ChannelInfo, ChatContext, MemberInfo, Presence, ServerInfo, UserProfile};
pub use error::{Result, TangeloError};
