//! Placeholder-substitution engine for macro templates.
//!
//! A template passes through five substitution families in a fixed order:
//! identity `[x]`, server `{x}`, dynamic `<x>`, arguments `{[<name>]}`, and
//! external bank data `ob_*`. The order is part of the contract: a value
//! inserted by an earlier family that contains a later family's syntax is
//! substituted again (see [`expand`]).

mod engine;
mod provider;

pub use engine::{ExpandOptions, expand, required_args};
pub use provider::{
    BankProvider, DEFAULT_BANK_TIMEOUT, NoBank, RECOGNIZED_REQUESTS, StaticBank,
    is_recognized_request,
};
