//! Macro command records and the per-identity private/public store.

mod record;
mod store;

pub use record::{
    CommandDraft, CommandRecord, CommandUpdate, DEFAULT_DESCRIPTION, MAX_DESCRIPTION_LEN,
    MAX_OUTPUT_LEN, NumberRange, normalize_name, parse_choice_options,
};
pub use store::{
    CommandStore, GLOBAL_PUBLIC_NAME_QUOTA, PER_SCOPE_QUOTA, PUBLIC_MATCH_CAP, PublicMatch,
    Scope, SharedCommand,
};
