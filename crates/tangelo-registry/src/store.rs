//! The per-identity command store: scoped records, quotas, and duplication.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tangelo_types::error::{Result, TangeloError};

use crate::record::{
    CommandDraft, CommandRecord, CommandUpdate, normalize_name, validate_choices,
    validate_description, validate_output,
};

/// Record ceiling per (identity, scope) pair.
pub const PER_SCOPE_QUOTA: usize = 10;

/// How many public records may share one name across all identities.
pub const GLOBAL_PUBLIC_NAME_QUOTA: usize = 5;

/// Public-scope scans stop after this many matches.
pub const PUBLIC_MATCH_CAP: usize = 5;

fn registry_err(msg: impl Into<String>) -> TangeloError {
    TangeloError::Registry(msg.into())
}

/// Visibility class of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Private,
    Public,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Scope::Private => "private",
            Scope::Public => "public",
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ScopedCommands {
    #[serde(default)]
    pub private: Vec<CommandRecord>,
    #[serde(default)]
    pub public: Vec<CommandRecord>,
}

impl ScopedCommands {
    fn scope(&self, scope: Scope) -> &Vec<CommandRecord> {
        match scope {
            Scope::Private => &self.private,
            Scope::Public => &self.public,
        }
    }

    fn scope_mut(&mut self, scope: Scope) -> &mut Vec<CommandRecord> {
        match scope {
            Scope::Private => &mut self.private,
            Scope::Public => &mut self.public,
        }
    }
}

/// A public record found during a cross-identity name scan.
#[derive(Debug, Clone)]
pub struct PublicMatch {
    pub owner: String,
    pub record: CommandRecord,
}

/// Read-only export of a record for out-of-band delivery to another user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedCommand {
    pub name: String,
    pub output: String,
    pub description: String,
    pub created_at: i64,
}

/// All identities' records. Keys are identity ids; iteration order is the
/// sorted id order the public-scan rules depend on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandStore {
    identities: BTreeMap<String, ScopedCommands>,
}

impl CommandStore {
    pub fn new() -> Self {
        CommandStore::default()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Build a store from the legacy flat-list layout, where each identity
    /// mapped straight to a record list. Legacy records become private.
    pub fn from_legacy(legacy: BTreeMap<String, Vec<CommandRecord>>) -> Self {
        let identities = legacy
            .into_iter()
            .map(|(id, records)| {
                (
                    id,
                    ScopedCommands {
                        private: records,
                        public: Vec::new(),
                    },
                )
            })
            .collect();
        CommandStore { identities }
    }

    pub fn list(&self, identity: &str, scope: Scope) -> &[CommandRecord] {
        self.identities
            .get(identity)
            .map(|s| s.scope(scope).as_slice())
            .unwrap_or(&[])
    }

    pub fn get(&self, identity: &str, scope: Scope, name: &str) -> Option<&CommandRecord> {
        self.list(identity, scope).iter().find(|r| r.name == name)
    }

    /// True if the identity holds `name` in either scope.
    fn name_taken(&self, identity: &str, name: &str) -> bool {
        self.get(identity, Scope::Private, name).is_some()
            || self.get(identity, Scope::Public, name).is_some()
    }

    /// Total public records named `name` across all identities.
    pub fn global_public_count(&self, name: &str) -> usize {
        self.identities
            .values()
            .filter(|s| s.public.iter().any(|r| r.name == name))
            .count()
    }

    /// Create a new record. Names are unique per identity across both
    /// scopes; each scope holds at most [`PER_SCOPE_QUOTA`] records.
    pub fn create(&mut self, identity: &str, scope: Scope, draft: CommandDraft) -> Result<()> {
        let name = normalize_name(&draft.name)?;
        validate_output(&draft.output)?;
        validate_choices(&draft.random_choice)?;
        let description = validate_description(draft.description)?;
        if self.list(identity, scope).len() >= PER_SCOPE_QUOTA {
            log::debug!("create of '{name}' rejected: {identity} {scope} scope at quota");
            return Err(registry_err(format!(
                "you already have {PER_SCOPE_QUOTA} {scope} commands"
            )));
        }
        if self.name_taken(identity, &name) {
            return Err(registry_err(format!(
                "you already have a command named '{name}'"
            )));
        }
        let record = CommandRecord {
            name,
            output: draft.output,
            description,
            created_at: Utc::now().timestamp(),
            edited_at: None,
            random_number: draft.random_number,
            random_choice: draft.random_choice,
        };
        self.identities
            .entry(identity.to_string())
            .or_default()
            .scope_mut(scope)
            .push(record);
        Ok(())
    }

    /// Replace a record's template, description, and randomization config,
    /// stamping `edited_at`.
    pub fn edit(
        &mut self,
        identity: &str,
        scope: Scope,
        name: &str,
        update: CommandUpdate,
    ) -> Result<()> {
        validate_output(&update.output)?;
        validate_choices(&update.random_choice)?;
        let description = validate_description(update.description)?;
        let record = self
            .identities
            .get_mut(identity)
            .and_then(|s| s.scope_mut(scope).iter_mut().find(|r| r.name == name))
            .ok_or_else(|| registry_err(format!("no {scope} command named '{name}'")))?;
        record.output = update.output;
        record.description = description;
        record.random_number = update.random_number;
        record.random_choice = update.random_choice;
        record.edited_at = Some(Utc::now().timestamp());
        Ok(())
    }

    /// Delete a record. The caller must re-type the name as a confirmation
    /// token (compared lowercased and trimmed); a mismatch changes nothing.
    pub fn delete(
        &mut self,
        identity: &str,
        scope: Scope,
        name: &str,
        confirmation: &str,
    ) -> Result<()> {
        if confirmation.trim().to_lowercase() != name {
            return Err(registry_err(format!(
                "confirmation did not match '{name}'; nothing was deleted"
            )));
        }
        let records = self
            .identities
            .get_mut(identity)
            .map(|s| s.scope_mut(scope))
            .ok_or_else(|| registry_err(format!("no {scope} command named '{name}'")))?;
        let before = records.len();
        records.retain(|r| r.name != name);
        if records.len() == before {
            return Err(registry_err(format!("no {scope} command named '{name}'")));
        }
        Ok(())
    }

    /// Duplicate one of the identity's private records into its public
    /// scope. Subject to the public quota and the global per-name budget.
    pub fn publish(&mut self, identity: &str, name: &str) -> Result<()> {
        let record = self
            .get(identity, Scope::Private, name)
            .cloned()
            .ok_or_else(|| registry_err(format!("no private command named '{name}'")))?;
        if self.list(identity, Scope::Public).len() >= PER_SCOPE_QUOTA {
            return Err(registry_err(format!(
                "your public scope already holds {PER_SCOPE_QUOTA} commands"
            )));
        }
        if self.get(identity, Scope::Public, name).is_some() {
            return Err(registry_err(format!(
                "you already have a public command named '{name}'"
            )));
        }
        if self.global_public_count(name) >= GLOBAL_PUBLIC_NAME_QUOTA {
            log::debug!("publish of '{name}' by {identity} rejected: global name cap reached");
            return Err(registry_err(format!(
                "'{name}' already has {GLOBAL_PUBLIC_NAME_QUOTA} public copies"
            )));
        }
        self.identities
            .entry(identity.to_string())
            .or_default()
            .public
            .push(record);
        Ok(())
    }

    /// Scan all identities' public scopes for `name`, in sorted identity
    /// order, stopping after [`PUBLIC_MATCH_CAP`] matches.
    pub fn public_matches(&self, name: &str) -> Vec<PublicMatch> {
        let mut matches = Vec::new();
        for (owner, scoped) in &self.identities {
            if let Some(record) = scoped.public.iter().find(|r| r.name == name) {
                matches.push(PublicMatch {
                    owner: owner.clone(),
                    record: record.clone(),
                });
                if matches.len() == PUBLIC_MATCH_CAP {
                    break;
                }
            }
        }
        matches
    }

    /// Duplicate a specific identity's public record into the target's
    /// private scope.
    pub fn save_from_public(&mut self, target: &str, owner: &str, name: &str) -> Result<()> {
        let record = self
            .get(owner, Scope::Public, name)
            .cloned()
            .ok_or_else(|| {
                registry_err(format!("{owner} has no public command named '{name}'"))
            })?;
        if self.list(target, Scope::Private).len() >= PER_SCOPE_QUOTA {
            return Err(registry_err(format!(
                "your private scope already holds {PER_SCOPE_QUOTA} commands"
            )));
        }
        if self.get(target, Scope::Private, name).is_some() {
            return Err(registry_err(format!(
                "you already have a private command named '{name}'"
            )));
        }
        self.identities
            .entry(target.to_string())
            .or_default()
            .private
            .push(record);
        Ok(())
    }

    /// Read-only export of a record for delivery to another user.
    pub fn share(&self, identity: &str, scope: Scope, name: &str) -> Result<SharedCommand> {
        let record = self
            .get(identity, scope, name)
            .ok_or_else(|| registry_err(format!("no {scope} command named '{name}'")))?;
        Ok(SharedCommand {
            name: record.name.clone(),
            output: record.output.clone(),
            description: record.description.clone(),
            created_at: record.created_at,
        })
    }
}
