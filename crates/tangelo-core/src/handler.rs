//! The inbound invocation surface.
//!
//! The chat layer turns each message or interaction into one [`Invocation`]
//! and gets exactly one [`Reply`] back. Expected misuse comes back as
//! descriptive text; anything unexpected is logged and answered with a
//! generic failure, never an escaping error.

use tangelo_registry::{CommandRecord, Scope, normalize_name};
use tangelo_shell::ShellOutput;
use tangelo_template::{ExpandOptions, expand};
use tangelo_types::context::ChatContext;
use tangelo_types::error::{Result, TangeloError};
use tangelo_vfs::NodeKind;

use crate::state::AppState;

/// One structured inbound request.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// Run a named macro in the invoker's private scope or the shared
    /// public scope.
    Macro {
        scope: Scope,
        name: String,
        args: Vec<String>,
    },
    /// Disambiguation follow-up: run a specific owner's public macro.
    MacroFrom {
        owner: String,
        name: String,
        args: Vec<String>,
    },
    /// One shell command line against the invoker's filesystem.
    Shell { line: String },
    /// Place an attachment into the invoker's working directory.
    Upload { filename: String, content: Vec<u8> },
    /// Fetch a file from the invoker's filesystem as an attachment.
    Download { filename: String },
}

/// What goes back to the chat layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    File { name: String, content: Vec<u8> },
    /// The caller must ask the user to pick one option and come back with
    /// a [`Invocation::MacroFrom`].
    Choices { prompt: String, options: Vec<String> },
}

const INTERNAL_FAILURE: &str = "Something went wrong while handling that command.";

/// Handle one invocation. Total: every outcome is a reply.
pub fn handle(state: &AppState, ctx: &ChatContext, invocation: Invocation) -> Reply {
    match try_handle(state, ctx, invocation) {
        Ok(reply) => reply,
        Err(
            TangeloError::Vfs(msg)
            | TangeloError::Shell(msg)
            | TangeloError::Registry(msg)
            | TangeloError::Template(msg),
        ) => Reply::Text(msg),
        Err(other) => {
            log::error!("invocation failed for user {}: {other}", ctx.user.id);
            Reply::Text(INTERNAL_FAILURE.to_string())
        },
    }
}

fn try_handle(state: &AppState, ctx: &ChatContext, invocation: Invocation) -> Result<Reply> {
    let identity = ctx.user.id.to_string();
    match invocation {
        Invocation::Macro { scope, name, args } => {
            let name = normalize_name(&name)?;
            match scope {
                Scope::Private => {
                    let record = state
                        .commands()
                        .get(&identity, Scope::Private, &name)
                        .cloned()
                        .ok_or_else(|| {
                            TangeloError::Registry(format!(
                                "you have no private command named '{name}'"
                            ))
                        })?;
                    run_macro(state, ctx, &record, &args)
                },
                Scope::Public => {
                    let matches = state.commands().public_matches(&name);
                    match matches.as_slice() {
                        [] => Err(TangeloError::Registry(format!(
                            "no public command named '{name}'"
                        ))),
                        [only] => run_macro(state, ctx, &only.record, &args),
                        many => Ok(Reply::Choices {
                            prompt: format!(
                                "Multiple public commands are named '{name}'. Pick an owner:"
                            ),
                            options: many.iter().map(|m| m.owner.clone()).collect(),
                        }),
                    }
                },
            }
        },
        Invocation::MacroFrom { owner, name, args } => {
            let name = normalize_name(&name)?;
            let record = state
                .commands()
                .get(&owner, Scope::Public, &name)
                .cloned()
                .ok_or_else(|| {
                    TangeloError::Registry(format!(
                        "{owner} has no public command named '{name}'"
                    ))
                })?;
            run_macro(state, ctx, &record, &args)
        },
        Invocation::Shell { line } => {
            let fs = state.filesystem(&identity, &ctx.user.name);
            let mut fs = fs.lock().unwrap_or_else(|e| e.into_inner());
            Ok(match state.shell().execute(&line, &mut fs) {
                ShellOutput::Text(text) if text.is_empty() => {
                    Reply::Text("(no output)".to_string())
                },
                ShellOutput::Text(text) => Reply::Text(text),
                ShellOutput::Download { filename, content } => Reply::File {
                    name: filename,
                    content,
                },
            })
        },
        Invocation::Upload { filename, content } => {
            let bytes = content.len();
            let fs = state.filesystem(&identity, &ctx.user.name);
            let mut fs = fs.lock().unwrap_or_else(|e| e.into_inner());
            fs.add_file(&filename, content)?;
            Ok(Reply::Text(format!("Uploaded {filename} ({bytes} bytes)")))
        },
        Invocation::Download { filename } => {
            let fs = state.filesystem(&identity, &ctx.user.name);
            let fs = fs.lock().unwrap_or_else(|e| e.into_inner());
            let id = fs.resolve(&filename).ok_or_else(|| {
                TangeloError::Vfs(format!("{filename}: No such file or directory"))
            })?;
            match &fs.node(id).kind {
                NodeKind::File { content, .. } => Ok(Reply::File {
                    // The requested path's last component, so a hard link
                    // comes back under the name it was asked for.
                    name: match tangelo_vfs::basename(&filename) {
                        "" => fs.node(id).name.clone(),
                        n => n.to_string(),
                    },
                    content: content.clone(),
                }),
                NodeKind::Directory { .. } => {
                    Err(TangeloError::Vfs(format!("{filename}: Is a directory")))
                },
            }
        },
    }
}

/// Validate the argument count, then expand. Rejection happens before any
/// expansion work and names every required argument.
fn run_macro(
    state: &AppState,
    ctx: &ChatContext,
    record: &CommandRecord,
    args: &[String],
) -> Result<Reply> {
    let required = record.required_args();
    if args.len() < required.len() {
        return Err(TangeloError::Template(format!(
            "'{}' requires {} argument(s): {}",
            record.name,
            required.len(),
            required.join(", ")
        )));
    }
    let opts = ExpandOptions {
        number_range: record.random_number.map(|r| (r.min, r.max)),
        choice_options: record.random_choice.clone(),
        bank_timeout: Some(state.config().bank_timeout()),
    };
    Ok(Reply::Text(expand(
        &record.output,
        ctx,
        args,
        &opts,
        state.bank(),
    )))
}
