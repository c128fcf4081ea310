//! Target adapters: emitters that turn a compiled payload into an actual
//! install against a host.
//!
//! Three independent targets exist: the editor-native config store, and two
//! external CLIs with different invocation shapes. Restrictions are
//! adapter-specific; a remote that one adapter rejects may still install
//! through another.

pub mod claude;
pub mod codex;
pub mod editor;

use crate::compiler::InstallCommandPayload;
use crate::error::Result;

/// Views of one compiled payload handed to an adapter.
pub struct InstallRequest<'a> {
    /// Placeholders intact; consumed by hosts that prompt on their own.
    pub payload: &'a InstallCommandPayload,
    /// All inputs substituted with collected values.
    pub resolved: &'a InstallCommandPayload,
    /// Inputs rendered as `<id>`; safe to print.
    pub masked: &'a InstallCommandPayload,
}

#[derive(Debug)]
pub struct InstallOutcome {
    pub success: bool,
    /// Copyable fallback command, present when the adapter could not finish.
    pub manual_command: Option<String>,
}

pub trait TargetAdapter {
    fn id(&self) -> &'static str;
    fn install(&mut self, request: &InstallRequest) -> Result<InstallOutcome>;
    /// The exact command a user could run by hand, with inputs masked.
    fn manual_command(&self, masked: &InstallCommandPayload) -> String;
}

/// Quote an argument for display in a copyable shell command.
pub(crate) fn sh_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@<>".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
