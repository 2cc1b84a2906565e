//! Confirmation gate for destructive operations
//!
//! Every delete in the teardown path passes through a gate. The interactive
//! implementation requires typing the literal confirmation phrase, not a
//! y/n, so a stray keystroke cannot destroy a resource. Tests and `--yes`
//! runs inject a preset answer instead.

use std::io::Write;

/// The exact phrase an operator must type to confirm a delete.
pub const CONFIRM_PHRASE: &str = "delete";

/// Yes/no decision point invoked before every irreversible delete.
pub trait ConfirmationGate: Send + Sync {
    /// `action` describes the operation ("delete"), `target` the resource
    /// ("binding 'agent-1'"). Returns whether to proceed.
    fn confirm(&self, action: &str, target: &str) -> bool;
}

/// Interactive gate reading from stdin.
pub struct InteractiveGate;

impl InteractiveGate {
    /// Exact literal match against the confirmation phrase. Whitespace is
    /// trimmed; nothing else ("y", "yes", "DELETE") is accepted.
    pub fn phrase_matches(input: &str) -> bool {
        input.trim() == CONFIRM_PHRASE
    }
}

impl ConfirmationGate for InteractiveGate {
    fn confirm(&self, action: &str, target: &str) -> bool {
        print!(
            "About to {action} {target}. Type '{CONFIRM_PHRASE}' to confirm: "
        );
        let _ = std::io::stdout().flush();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err() {
            return false;
        }
        Self::phrase_matches(&input)
    }
}

/// Gate with a fixed answer, for `--yes` runs and tests.
pub struct PresetGate(pub bool);

impl ConfirmationGate for PresetGate {
    fn confirm(&self, action: &str, target: &str) -> bool {
        tracing::debug!(action, target, answer = self.0, "preset confirmation");
        self.0
    }
}
