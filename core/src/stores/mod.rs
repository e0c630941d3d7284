//! View-state holders the UI binds to.
//!
//! Each store owns its state behind a `parking_lot` lock and never holds the
//! lock across an await. Readers take a cloned snapshot.

pub mod appointments;
pub mod categories;
pub mod profile_actions;

use async_trait::async_trait;

pub use appointments::{AppointmentsSnapshot, AppointmentsStore};
pub use categories::CategoriesStore;
pub use profile_actions::ProfileActions;

/// Text of a dialog shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub header: String,
    pub message: String,
}

impl Prompt {
    pub fn new(header: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            message: message.into(),
        }
    }
}

/// Dialogs provided by the host UI.
#[async_trait]
pub trait Prompter: Send + Sync + 'static {
    /// Ask a yes/no question; `true` means the user accepted.
    async fn confirm(&self, prompt: &Prompt) -> bool;

    /// Show a result message and wait for it to be dismissed.
    async fn notify(&self, prompt: &Prompt);
}

/// Result of a confirm/cancel action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The user said no; nothing was sent.
    Declined,
    Applied,
    Failed(String),
}
