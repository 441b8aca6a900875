//! Initial store contents.

use crate::router::DEFAULT_MODEL;

use super::types::{Conversation, Folder, Template};

/// Folders every store starts with.
pub const DEFAULT_FOLDERS: [&str; 3] = ["Work Projects", "Personal", "Code Reviews"];

/// Data a [`ConversationStore`](super::ConversationStore) is created from.
#[derive(Clone, Debug)]
pub struct StoreSeed {
    /// Pre-populated conversations, front first.
    pub conversations: Vec<Conversation>,
    /// Known folders, in display order.
    pub folders: Vec<Folder>,
    /// Reusable templates.
    pub templates: Vec<Template>,
    /// Initially selected logical model.
    pub model: String,
}

impl Default for StoreSeed {
    fn default() -> Self {
        Self {
            conversations: Vec::new(),
            folders: DEFAULT_FOLDERS.into_iter().map(Folder::new).collect(),
            templates: vec![
                Template::new(
                    "Bug Report",
                    "I found a bug:\n\nSteps to reproduce:\n1. \n\nExpected:\n\nActual:\n",
                ),
                Template::new(
                    "Code Review",
                    "Please review this code for correctness, readability and performance:\n\n",
                ),
                Template::new("Summarize", "Summarize the following text in three bullet points:\n\n"),
                Template::new("Explain", "Explain this concept as if I were new to the field:\n\n"),
            ],
            model: DEFAULT_MODEL.to_string(),
        }
    }
}
