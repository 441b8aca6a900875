//! Derived sidebar views.
//!
//! Views are recomputed from a full scan on every call. Nothing is indexed.

use serde::Serialize;

use super::types::{Conversation, Folder};

/// Maximum number of entries in the recent list.
pub const RECENT_LIMIT: usize = 10;

/// Conversation tally of one folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FolderCount {
    /// Folder name.
    pub name: String,
    /// Conversations filed under it.
    pub count: usize,
}

/// Everything the sidebar renders.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SidebarView {
    /// Pinned conversations matching the query, newest first.
    pub pinned: Vec<Conversation>,
    /// Unpinned conversations matching the query, newest first, capped.
    pub recent: Vec<Conversation>,
    /// Per-folder tally over all conversations, in folder order.
    pub folder_counts: Vec<FolderCount>,
}

/// Conversations whose title or preview contains `query`, case-insensitively.
///
/// A blank query matches everything. Otherwise the query is matched as typed,
/// surrounding whitespace included.
pub fn filter<'a>(conversations: &'a [Conversation], query: &str) -> Vec<&'a Conversation> {
    if query.trim().is_empty() {
        return conversations.iter().collect();
    }
    let needle = query.to_lowercase();
    conversations.iter().filter(|c| c.matches(&needle)).collect()
}

fn newest_first(list: &mut [&Conversation]) {
    list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Pinned entries of `candidates`, most recently updated first.
#[must_use]
pub fn pinned(candidates: &[&Conversation]) -> Vec<Conversation> {
    let mut list: Vec<&Conversation> = candidates.iter().copied().filter(|c| c.pinned).collect();
    newest_first(&mut list);
    list.into_iter().cloned().collect()
}

/// Unpinned entries of `candidates`, most recently updated first, at most [`RECENT_LIMIT`].
#[must_use]
pub fn recent(candidates: &[&Conversation]) -> Vec<Conversation> {
    let mut list: Vec<&Conversation> = candidates.iter().copied().filter(|c| !c.pinned).collect();
    newest_first(&mut list);
    list.into_iter().take(RECENT_LIMIT).cloned().collect()
}

/// Tally conversations per known folder. Unknown folder names are not counted.
#[must_use]
pub fn folder_counts(folders: &[Folder], conversations: &[Conversation]) -> Vec<FolderCount> {
    folders
        .iter()
        .map(|folder| FolderCount {
            name: folder.name.clone(),
            count: conversations.iter().filter(|c| c.folder == folder.name).count(),
        })
        .collect()
}

/// Build the complete sidebar for `query`.
#[must_use]
pub fn sidebar(conversations: &[Conversation], folders: &[Folder], query: &str) -> SidebarView {
    let matching = filter(conversations, query);
    SidebarView {
        pinned: pinned(&matching),
        recent: recent(&matching),
        folder_counts: folder_counts(folders, conversations),
    }
}
