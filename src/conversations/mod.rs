//! Conversation store: conversations, folders, templates, drafts and the
//! send/edit/resend/pause lifecycle, plus the derived sidebar views.

pub mod backend;
pub mod error;
pub mod ids;
pub mod pending;
pub mod seed;
pub mod store;
pub mod types;
pub mod views;

pub use backend::{ChatBackend, HttpChatBackend};
pub use error::{StoreError, StoreResult};
pub use ids::{ConversationId, FolderId, MessageId, RequestId, TemplateId};
pub use pending::PendingRequests;
pub use seed::{StoreSeed, DEFAULT_FOLDERS};
pub use store::{error_reply, ConversationStore, PendingReply, SendOutcome};
pub use types::{Conversation, Folder, Message, Template, PREVIEW_CHARS};
pub use views::{FolderCount, SidebarView, RECENT_LIMIT};
