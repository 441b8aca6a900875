//! The conversation store and its send lifecycle.
//!
//! A send appends the user message under the write lock, spawns a task that
//! calls the backend with the full history, and registers that task in
//! [`PendingRequests`] before the lock is released. The task settles by taking the write lock again and appending
//! the reply (or a synthesized error message) only if its pending entry is still
//! there. [`ConversationStore::pause`] removes entries under the same lock, so a
//! paused request can never append afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::llm::Role;
use crate::router::{RouteOutcome, RouterError, RouterResult};

use super::backend::ChatBackend;
use super::error::{StoreError, StoreResult};
use super::ids::{ConversationId, MessageId, RequestId, TemplateId};
use super::pending::PendingRequests;
use super::seed::StoreSeed;
use super::types::{Conversation, Folder, Message, Template};
use super::views::{self, SidebarView};

/// Assistant message appended when a request fails.
#[must_use]
pub fn error_reply(err: &RouterError) -> String {
    format!("Sorry, I encountered an error: {err}. Please try again.")
}

/// How a dispatched request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant reply was appended.
    Replied(MessageId),
    /// The request failed and an error message was appended.
    Failed(MessageId),
    /// The request was paused; nothing was appended.
    Discarded,
}

/// Handle on a request spawned by [`ConversationStore::send`].
#[derive(Debug)]
pub struct PendingReply {
    /// Conversation the request belongs to.
    pub conversation_id: ConversationId,
    /// Request identifier.
    pub request_id: RequestId,
    /// Id of the user message that triggered the request.
    pub user_message_id: MessageId,
    handle: JoinHandle<SendOutcome>,
}

impl PendingReply {
    /// Wait for the request to settle.
    pub async fn settled(self) -> SendOutcome {
        self.handle.await.unwrap_or(SendOutcome::Discarded)
    }
}

#[derive(Default)]
struct StoreState {
    conversations: Vec<Conversation>,
    selected: Option<ConversationId>,
    folders: Vec<Folder>,
    templates: Vec<Template>,
    drafts: HashMap<ConversationId, String>,
    model: String,
}

impl StoreState {
    fn conversation(&self, id: ConversationId) -> StoreResult<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.id == id)
            .ok_or(StoreError::ConversationNotFound(id))
    }

    fn conversation_mut(&mut self, id: ConversationId) -> StoreResult<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::ConversationNotFound(id))
    }

    fn template(&self, id: TemplateId) -> StoreResult<&Template> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or(StoreError::TemplateNotFound(id))
    }

    fn has_folder(&self, name: &str) -> bool {
        self.folders.iter().any(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// In-memory collection of conversations.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct ConversationStore {
    inner: Arc<RwLock<StoreState>>,
    pending: Arc<PendingRequests>,
    backend: Arc<dyn ChatBackend>,
}

impl ConversationStore {
    /// Create a store over `backend`, pre-populated from `seed`.
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>, seed: StoreSeed) -> Self {
        let state = StoreState {
            conversations: seed.conversations,
            folders: seed.folders,
            templates: seed.templates,
            model: seed.model,
            ..StoreState::default()
        };
        Self {
            inner: Arc::new(RwLock::new(state)),
            pending: Arc::new(PendingRequests::new()),
            backend,
        }
    }

    // ------------------------------------------------------------------
    // Conversations and selection
    // ------------------------------------------------------------------

    /// Create an empty conversation at the front of the list and select it.
    pub async fn create_conversation(&self) -> ConversationId {
        let conversation = Conversation::new_chat();
        let id = conversation.id;
        let mut state = self.inner.write().await;
        state.conversations.insert(0, conversation);
        state.selected = Some(id);
        debug!(conversation = %id, "Created conversation");
        id
    }

    /// Start a fresh conversation if nothing is selected yet.
    ///
    /// Returns the selected conversation afterwards.
    pub async fn ensure_selection(&self) -> ConversationId {
        if let Some(id) = self.inner.read().await.selected {
            return id;
        }
        self.create_conversation().await
    }

    /// Select `id`, replacing any previous selection.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` for an unknown id.
    pub async fn select(&self, id: ConversationId) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state.conversation(id)?;
        state.selected = Some(id);
        Ok(())
    }

    /// Deselect whatever is selected.
    pub async fn clear_selection(&self) {
        self.inner.write().await.selected = None;
    }

    /// Currently selected conversation, if any.
    pub async fn selected(&self) -> Option<Conversation> {
        let state = self.inner.read().await;
        let id = state.selected?;
        state.conversation(id).ok().cloned()
    }

    /// Snapshot of one conversation.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` for an unknown id.
    pub async fn conversation(&self, id: ConversationId) -> StoreResult<Conversation> {
        self.inner.read().await.conversation(id).cloned()
    }

    /// Snapshot of every conversation, in list order.
    pub async fn conversations(&self) -> Vec<Conversation> {
        self.inner.read().await.conversations.clone()
    }

    /// Flip the pinned flag. Returns the new value.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` for an unknown id.
    pub async fn toggle_pin(&self, id: ConversationId) -> StoreResult<bool> {
        let mut state = self.inner.write().await;
        let conversation = state.conversation_mut(id)?;
        conversation.pinned = !conversation.pinned;
        Ok(conversation.pinned)
    }

    /// Change a conversation's title.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` for an unknown id.
    pub async fn rename(&self, id: ConversationId, title: impl Into<String>) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state.conversation_mut(id)?.title = title.into();
        Ok(())
    }

    /// File a conversation under an existing folder.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` or `FolderNotFound`.
    pub async fn move_to_folder(&self, id: ConversationId, folder: &str) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        let Some(name) = state
            .folders
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(folder))
            .map(|f| f.name.clone())
        else {
            return Err(StoreError::FolderNotFound(folder.to_string()));
        };
        state.conversation_mut(id)?.folder = name;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Folders and templates
    // ------------------------------------------------------------------

    /// Add a folder.
    ///
    /// # Errors
    /// Returns `EmptyFolderName` for a blank name and `FolderExists` when the
    /// name matches an existing folder case-insensitively.
    pub async fn create_folder(&self, name: &str) -> StoreResult<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyFolderName);
        }
        let mut state = self.inner.write().await;
        if state.has_folder(name) {
            return Err(StoreError::FolderExists(name.to_string()));
        }
        let folder = Folder::new(name);
        state.folders.push(folder.clone());
        Ok(folder)
    }

    /// Known folders, in display order.
    pub async fn folders(&self) -> Vec<Folder> {
        self.inner.read().await.folders.clone()
    }

    /// Add a template.
    pub async fn add_template(
        &self,
        label: impl Into<String>,
        content: impl Into<String>,
    ) -> Template {
        let template = Template::new(label, content);
        self.inner.write().await.templates.push(template.clone());
        template
    }

    /// Replace a template's label and content.
    ///
    /// # Errors
    /// Returns `TemplateNotFound` for an unknown id.
    pub async fn update_template(
        &self,
        id: TemplateId,
        label: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        let template = state
            .templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::TemplateNotFound(id))?;
        template.label = label.into();
        template.content = content.into();
        Ok(())
    }

    /// Delete a template.
    ///
    /// # Errors
    /// Returns `TemplateNotFound` for an unknown id.
    pub async fn remove_template(&self, id: TemplateId) -> StoreResult<Template> {
        let mut state = self.inner.write().await;
        let index = state
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::TemplateNotFound(id))?;
        Ok(state.templates.remove(index))
    }

    /// Known templates.
    pub async fn templates(&self) -> Vec<Template> {
        self.inner.read().await.templates.clone()
    }

    // ------------------------------------------------------------------
    // Drafts
    // ------------------------------------------------------------------

    /// Replace the in-progress composition of a conversation.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` for an unknown id.
    pub async fn compose(&self, id: ConversationId, text: impl Into<String>) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state.conversation(id)?;
        state.drafts.insert(id, text.into());
        Ok(())
    }

    /// Current draft of a conversation (empty if none).
    pub async fn draft(&self, id: ConversationId) -> String {
        self.inner.read().await.drafts.get(&id).cloned().unwrap_or_default()
    }

    /// Append a template's content verbatim to the draft.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` or `TemplateNotFound`.
    pub async fn insert_template(&self, id: ConversationId, template: TemplateId) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        state.conversation(id)?;
        let content = state.template(template)?.content.clone();
        state.drafts.entry(id).or_default().push_str(&content);
        Ok(())
    }

    /// Send the current draft. The draft is cleared only if a send was dispatched.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` for an unknown id.
    pub async fn send_draft(&self, id: ConversationId) -> StoreResult<Option<PendingReply>> {
        let draft = self.draft(id).await;
        let reply = self.send(id, &draft).await?;
        if reply.is_some() {
            self.inner.write().await.drafts.remove(&id);
        }
        Ok(reply)
    }

    // ------------------------------------------------------------------
    // Model selection
    // ------------------------------------------------------------------

    /// Change the globally selected logical model used by subsequent sends.
    pub async fn set_model(&self, model: impl Into<String>) {
        let model = model.into();
        info!(model = %model, "Selected model changed");
        self.inner.write().await.model = model;
    }

    /// Globally selected logical model.
    pub async fn model(&self) -> String {
        self.inner.read().await.model.clone()
    }

    // ------------------------------------------------------------------
    // Send lifecycle
    // ------------------------------------------------------------------

    /// Append a user message and dispatch the conversation to the backend.
    ///
    /// Blank content is a no-op and returns `Ok(None)`.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` for an unknown id.
    pub async fn send(&self, id: ConversationId, content: &str) -> StoreResult<Option<PendingReply>> {
        if content.trim().is_empty() {
            debug!(conversation = %id, "Ignoring blank message");
            return Ok(None);
        }

        let request_id = RequestId::new();
        let mut state = self.inner.write().await;
        let model = state.model.clone();
        let conversation = state.conversation_mut(id)?;
        let user_message_id = conversation.push(Message::new(Role::User, content));
        let history = conversation.history();
        debug!(conversation = %id, request = %request_id, model = %model, "Dispatching message");

        // The task cannot settle before the lock is released, so the entry is
        // registered with its abort handle before anything can finish or cancel it.
        let store = self.clone();
        let handle = tokio::spawn(async move {
            let result = store.backend.chat(history, &model).await;
            store.settle(id, request_id, result).await
        });
        self.pending.begin(id, request_id, handle.abort_handle());
        drop(state);

        Ok(Some(PendingReply {
            conversation_id: id,
            request_id,
            user_message_id,
            handle,
        }))
    }

    async fn settle(
        &self,
        id: ConversationId,
        request_id: RequestId,
        result: RouterResult<RouteOutcome>,
    ) -> SendOutcome {
        let mut state = self.inner.write().await;
        if !self.pending.finish(id, request_id) {
            debug!(conversation = %id, request = %request_id, "Discarding paused reply");
            return SendOutcome::Discarded;
        }

        let (message, failed) = match result {
            Ok(outcome) => (Message::new(Role::Assistant, outcome.text), false),
            Err(err) => {
                warn!(conversation = %id, "Request failed: {err}");
                (Message::new(Role::Assistant, error_reply(&err)), true)
            }
        };

        let Ok(conversation) = state.conversation_mut(id) else {
            return SendOutcome::Discarded;
        };
        let message_id = conversation.push(message);
        debug!(conversation = %id, request = %request_id, failed, "Reply appended");
        if failed {
            SendOutcome::Failed(message_id)
        } else {
            SendOutcome::Replied(message_id)
        }
    }

    /// Replace a message's content in place.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` or `MessageNotFound`.
    pub async fn edit(
        &self,
        id: ConversationId,
        message: MessageId,
        content: impl Into<String>,
    ) -> StoreResult<()> {
        let mut state = self.inner.write().await;
        if state.conversation_mut(id)?.edit(message, content) {
            Ok(())
        } else {
            Err(StoreError::MessageNotFound {
                conversation: id,
                message,
            })
        }
    }

    /// Send an existing message's content again as a new user message.
    ///
    /// # Errors
    /// Returns `ConversationNotFound` or `MessageNotFound`.
    pub async fn resend(
        &self,
        id: ConversationId,
        message: MessageId,
    ) -> StoreResult<Option<PendingReply>> {
        let content = {
            let state = self.inner.read().await;
            state
                .conversation(id)?
                .message(message)
                .map(|m| m.content.clone())
                .ok_or(StoreError::MessageNotFound {
                    conversation: id,
                    message,
                })?
        };
        self.send(id, &content).await
    }

    /// Cancel every in-flight request of a conversation and discard their results.
    ///
    /// Returns how many requests were cancelled.
    pub async fn pause(&self, id: ConversationId) -> usize {
        let _state = self.inner.write().await;
        let cancelled = self.pending.cancel(id);
        if cancelled > 0 {
            info!(conversation = %id, cancelled, "Paused conversation");
        }
        cancelled
    }

    /// Whether a conversation is awaiting a reply.
    #[must_use]
    pub fn is_thinking(&self, id: ConversationId) -> bool {
        self.pending.is_pending(id)
    }

    /// Conversations awaiting a reply.
    #[must_use]
    pub fn thinking_conversations(&self) -> Vec<ConversationId> {
        self.pending.conversations()
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Pinned, recent and folder-count views for `query`.
    pub async fn sidebar(&self, query: &str) -> SidebarView {
        let state = self.inner.read().await;
        views::sidebar(&state.conversations, &state.folders, query)
    }

    /// Conversations matching `query` over title and preview.
    pub async fn search(&self, query: &str) -> Vec<Conversation> {
        let state = self.inner.read().await;
        views::filter(&state.conversations, query)
            .into_iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::config::UnknownModelPolicy;
    use crate::llm::ChatMessage;
    use crate::router::testing::fixture;

    /// Backend that blocks until released, then echoes the last message.
    #[derive(Default)]
    struct GatedBackend {
        gate: Notify,
        calls: Mutex<Vec<(Vec<ChatMessage>, String)>>,
    }

    impl GatedBackend {
        fn calls(&self) -> Vec<(Vec<ChatMessage>, String)> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl ChatBackend for GatedBackend {
        async fn chat(&self, messages: Vec<ChatMessage>, model: &str) -> RouterResult<RouteOutcome> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((messages.clone(), model.to_string()));
            }
            self.gate.notified().await;
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(RouteOutcome {
                text: format!("echo: {last}"),
                resolved_model: model.to_string(),
            })
        }
    }

    fn router_store(policy: UnknownModelPolicy) -> ConversationStore {
        let (router, _) = fixture(policy);
        ConversationStore::new(Arc::new(router), StoreSeed::default())
    }

    fn gated_store() -> (ConversationStore, Arc<GatedBackend>) {
        let backend = Arc::new(GatedBackend::default());
        let store = ConversationStore::new(backend.clone(), StoreSeed::default());
        (store, backend)
    }

    async fn settle(reply: StoreResult<Option<PendingReply>>) -> Option<SendOutcome> {
        match reply {
            Ok(Some(pending)) => Some(pending.settled().await),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_hi_gets_hello_appended() {
        let store = router_store(UnknownModelPolicy::Fallback);
        let id = store.create_conversation().await;

        let outcome = settle(store.send(id, "hi").await).await;
        assert!(matches!(outcome, Some(SendOutcome::Replied(_))));

        let conversation = store.conversation(id).await.unwrap();
        let turns: Vec<(Role, &str)> = conversation
            .messages()
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(turns, [(Role::User, "hi"), (Role::Assistant, "Hello!")]);
        assert_eq!(conversation.message_count(), 2);
        assert_eq!(conversation.preview(), "Hello!");
        assert!(!store.is_thinking(id));
    }

    #[tokio::test]
    async fn test_blank_send_is_a_no_op() {
        let (store, backend) = gated_store();
        let id = store.create_conversation().await;

        for blank in ["", "   ", "\n\t"] {
            assert!(store.send(id, blank).await.unwrap().is_none());
        }

        assert_eq!(store.conversation(id).await.unwrap().message_count(), 0);
        assert!(backend.calls().is_empty());
        assert!(!store.is_thinking(id));
    }

    #[tokio::test]
    async fn test_send_to_unknown_conversation_fails() {
        let (store, _) = gated_store();
        let missing = ConversationId::new();
        let err = store.send(missing, "hi").await.err();
        assert_eq!(err, Some(StoreError::ConversationNotFound(missing)));
    }

    #[tokio::test]
    async fn test_user_message_appended_before_reply() {
        let (store, backend) = gated_store();
        let id = store.create_conversation().await;

        let pending = store.send(id, "question").await.unwrap();
        let conversation = store.conversation(id).await.unwrap();
        assert_eq!(conversation.message_count(), 1);
        assert_eq!(conversation.preview(), "question");
        assert!(store.is_thinking(id));

        backend.gate.notify_one();
        let outcome = settle(Ok(pending)).await;
        assert!(matches!(outcome, Some(SendOutcome::Replied(_))));
        assert_eq!(store.conversation(id).await.unwrap().preview(), "echo: question");
    }

    #[tokio::test]
    async fn test_backend_receives_full_history_and_selected_model() {
        let (store, backend) = gated_store();
        let id = store.create_conversation().await;
        store.set_model("grok-2").await;

        backend.gate.notify_one();
        settle(store.send(id, "first").await).await;
        backend.gate.notify_one();
        settle(store.send(id, "second").await).await;

        let calls = backend.calls();
        let (history, model) = &calls[1];
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "echo: first", "second"]);
        assert_eq!(model, "grok-2");
    }

    #[tokio::test]
    async fn test_failure_appends_error_message() {
        let store = router_store(UnknownModelPolicy::Fallback);
        let id = store.create_conversation().await;
        store.set_model("gemini-pro").await;

        let outcome = settle(store.send(id, "hello").await).await;
        assert!(matches!(outcome, Some(SendOutcome::Failed(_))));

        let conversation = store.conversation(id).await.unwrap();
        let last = conversation.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(
            last.content,
            "Sorry, I encountered an error: Gemini integration coming soon. Please use another model.. Please try again."
        );
        assert_eq!(conversation.preview(), &last.content[..80]);
        assert_eq!(conversation.message_count(), 2);
        assert!(!store.is_thinking(id));
        assert!(store.thinking_conversations().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_unknown_model_becomes_error_message() {
        let store = router_store(UnknownModelPolicy::Reject);
        let id = store.create_conversation().await;
        store.set_model("unknown-model").await;

        settle(store.send(id, "hello").await).await;
        let conversation = store.conversation(id).await.unwrap();
        assert_eq!(
            conversation.messages()[1].content,
            "Sorry, I encountered an error: Unknown model: unknown-model. Please try again."
        );
        assert!(!store.is_thinking(id));
    }

    #[tokio::test]
    async fn test_pause_right_after_send_aborts_backend_call() {
        let (store, backend) = gated_store();
        let id = store.create_conversation().await;

        let pending = store.send(id, "slow").await.unwrap().unwrap();
        assert_eq!(store.pause(id).await, 1);

        // The backend is never released: only the abort can end the task.
        let joined = pending.handle.await;
        assert!(joined.is_err_and(|e| e.is_cancelled()));
        assert!(backend.calls().len() <= 1);
        assert_eq!(store.conversation(id).await.unwrap().message_count(), 1);
    }

    #[tokio::test]
    async fn test_seeded_conversations_populate_views() {
        let trip = Conversation::seeded(
            "Trip to Lisbon",
            "Personal",
            true,
            vec![
                Message::new(Role::User, "Plan three days in Lisbon"),
                Message::new(Role::Assistant, "Day one: Alfama and the castle."),
            ],
        );
        let review = Conversation::seeded(
            "Review auth middleware",
            "Code Reviews",
            false,
            vec![Message::new(Role::User, "Check the token refresh path")],
        );
        let seed = StoreSeed {
            conversations: vec![trip.clone(), review.clone()],
            ..StoreSeed::default()
        };
        let (router, _) = fixture(UnknownModelPolicy::Fallback);
        let store = ConversationStore::new(Arc::new(router), seed);

        let ids: Vec<ConversationId> = store.conversations().await.iter().map(|c| c.id).collect();
        assert_eq!(ids, [trip.id, review.id]);
        assert_eq!(store.conversation(trip.id).await.unwrap().message_count(), 2);
        assert_eq!(
            store.conversation(trip.id).await.unwrap().preview(),
            "Day one: Alfama and the castle."
        );
        assert!(store.selected().await.is_none());

        let view = store.sidebar("").await;
        assert_eq!(view.pinned.iter().map(|c| c.id).collect::<Vec<_>>(), [trip.id]);
        assert_eq!(view.recent.iter().map(|c| c.id).collect::<Vec<_>>(), [review.id]);
        let counts: Vec<(String, usize)> = view
            .folder_counts
            .iter()
            .map(|f| (f.name.clone(), f.count))
            .collect();
        assert_eq!(
            counts,
            [
                ("Work Projects".to_string(), 0),
                ("Personal".to_string(), 1),
                ("Code Reviews".to_string(), 1)
            ]
        );

        let hits = store.search("token refresh").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, review.id);

        settle(store.send(trip.id, "and day two?").await).await;
        let contents: Vec<String> = store
            .conversation(trip.id)
            .await
            .unwrap()
            .messages()
            .iter()
            .map(|m| m.content.clone())
            .collect();
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[3], "Hello!");
    }

    #[tokio::test]
    async fn test_pause_cancels_and_discards() {
        let (store, backend) = gated_store();
        let id = store.create_conversation().await;

        let pending = store.send(id, "slow").await.unwrap();
        assert_eq!(store.pause(id).await, 1);
        assert!(!store.is_thinking(id));

        backend.gate.notify_one();
        assert_eq!(settle(Ok(pending)).await, Some(SendOutcome::Discarded));

        let conversation = store.conversation(id).await.unwrap();
        assert_eq!(conversation.message_count(), 1);
        assert_eq!(conversation.preview(), "slow");
    }

    #[tokio::test]
    async fn test_pause_without_pending_request() {
        let (store, _) = gated_store();
        let id = store.create_conversation().await;
        assert_eq!(store.pause(id).await, 0);
    }

    #[tokio::test]
    async fn test_pending_state_is_per_conversation() {
        let (store, backend) = gated_store();
        let a = store.create_conversation().await;
        let b = store.create_conversation().await;

        let pending_a = store.send(a, "to a").await.unwrap();
        let pending_b = store.send(b, "to b").await.unwrap();
        assert!(store.is_thinking(a) && store.is_thinking(b));

        store.pause(a).await;
        assert!(!store.is_thinking(a));
        assert_eq!(store.thinking_conversations(), vec![b]);

        backend.gate.notify_one();
        assert_eq!(settle(Ok(pending_a)).await, Some(SendOutcome::Discarded));
        assert!(matches!(settle(Ok(pending_b)).await, Some(SendOutcome::Replied(_))));

        assert_eq!(store.conversation(a).await.unwrap().message_count(), 1);
        assert_eq!(store.conversation(b).await.unwrap().message_count(), 2);
        assert!(store.thinking_conversations().is_empty());
    }

    #[tokio::test]
    async fn test_edit_and_resend() {
        let store = router_store(UnknownModelPolicy::Fallback);
        let id = store.create_conversation().await;
        let pending = store.send(id, "original").await.unwrap().unwrap();
        let user_message = pending.user_message_id;
        pending.settled().await;

        store.edit(id, user_message, "rewritten").await.unwrap();
        let conversation = store.conversation(id).await.unwrap();
        let edited = conversation.message(user_message).unwrap();
        assert_eq!(edited.content, "rewritten");
        assert!(edited.edited_at.is_some());
        assert_eq!(conversation.preview(), "Hello!");

        settle(store.resend(id, user_message).await).await;
        let conversation = store.conversation(id).await.unwrap();
        assert_eq!(conversation.message_count(), 4);
        assert_eq!(conversation.messages()[0].content, "rewritten");
        assert_eq!(conversation.messages()[2].content, "rewritten");
        assert_eq!(conversation.messages()[2].role, Role::User);

        let missing = MessageId::new();
        assert!(matches!(
            store.edit(id, missing, "x").await,
            Err(StoreError::MessageNotFound { .. })
        ));
        assert!(store.resend(id, missing).await.is_err());
    }

    #[tokio::test]
    async fn test_create_conversation_goes_first_and_is_selected() {
        let (store, _) = gated_store();
        let first = store.create_conversation().await;
        let second = store.create_conversation().await;

        let ids: Vec<ConversationId> = store.conversations().await.iter().map(|c| c.id).collect();
        assert_eq!(ids, [second, first]);
        assert_eq!(store.selected().await.map(|c| c.id), Some(second));

        store.select(first).await.unwrap();
        assert_eq!(store.selected().await.map(|c| c.id), Some(first));
        store.clear_selection().await;
        assert!(store.selected().await.is_none());
        assert!(store.select(ConversationId::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_selection_creates_once() {
        let (store, _) = gated_store();
        let id = store.ensure_selection().await;
        assert_eq!(store.ensure_selection().await, id);
        assert_eq!(store.conversations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_folders_reject_blank_and_duplicates() {
        let (store, _) = gated_store();
        assert_eq!(store.create_folder("  ").await, Err(StoreError::EmptyFolderName));
        assert!(matches!(
            store.create_folder("personal").await,
            Err(StoreError::FolderExists(_))
        ));

        store.create_folder(" Research ").await.unwrap();
        let names: Vec<String> = store.folders().await.into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["Work Projects", "Personal", "Code Reviews", "Research"]);
    }

    #[tokio::test]
    async fn test_pin_rename_and_move_update_sidebar() {
        let (store, _) = gated_store();
        let id = store.create_conversation().await;

        assert!(store.toggle_pin(id).await.unwrap());
        store.rename(id, "Launch plan").await.unwrap();
        store.move_to_folder(id, "code reviews").await.unwrap();

        let view = store.sidebar("launch").await;
        assert_eq!(view.pinned.len(), 1);
        assert!(view.recent.is_empty());
        assert_eq!(view.pinned[0].folder, "Code Reviews");
        let counts: Vec<usize> = view.folder_counts.iter().map(|f| f.count).collect();
        assert_eq!(counts, [0, 0, 1]);

        assert!(matches!(
            store.move_to_folder(id, "Nowhere").await,
            Err(StoreError::FolderNotFound(_))
        ));
        assert!(!store.toggle_pin(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_templates_and_drafts() {
        let (store, backend) = gated_store();
        let id = store.create_conversation().await;
        let template = store.add_template("Greeting", "Hello there").await;

        store.compose(id, "Note: ").await.unwrap();
        store.insert_template(id, template.id).await.unwrap();
        assert_eq!(store.draft(id).await, "Note: Hello there");

        store.update_template(template.id, "Hi", "Hi!").await.unwrap();
        assert!(store.templates().await.iter().any(|t| t.label == "Hi"));

        backend.gate.notify_one();
        settle(store.send_draft(id).await).await;
        assert_eq!(store.draft(id).await, "");
        assert_eq!(store.conversation(id).await.unwrap().messages()[0].content, "Note: Hello there");

        store.compose(id, "   ").await.unwrap();
        assert!(store.send_draft(id).await.unwrap().is_none());
        assert_eq!(store.draft(id).await, "   ");

        store.remove_template(template.id).await.unwrap();
        assert_eq!(
            store.insert_template(id, template.id).await,
            Err(StoreError::TemplateNotFound(template.id))
        );
    }

    #[tokio::test]
    async fn test_search_matches_preview() {
        let store = router_store(UnknownModelPolicy::Fallback);
        let id = store.create_conversation().await;
        store.create_conversation().await;
        settle(store.send(id, "plan a trip").await).await;

        let hits = store.search("HELLO!").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
        assert_eq!(store.search("").await.len(), 2);
    }
}
