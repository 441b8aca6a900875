//! Per-conversation tracking of in-flight provider requests.
//!
//! A conversation is "thinking" while it has at least one entry here. Entries
//! are removed exactly once: either by the request settling ([`PendingRequests::finish`])
//! or by a pause ([`PendingRequests::cancel`]). Whoever removes the entry owns
//! the outcome, which is how a paused request's late result gets discarded.

use dashmap::DashMap;
use tokio::task::AbortHandle;

use super::ids::{ConversationId, RequestId};

struct InFlight {
    request_id: RequestId,
    abort: AbortHandle,
}

/// In-flight requests keyed by conversation.
#[derive(Default)]
pub struct PendingRequests {
    in_flight: DashMap<ConversationId, Vec<InFlight>>,
}

impl PendingRequests {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the spawned task of a request.
    pub fn begin(&self, conversation: ConversationId, request_id: RequestId, abort: AbortHandle) {
        self.in_flight
            .entry(conversation)
            .or_default()
            .push(InFlight { request_id, abort });
    }

    /// Remove a settled request. Returns `false` if it had been cancelled.
    pub fn finish(&self, conversation: ConversationId, request_id: RequestId) -> bool {
        let removed = match self.in_flight.get_mut(&conversation) {
            Some(mut entries) => {
                let before = entries.len();
                entries.retain(|e| e.request_id != request_id);
                entries.len() != before
            }
            None => false,
        };
        self.in_flight.remove_if(&conversation, |_, entries| entries.is_empty());
        removed
    }

    /// Cancel every request of `conversation`. Returns how many were cancelled.
    pub fn cancel(&self, conversation: ConversationId) -> usize {
        let Some((_, entries)) = self.in_flight.remove(&conversation) else {
            return 0;
        };
        for entry in &entries {
            entry.abort.abort();
        }
        entries.len()
    }

    /// Whether `conversation` has an outstanding request.
    #[must_use]
    pub fn is_pending(&self, conversation: ConversationId) -> bool {
        self.in_flight
            .get(&conversation)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Conversations with at least one outstanding request.
    #[must_use]
    pub fn conversations(&self) -> Vec<ConversationId> {
        self.in_flight
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| *entry.key())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use tokio::task::JoinHandle;

    use super::*;

    fn idle_task() -> JoinHandle<()> {
        tokio::spawn(std::future::pending::<()>())
    }

    #[tokio::test]
    async fn test_finish_clears_only_its_own_request() {
        let pending = PendingRequests::new();
        let conv = ConversationId::new();
        let (first, second) = (RequestId::new(), RequestId::new());

        pending.begin(conv, first, idle_task().abort_handle());
        pending.begin(conv, second, idle_task().abort_handle());
        assert_eq!(pending.conversations(), vec![conv]);

        assert!(pending.finish(conv, first));
        assert!(pending.is_pending(conv));
        assert!(pending.finish(conv, second));
        assert!(!pending.is_pending(conv));
        assert!(pending.conversations().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_wins_over_late_finish() {
        let pending = PendingRequests::new();
        let conv = ConversationId::new();
        let request = RequestId::new();

        pending.begin(conv, request, idle_task().abort_handle());
        assert_eq!(pending.cancel(conv), 1);
        assert!(!pending.finish(conv, request));
        assert_eq!(pending.cancel(conv), 0);
    }

    #[tokio::test]
    async fn test_conversations_are_tracked_independently() {
        let pending = PendingRequests::new();
        let (a, b) = (ConversationId::new(), ConversationId::new());

        pending.begin(a, RequestId::new(), idle_task().abort_handle());
        pending.begin(b, RequestId::new(), idle_task().abort_handle());
        pending.cancel(a);

        assert!(!pending.is_pending(a));
        assert!(pending.is_pending(b));
        assert_eq!(pending.conversations(), vec![b]);
    }

    #[tokio::test]
    async fn test_cancel_aborts_registered_task() {
        let pending = PendingRequests::new();
        let conv = ConversationId::new();

        let handle = idle_task();
        pending.begin(conv, RequestId::new(), handle.abort_handle());

        pending.cancel(conv);
        let joined = handle.await;
        assert!(joined.is_err_and(|e| e.is_cancelled()));
    }
}
