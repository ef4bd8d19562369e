use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::config;
use crate::models::{Conversation, Message, MessageStatus};

/// Partial update applied to a message in place. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub status: Option<MessageStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub reasoning: Option<Vec<String>>,
}

#[derive(Debug, Default)]
struct StoreState {
    conversations: Vec<Conversation>,
    selected_id: Option<String>,
    search_term: String,
    streaming_message_id: Option<String>,
}

/// Single source of truth for conversations and messages.
///
/// Cloning the store clones the handle, not the state: every clone sees and
/// mutates the same conversation list. Each operation runs to completion
/// under one lock acquisition, so readers never observe a half-applied
/// write. Mutations against unknown ids are silent no-ops, signalled only
/// by the return value.
#[derive(Clone, Default)]
pub struct ChatStore {
    state: Arc<Mutex<StoreState>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the given conversations, most recent activity
    /// first.
    pub fn with_conversations(conversations: Vec<Conversation>) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            state.conversations = conversations;
            sort_by_activity(&mut state.conversations);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    // --- Mutations ---

    /// Point the UI at a conversation. The id is not validated; selecting
    /// an unknown id simply yields no active conversation.
    pub fn select_conversation(&self, conversation_id: &str) {
        self.lock().selected_id = Some(conversation_id.to_string());
    }

    /// Create an empty conversation at the head of the list, select it,
    /// and return a snapshot of it.
    pub fn start_new_conversation(&self) -> Conversation {
        let conversation = Conversation::new();
        let mut state = self.lock();
        state.selected_id = Some(conversation.id.clone());
        state.conversations.insert(0, conversation.clone());
        conversation
    }

    /// Replace a conversation's title. Returns `false` when the id is
    /// unknown. Empty-title and unchanged-title guards belong to the
    /// caller.
    pub fn update_conversation_title(&self, conversation_id: &str, title: &str) -> bool {
        let mut state = self.lock();
        match state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            Some(conversation) => {
                conversation.title = title.to_string();
                true
            }
            None => {
                tracing::debug!("rename skipped, unknown conversation {}", conversation_id);
                false
            }
        }
    }

    /// Append a message to a conversation, refresh its preview and
    /// activity stamp, re-sort the list, and select the conversation.
    /// Returns a snapshot of the updated conversation, or `None` when the
    /// conversation does not exist.
    pub fn append_message(
        &self,
        conversation_id: &str,
        message: Message,
    ) -> Option<Conversation> {
        let mut state = self.lock();
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)?;

        if !message.content.is_empty() {
            conversation.preview = message.content.clone();
        }
        conversation.last_activity_at = message.created_at;
        tracing::debug!(
            "appended {} message to conversation {}",
            message.role.as_str(),
            conversation_id
        );
        conversation.messages.push(message);

        sort_by_activity(&mut state.conversations);
        state.selected_id = Some(conversation_id.to_string());

        state
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
    }

    /// Merge a patch onto one message, then recompute the conversation's
    /// preview and activity stamp and re-sort the list. Returns a snapshot
    /// of the updated conversation, or `None` when either id is unknown.
    pub fn update_message(
        &self,
        conversation_id: &str,
        message_id: &str,
        patch: MessagePatch,
    ) -> Option<Conversation> {
        let mut state = self.lock();
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)?;
        let message = conversation
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)?;

        if let Some(content) = patch.content {
            message.content = content;
        }
        if let Some(status) = patch.status {
            message.status = status;
        }
        if let Some(created_at) = patch.created_at {
            message.created_at = created_at;
        }
        if let Some(reasoning) = patch.reasoning {
            message.reasoning = reasoning;
        }

        let trimmed = message.content.trim();
        conversation.preview = if trimmed.is_empty() {
            config::THINKING_PREVIEW.to_string()
        } else {
            trimmed.to_string()
        };
        conversation.last_activity_at = message.created_at;

        sort_by_activity(&mut state.conversations);

        state
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
    }

    /// Flip a conversation's pinned flag. Returns `false` when the id is
    /// unknown.
    pub fn toggle_pin(&self, conversation_id: &str) -> bool {
        let mut state = self.lock();
        match state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            Some(conversation) => {
                conversation.pinned = !conversation.pinned;
                true
            }
            None => false,
        }
    }

    pub fn update_search_term(&self, term: &str) {
        self.lock().search_term = term.to_string();
    }

    pub fn clear_search(&self) {
        self.lock().search_term.clear();
    }

    /// Track which message, if any, is currently receiving streamed
    /// chunks. This is a value, not a gate: nothing else enforces it.
    pub fn set_streaming_message(&self, message_id: Option<String>) {
        self.lock().streaming_message_id = message_id;
    }

    // --- Read selectors ---

    /// Snapshot of the conversation list, filtered by the ambient search
    /// term: case-insensitive substring match over title and preview.
    pub fn conversations(&self) -> Vec<Conversation> {
        let state = self.lock();
        let term = state.search_term.trim().to_lowercase();
        if term.is_empty() {
            return state.conversations.clone();
        }
        state
            .conversations
            .iter()
            .filter(|c| {
                c.title.to_lowercase().contains(&term)
                    || c.preview.to_lowercase().contains(&term)
            })
            .cloned()
            .collect()
    }

    /// Unfiltered snapshot of the conversation list.
    pub fn all_conversations(&self) -> Vec<Conversation> {
        self.lock().conversations.clone()
    }

    pub fn active_conversation(&self) -> Option<Conversation> {
        let state = self.lock();
        let selected = state.selected_id.as_deref()?;
        state
            .conversations
            .iter()
            .find(|c| c.id == selected)
            .cloned()
    }

    pub fn selected_id(&self) -> Option<String> {
        self.lock().selected_id.clone()
    }

    pub fn search_term(&self) -> String {
        self.lock().search_term.clone()
    }

    pub fn streaming_message_id(&self) -> Option<String> {
        self.lock().streaming_message_id.clone()
    }
}

/// Most recent activity first. The sort is stable, so conversations with
/// identical timestamps keep their current relative order.
fn sort_by_activity(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::Role;

    fn message_at(role: Role, content: &str, created_at: DateTime<Utc>) -> Message {
        let mut message = Message::new(role, content);
        message.created_at = created_at;
        message
    }

    fn assert_sorted(store: &ChatStore) {
        let conversations = store.all_conversations();
        for pair in conversations.windows(2) {
            assert!(
                pair[0].last_activity_at >= pair[1].last_activity_at,
                "conversation list out of order"
            );
        }
    }

    #[test]
    fn test_new_conversation_goes_first_and_becomes_active() {
        let store = ChatStore::new();
        store.start_new_conversation();
        let created = store.start_new_conversation();

        let conversations = store.all_conversations();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].id, created.id);
        assert_eq!(store.selected_id().as_deref(), Some(created.id.as_str()));
        assert_eq!(created.title, config::DEFAULT_CONVERSATION_TITLE);
        assert!(created.messages.is_empty());
    }

    #[test]
    fn test_append_keeps_list_sorted_by_activity() {
        let store = ChatStore::new();
        let a = store.start_new_conversation();
        let b = store.start_new_conversation();
        let c = store.start_new_conversation();
        let base = Utc::now();

        store.append_message(&a.id, message_at(Role::User, "first", base));
        assert_sorted(&store);
        assert_eq!(store.all_conversations()[0].id, a.id);

        store.append_message(&c.id, message_at(Role::User, "second", base + Duration::seconds(5)));
        assert_sorted(&store);
        assert_eq!(store.all_conversations()[0].id, c.id);

        store.append_message(&b.id, message_at(Role::User, "third", base + Duration::seconds(10)));
        assert_sorted(&store);
        assert_eq!(store.all_conversations()[0].id, b.id);
    }

    #[test]
    fn test_append_updates_preview_only_for_nonempty_content() {
        let store = ChatStore::new();
        let conversation = store.start_new_conversation();

        let updated = store
            .append_message(&conversation.id, Message::user("hello there"))
            .unwrap();
        assert_eq!(updated.preview, "hello there");

        let updated = store
            .append_message(&conversation.id, Message::assistant(""))
            .unwrap();
        assert_eq!(updated.preview, "hello there");
    }

    #[test]
    fn test_append_selects_conversation_and_stamps_activity() {
        let store = ChatStore::new();
        let a = store.start_new_conversation();
        let b = store.start_new_conversation();
        assert_eq!(store.selected_id().as_deref(), Some(b.id.as_str()));

        let message = Message::user("back to the first one");
        let stamp = message.created_at;
        let updated = store.append_message(&a.id, message).unwrap();

        assert_eq!(store.selected_id().as_deref(), Some(a.id.as_str()));
        assert_eq!(updated.last_activity_at, stamp);
    }

    #[test]
    fn test_append_to_unknown_conversation_is_a_noop() {
        let store = ChatStore::new();
        store.start_new_conversation();

        assert!(store.append_message("nope", Message::user("lost")).is_none());
        assert_eq!(store.all_conversations()[0].messages.len(), 0);
    }

    #[test]
    fn test_update_message_merges_patch_fields() {
        let store = ChatStore::new();
        let conversation = store.start_new_conversation();
        let message = Message::assistant_thinking(vec!["note".to_string()]);
        let message_id = message.id.clone();
        store.append_message(&conversation.id, message);

        let stamp = Utc::now() + Duration::seconds(3);
        let updated = store
            .update_message(
                &conversation.id,
                &message_id,
                MessagePatch {
                    content: Some("partial reply".to_string()),
                    status: None,
                    created_at: Some(stamp),
                    reasoning: None,
                },
            )
            .unwrap();

        let target = updated.messages.iter().find(|m| m.id == message_id).unwrap();
        assert_eq!(target.content, "partial reply");
        assert_eq!(target.status, MessageStatus::Thinking);
        assert_eq!(target.created_at, stamp);
        assert_eq!(target.reasoning, vec!["note".to_string()]);
        assert_eq!(updated.preview, "partial reply");
        assert_eq!(updated.last_activity_at, stamp);
    }

    #[test]
    fn test_update_message_with_empty_content_shows_thinking_preview() {
        let store = ChatStore::new();
        let conversation = store.start_new_conversation();
        let message = Message::user("something visible");
        let message_id = message.id.clone();
        store.append_message(&conversation.id, message);

        let updated = store
            .update_message(
                &conversation.id,
                &message_id,
                MessagePatch {
                    content: Some(String::new()),
                    ..MessagePatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.preview, config::THINKING_PREVIEW);
    }

    #[test]
    fn test_update_message_trims_preview() {
        let store = ChatStore::new();
        let conversation = store.start_new_conversation();
        let message = Message::user("x");
        let message_id = message.id.clone();
        store.append_message(&conversation.id, message);

        let updated = store
            .update_message(
                &conversation.id,
                &message_id,
                MessagePatch {
                    content: Some("  padded reply  ".to_string()),
                    ..MessagePatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.preview, "padded reply");
        let target = updated.messages.iter().find(|m| m.id == message_id).unwrap();
        assert_eq!(target.content, "  padded reply  ");
    }

    #[test]
    fn test_update_unknown_message_is_a_noop() {
        let store = ChatStore::new();
        let conversation = store.start_new_conversation();

        assert!(store
            .update_message(&conversation.id, "missing", MessagePatch::default())
            .is_none());
        assert!(store
            .update_message("missing", "missing", MessagePatch::default())
            .is_none());
    }

    #[test]
    fn test_equal_timestamps_keep_relative_order() {
        let store = ChatStore::new();
        let a = store.start_new_conversation();
        let b = store.start_new_conversation();
        let c = store.start_new_conversation();
        let stamp = Utc::now();

        // Touch every conversation with the same timestamp, twice, in
        // different orders. Ties must not shuffle.
        for id in [&c.id, &b.id, &a.id] {
            store.append_message(id, message_at(Role::User, "same instant", stamp));
        }
        let first_pass: Vec<String> =
            store.all_conversations().iter().map(|c| c.id.clone()).collect();

        for id in [&a.id, &b.id, &c.id] {
            store.append_message(id, message_at(Role::User, "again", stamp));
        }
        let second_pass: Vec<String> =
            store.all_conversations().iter().map(|c| c.id.clone()).collect();

        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn test_toggle_pin_is_idempotent_under_double_application() {
        let store = ChatStore::new();
        let conversation = store.start_new_conversation();
        assert!(!store.all_conversations()[0].pinned);

        assert!(store.toggle_pin(&conversation.id));
        assert!(store.all_conversations()[0].pinned);

        assert!(store.toggle_pin(&conversation.id));
        assert!(!store.all_conversations()[0].pinned);

        assert!(!store.toggle_pin("missing"));
    }

    #[test]
    fn test_rename_replaces_title_unconditionally() {
        let store = ChatStore::new();
        let conversation = store.start_new_conversation();

        assert!(store.update_conversation_title(&conversation.id, "Weekly planning"));
        assert_eq!(store.all_conversations()[0].title, "Weekly planning");

        assert!(!store.update_conversation_title("missing", "whatever"));
    }

    #[test]
    fn test_selecting_unknown_id_yields_no_active_conversation() {
        let store = ChatStore::new();
        store.start_new_conversation();

        store.select_conversation("not-a-conversation");
        assert!(store.active_conversation().is_none());
    }

    #[test]
    fn test_search_filters_on_title_and_preview() {
        let store = ChatStore::with_conversations(crate::services::seed::sample_conversations());

        store.update_search_term("meal");
        let hits = store.conversations();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Weekend meal planner");

        store.update_search_term("MEAL");
        assert_eq!(store.conversations().len(), 1);

        // Preview text matches too.
        store.update_search_term("hydration");
        let hits = store.conversations();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "React performance review");

        store.clear_search();
        assert_eq!(store.conversations().len(), 3);
    }

    #[test]
    fn test_streaming_marker_round_trip() {
        let store = ChatStore::new();
        assert!(store.streaming_message_id().is_none());

        store.set_streaming_message(Some("m-1".to_string()));
        assert_eq!(store.streaming_message_id().as_deref(), Some("m-1"));

        store.set_streaming_message(None);
        assert!(store.streaming_message_id().is_none());
    }
}
