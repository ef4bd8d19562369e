pub const APP_NAME: &str = "Banter";

/// Title given to a conversation before the user renames it.
pub const DEFAULT_CONVERSATION_TITLE: &str = "Untitled conversation";

/// Sidebar preview shown while a conversation has no messages yet.
pub const EMPTY_CONVERSATION_PREVIEW: &str = "Say something to start the conversation…";

/// Sidebar preview shown while an assistant reply has no visible text yet.
pub const THINKING_PREVIEW: &str = "Thinking…";
